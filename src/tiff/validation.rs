//! TIFF validation utilities
//!
//! Validation functions that ensure data integrity and prevent errors
//! when processing potentially malformed files.

use crate::io::byte_order::ByteOrderHandler;
use crate::io::stream::SeekableStream;
use crate::tiff::constants::header;
use crate::tiff::errors::{TiffError, TiffResult};

/// Validates an IFD offset to ensure it's within reasonable bounds
pub fn validate_ifd_offset(offset: u64, file_size: u64) -> TiffResult<()> {
    if offset >= file_size || offset < 8 {
        return Err(TiffError::FormatError(format!(
            "invalid IFD offset: {} (file size: {})",
            offset, file_size
        )));
    }
    Ok(())
}

/// Validates the BigTIFF header fields following the version number
///
/// BigTIFF requires an offset size of 8 and a zero reserved word.
pub fn validate_bigtiff_header(
    stream: &mut dyn SeekableStream,
    handler: &dyn ByteOrderHandler,
) -> TiffResult<()> {
    let offset_size = handler.read_u16(stream)?;
    let reserved = handler.read_u16(stream)?;

    if offset_size != header::BIGTIFF_OFFSET_SIZE || reserved != 0 {
        return Err(TiffError::InvalidBigTiffHeader(format!(
            "offset size {} (expected 8), reserved word {} (expected 0)",
            offset_size, reserved
        )));
    }
    Ok(())
}

/// Validates a numeric range to ensure it's within bounds
pub fn validate_range<T>(value: T, min: T, max: T, name: &str) -> TiffResult<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(TiffError::FormatError(format!(
            "invalid {}: {} (must be between {} and {})",
            name, value, min, max
        )));
    }
    Ok(())
}
