//! TIFF format utilities
//!
//! Utilities for working with TIFF format specifics like byte order
//! detection and TIFF/BigTIFF format detection.

use log::debug;

use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::stream::SeekableStream;
use crate::tiff::constants::header;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::validation;

/// Detects and returns the byte order handler for a TIFF file
pub fn detect_byte_order(stream: &mut dyn SeekableStream) -> TiffResult<Box<dyn ByteOrderHandler>> {
    let byte_order = ByteOrder::detect(stream)?;
    debug!("Detected byte order: {}", byte_order.name());
    Ok(byte_order.create_handler())
}

/// Detects whether a file is TIFF or BigTIFF based on its version number
///
/// Assumes the stream is positioned just past the byte order marker.
/// Returns a tuple with (is_big_tiff, version_number).
pub fn detect_tiff_format(
    stream: &mut dyn SeekableStream,
    handler: &dyn ByteOrderHandler,
) -> TiffResult<(bool, u16)> {
    let version = handler.read_u16(stream)?;
    debug!("TIFF version: {}", version);

    let is_big_tiff = match version {
        header::BIG_TIFF_VERSION => {
            debug!("Detected BigTIFF format");
            validation::validate_bigtiff_header(stream, handler)?;
            true
        }
        header::TIFF_VERSION => {
            debug!("Detected standard TIFF format");
            false
        }
        _ => return Err(TiffError::UnsupportedVersion(version)),
    };

    Ok((is_big_tiff, version))
}

/// Reads the first-IFD offset following the header
///
/// Assumes the stream is positioned right after the format fields
/// (position 4 for classic TIFF, 8 for BigTIFF).
pub fn read_first_ifd_offset(
    stream: &mut dyn SeekableStream,
    is_big_tiff: bool,
    handler: &dyn ByteOrderHandler,
) -> TiffResult<u64> {
    let offset = if is_big_tiff {
        handler.read_u64(stream)?
    } else {
        handler.read_u32(stream)? as u64
    };
    debug!("First IFD offset: {}", offset);
    Ok(offset)
}
