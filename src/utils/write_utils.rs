//! TIFF writing utilities
//!
//! Helper functions for writing TIFF files, handling alignment and other
//! low-level details. The TIFF specification requires word alignment:
//! every IFD, and every externally stored value, sits at an even offset.

use std::io::{Seek, SeekFrom, Write};

use crate::io::stream::SeekableStream;
use crate::tiff::constants::ifd_layout;
use crate::tiff::errors::TiffResult;

/// Align an offset to a 2-byte boundary
pub fn align_to_even(offset: u64) -> u64 {
    offset + (offset % 2)
}

/// Write a zero pad byte when the stream position is odd
///
/// Returns the (even) position the stream ends up at.
pub fn pad_to_even(stream: &mut dyn SeekableStream) -> TiffResult<u64> {
    let position = stream.seek(SeekFrom::Current(0))?;
    if position % 2 != 0 {
        stream.write_all(&[0u8])?;
        Ok(position + 1)
    } else {
        Ok(position)
    }
}

/// Write zero padding after a data block so the next write is even-aligned
pub fn write_even_padding(sink: &mut dyn Write, data_len: usize) -> TiffResult<()> {
    if data_len % 2 != 0 {
        sink.write_all(&[0u8])?;
    }
    Ok(())
}

/// Bytes per IFD entry for the given format
pub fn entry_size(big_tiff: bool) -> u64 {
    if big_tiff {
        ifd_layout::BIGTIFF_ENTRY_SIZE
    } else {
        ifd_layout::TIFF_ENTRY_SIZE
    }
}

/// Bytes available for inline values for the given format
pub fn inline_size(big_tiff: bool) -> u64 {
    if big_tiff {
        ifd_layout::BIGTIFF_INLINE_SIZE
    } else {
        ifd_layout::TIFF_INLINE_SIZE
    }
}

/// Size in bytes of an IFD table (count field, entries, next-IFD trailer)
pub fn ifd_table_size(entry_count: u64, big_tiff: bool) -> u64 {
    if big_tiff {
        // 8-byte entry count, 20-byte entries, 8-byte next-IFD offset
        8 + ifd_layout::BIGTIFF_ENTRY_SIZE * entry_count + 8
    } else {
        // 2-byte entry count, 12-byte entries, 4-byte next-IFD offset
        2 + ifd_layout::TIFF_ENTRY_SIZE * entry_count + 4
    }
}
