//! Seekable stream trait and helpers
//!
//! This module provides a unified trait for byte streams that support
//! reading, writing and seeking, plus position-preserving helpers used
//! by the TIFF reader and writer.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::tiff::errors::TiffResult;

/// Trait for streams that can read, write and seek
///
/// This trait combines the Read, Write and Seek traits for use with
/// the various readers and writers throughout the library. The stream
/// is never shared concurrently; callers serialise access.
pub trait SeekableStream: Read + Write + Seek + Send + Sync {}

// Blanket implementation for any type that implements the required traits
impl<T: Read + Write + Seek + Send + Sync> SeekableStream for T {}

/// Gets the total length of a stream
///
/// Seeks to the end to measure the stream, then restores the
/// original position.
pub fn stream_length(stream: &mut dyn SeekableStream) -> TiffResult<u64> {
    let current_position = stream.seek(SeekFrom::Current(0))?;
    let length = stream.seek(SeekFrom::End(0))?;
    stream.seek(SeekFrom::Start(current_position))?;
    Ok(length)
}

/// Gets the current position of a stream
pub fn current_position(stream: &mut dyn SeekableStream) -> TiffResult<u64> {
    Ok(stream.seek(SeekFrom::Current(0))?)
}
