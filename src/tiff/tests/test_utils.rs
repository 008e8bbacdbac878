//! Shared helpers for building in-memory TIFF fixtures

extern crate std;

use std::vec::Vec;

/// Starts a classic little-endian TIFF buffer with the given first-IFD
/// offset
pub fn classic_header(first_ifd_offset: u32) -> Vec<u8> {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(&[0x49, 0x49]); // "II" for little-endian
    buffer.extend_from_slice(&[42, 0]); // TIFF magic number
    buffer.extend_from_slice(&first_ifd_offset.to_le_bytes());
    buffer
}

/// Appends one classic IFD entry (12 bytes, little-endian)
pub fn push_entry(buffer: &mut Vec<u8>, tag: u16, field_type: u16, count: u32, value: u32) {
    buffer.extend_from_slice(&tag.to_le_bytes());
    buffer.extend_from_slice(&field_type.to_le_bytes());
    buffer.extend_from_slice(&count.to_le_bytes());
    buffer.extend_from_slice(&value.to_le_bytes());
}

/// Appends the 16-bit entry count that opens a classic IFD
pub fn push_entry_count(buffer: &mut Vec<u8>, count: u16) {
    buffer.extend_from_slice(&count.to_le_bytes());
}

/// Appends the 32-bit next-IFD trailer that closes a classic IFD
pub fn push_next_ifd(buffer: &mut Vec<u8>, offset: u32) {
    buffer.extend_from_slice(&offset.to_le_bytes());
}
