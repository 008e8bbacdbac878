//! Fill order reversal
//!
//! `FillOrder = 2` stores the bits of every byte in reverse order.
//! Reversal is its own inverse, so the same function serves both the
//! read and the write path.

/// Reverses the bit order of every byte in the buffer
pub fn reverse_fill_order(data: &mut [u8]) {
    for byte in data.iter_mut() {
        *byte = byte.reverse_bits();
    }
}
