//! Unpacking of non-byte-aligned sample precisions
//!
//! Samples whose bit depth is not a whole number of bytes are stored as
//! an MSB-first bitstream, with every row starting on a byte boundary.
//! Unpacking widens each sample to the nearest byte multiple so the
//! assembly code can work in whole bytes.

use crate::tiff::errors::{TiffError, TiffResult};

/// Reads one MSB-first bit run from a row
fn read_bits(row: &[u8], bit_offset: usize, bits: usize) -> u64 {
    let mut value: u64 = 0;
    for i in 0..bits {
        let bit = bit_offset + i;
        let byte = row[bit / 8];
        let mask = 0x80 >> (bit % 8);
        value = (value << 1) | ((byte & mask != 0) as u64);
    }
    value
}

/// Unpacks a packed-bit buffer into whole-byte samples
///
/// `width` and `height` describe the pixel grid, `samples` the channels
/// interleaved per pixel. Output samples occupy ⌈bits/8⌉ bytes each, in
/// the requested endianness with values right-aligned.
pub fn unpack_bits(
    packed: &[u8],
    bits: u32,
    width: u32,
    height: u32,
    samples: u32,
    little_endian: bool,
) -> TiffResult<Vec<u8>> {
    if bits == 0 || bits > 32 {
        return Err(TiffError::UnsupportedBitDepth(bits));
    }
    let bits = bits as usize;
    let out_bytes = (bits + 7) / 8;
    let row_samples = width as usize * samples as usize;
    let row_bits = row_samples * bits;
    let packed_row_stride = (row_bits + 7) / 8;
    let expected = packed_row_stride * height as usize;
    if packed.len() < expected {
        return Err(TiffError::FormatError(format!(
            "packed buffer has {} bytes; {}x{} at {} bits needs {}",
            packed.len(),
            width,
            height,
            bits,
            expected
        )));
    }

    let mut output = vec![0u8; row_samples * out_bytes * height as usize];
    let mut out_at = 0usize;
    for row_index in 0..height as usize {
        let row = &packed[row_index * packed_row_stride..(row_index + 1) * packed_row_stride];
        for sample in 0..row_samples {
            let value = read_bits(row, sample * bits, bits);
            if little_endian {
                for i in 0..out_bytes {
                    output[out_at + i] = (value >> (8 * i)) as u8;
                }
            } else {
                for i in 0..out_bytes {
                    output[out_at + i] = (value >> (8 * (out_bytes - 1 - i))) as u8;
                }
            }
            out_at += out_bytes;
        }
    }
    Ok(output)
}
