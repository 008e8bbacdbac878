//! Predictor differencing and un-differencing
//!
//! Horizontal differencing replaces each sample with its difference to
//! the sample one pixel to the left (same channel); the floating-point
//! predictor first splits each value's big-endian bytes into per-byte
//! planes within the row and then byte-differences those. Buffers stay
//! in file endianness throughout; the sample width and endianness are
//! explicit parameters.

use crate::tiff::errors::{TiffError, TiffResult};

fn read_sample(buf: &[u8], at: usize, bytes: usize, little_endian: bool) -> u64 {
    let slice = &buf[at..at + bytes];
    let mut value: u64 = 0;
    if little_endian {
        for (i, &b) in slice.iter().enumerate() {
            value |= (b as u64) << (8 * i);
        }
    } else {
        for &b in slice {
            value = (value << 8) | b as u64;
        }
    }
    value
}

fn write_sample(buf: &mut [u8], at: usize, bytes: usize, little_endian: bool, value: u64) {
    if little_endian {
        for i in 0..bytes {
            buf[at + i] = (value >> (8 * i)) as u8;
        }
    } else {
        for i in 0..bytes {
            buf[at + i] = (value >> (8 * (bytes - 1 - i))) as u8;
        }
    }
}

fn check_sample_width(bytes_per_sample: u32) -> TiffResult<usize> {
    match bytes_per_sample {
        1 | 2 | 4 | 8 => Ok(bytes_per_sample as usize),
        other => Err(TiffError::UnsupportedBitDepth(other * 8)),
    }
}

/// Undoes horizontal differencing in place (the read path)
///
/// `width` is the pixels per row of the decoded buffer, `samples` the
/// channels interleaved in it.
pub fn unpredict_horizontal(
    data: &mut [u8],
    width: u32,
    samples: u32,
    bytes_per_sample: u32,
    little_endian: bool,
) -> TiffResult<()> {
    let bytes = check_sample_width(bytes_per_sample)?;
    let samples = samples as usize;
    let row_stride = width as usize * samples * bytes;
    if row_stride == 0 {
        return Ok(());
    }
    let mask = if bytes == 8 { u64::MAX } else { (1u64 << (bytes * 8)) - 1 };
    for row in data.chunks_mut(row_stride) {
        let mut at = samples * bytes;
        while at + bytes <= row.len() {
            let value = read_sample(row, at, bytes, little_endian);
            let previous = read_sample(row, at - samples * bytes, bytes, little_endian);
            write_sample(row, at, bytes, little_endian, value.wrapping_add(previous) & mask);
            at += bytes;
        }
    }
    Ok(())
}

/// Applies horizontal differencing in place (the write path)
pub fn predict_horizontal(
    data: &mut [u8],
    width: u32,
    samples: u32,
    bytes_per_sample: u32,
    little_endian: bool,
) -> TiffResult<()> {
    let bytes = check_sample_width(bytes_per_sample)?;
    let samples = samples as usize;
    let row_stride = width as usize * samples * bytes;
    if row_stride == 0 {
        return Ok(());
    }
    let mask = if bytes == 8 { u64::MAX } else { (1u64 << (bytes * 8)) - 1 };
    for row in data.chunks_mut(row_stride) {
        // Difference right to left so earlier samples stay original
        let sample_count = row.len() / bytes;
        let mut position = sample_count;
        while position > samples {
            position -= 1;
            let at = position * bytes;
            let value = read_sample(row, at, bytes, little_endian);
            let previous = read_sample(row, at - samples * bytes, bytes, little_endian);
            write_sample(row, at, bytes, little_endian, value.wrapping_sub(previous) & mask);
        }
    }
    Ok(())
}

fn check_float_width(bytes_per_sample: u32) -> TiffResult<usize> {
    match bytes_per_sample {
        4 | 8 => Ok(bytes_per_sample as usize),
        other => Err(TiffError::UnsupportedBitDepth(other * 8)),
    }
}

/// Undoes the floating-point predictor in place (the read path)
///
/// Per row: byte-undifference with a stride of `samples`, then gather
/// each value's bytes from the per-byte planes, interpreting them as
/// big-endian and re-emitting them in the file's endianness.
pub fn unpredict_float(
    data: &mut [u8],
    width: u32,
    samples: u32,
    bytes_per_sample: u32,
    little_endian: bool,
) -> TiffResult<()> {
    let bytes = check_float_width(bytes_per_sample)?;
    let samples = samples as usize;
    let row_stride = width as usize * samples * bytes;
    if row_stride == 0 {
        return Ok(());
    }
    let mut assembled = vec![0u8; row_stride];
    for row in data.chunks_mut(row_stride) {
        if row.len() < row_stride {
            break;
        }
        for i in samples..row.len() {
            row[i] = row[i].wrapping_add(row[i - samples]);
        }
        let values = row.len() / bytes;
        for value in 0..values {
            for plane in 0..bytes {
                let byte = row[plane * values + value];
                let at = value * bytes;
                if little_endian {
                    assembled[at + (bytes - 1 - plane)] = byte;
                } else {
                    assembled[at + plane] = byte;
                }
            }
        }
        row.copy_from_slice(&assembled);
    }
    Ok(())
}

/// Applies the floating-point predictor in place (the write path)
pub fn predict_float(
    data: &mut [u8],
    width: u32,
    samples: u32,
    bytes_per_sample: u32,
    little_endian: bool,
) -> TiffResult<()> {
    let bytes = check_float_width(bytes_per_sample)?;
    let samples = samples as usize;
    let row_stride = width as usize * samples * bytes;
    if row_stride == 0 {
        return Ok(());
    }
    let mut shuffled = vec![0u8; row_stride];
    for row in data.chunks_mut(row_stride) {
        if row.len() < row_stride {
            break;
        }
        let values = row.len() / bytes;
        for value in 0..values {
            for plane in 0..bytes {
                let at = value * bytes;
                let byte = if little_endian {
                    row[at + (bytes - 1 - plane)]
                } else {
                    row[at + plane]
                };
                shuffled[plane * values + value] = byte;
            }
        }
        for i in (samples..shuffled.len()).rev() {
            shuffled[i] = shuffled[i].wrapping_sub(shuffled[i - samples]);
        }
        row.copy_from_slice(&shuffled);
    }
    Ok(())
}
