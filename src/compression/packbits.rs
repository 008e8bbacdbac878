//! Handler for PackBits compressed data
//!
//! PackBits is the byte-oriented run-length scheme from the TIFF 6.0
//! specification: a control byte n in [0, 127] copies n+1 literal bytes,
//! n in [-127, -1] repeats the next byte 1-n times, and -128 is a no-op.

use crate::tiff::errors::{TiffError, TiffResult};

use super::handler::{CodecOptions, CompressionHandler};

/// PackBits run-length compression handler (compression code 32773)
pub struct PackBitsHandler;

impl PackBitsHandler {
    fn codec_error(&self, detail: &str) -> TiffError {
        TiffError::CodecError {
            compression: self.code(),
            tile: None,
            detail: detail.to_string(),
        }
    }
}

impl CompressionHandler for PackBitsHandler {
    fn decompress(&self, data: &[u8], options: &CodecOptions) -> TiffResult<Vec<u8>> {
        let mut output = Vec::with_capacity(options.max_bytes.max(data.len()));
        let mut position = 0usize;
        while position < data.len() {
            let control = data[position] as i8;
            position += 1;
            if control == -128 {
                continue;
            }
            if control >= 0 {
                let run = control as usize + 1;
                if position + run > data.len() {
                    return Err(self.codec_error("literal run exceeds input"));
                }
                output.extend_from_slice(&data[position..position + run]);
                position += run;
            } else {
                let run = 1 - control as isize;
                let value = *data
                    .get(position)
                    .ok_or_else(|| self.codec_error("repeat run missing its byte"))?;
                position += 1;
                output.extend(std::iter::repeat(value).take(run as usize));
            }
        }
        Ok(output)
    }

    fn compress(&self, data: &[u8], _options: &CodecOptions) -> TiffResult<Vec<u8>> {
        let mut output = Vec::with_capacity(data.len() + data.len() / 128 + 1);
        let mut position = 0usize;
        while position < data.len() {
            // Measure the run of identical bytes starting here
            let value = data[position];
            let mut run = 1usize;
            while run < 128 && position + run < data.len() && data[position + run] == value {
                run += 1;
            }
            if run >= 2 {
                output.push((1i8.wrapping_sub(run as i8)) as u8);
                output.push(value);
                position += run;
                continue;
            }
            // Gather literals until the next run of 3+ identical bytes
            let start = position;
            position += 1;
            while position < data.len() && position - start < 128 {
                let ahead = data[position];
                let mut repeat = 1usize;
                while repeat < 3 && position + repeat < data.len() && data[position + repeat] == ahead
                {
                    repeat += 1;
                }
                if repeat >= 3 {
                    break;
                }
                position += 1;
            }
            let literals = position - start;
            output.push((literals - 1) as u8);
            output.extend_from_slice(&data[start..position]);
        }
        Ok(output)
    }

    fn name(&self) -> &'static str {
        "PackBits"
    }

    fn code(&self) -> u64 {
        32773
    }
}
