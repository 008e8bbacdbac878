//! Handler for JPEG compressed data
//!
//! Decoding accepts a complete JPEG stream; when an IFD carries shared
//! JPEGTables the reader splices them into the tile bytes before they
//! arrive here. Encoding produces standard JFIF output, so only 8-bit
//! unsigned samples in 1 or 3 channels are accepted, and a request to
//! store unconverted RGB is rejected rather than mislabelled.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::tiff::errors::{TiffError, TiffResult};

use super::handler::{CodecOptions, CompressionHandler};

/// JPEG compression handler (compression code 7)
pub struct JpegHandler;

impl JpegHandler {
    fn codec_error(&self, detail: String) -> TiffError {
        TiffError::CodecError {
            compression: self.code(),
            tile: None,
            detail,
        }
    }
}

impl CompressionHandler for JpegHandler {
    fn decompress(&self, data: &[u8], options: &CodecOptions) -> TiffResult<Vec<u8>> {
        let mut decoder = jpeg::Decoder::new(Cursor::new(data));

        // Pick the colorspace handling the IFD asks for: stored RGB stays
        // as-is, YCbCr converts to RGB, grayscale passes through raw.
        if options.photometric_rgb {
            decoder.set_color_transform(jpeg::ColorTransform::RGB);
        } else if options.ycbcr {
            decoder.set_color_transform(jpeg::ColorTransform::YCbCr);
        } else {
            decoder.set_color_transform(jpeg::ColorTransform::None);
        }

        decoder
            .decode()
            .map_err(|e| self.codec_error(format!("JPEG decode failed: {}", e)))
    }

    fn compress(&self, data: &[u8], options: &CodecOptions) -> TiffResult<Vec<u8>> {
        if options.bits_per_sample != 8 || options.signed {
            return Err(TiffError::UnsupportedBitDepth(options.bits_per_sample));
        }
        if options.photometric_rgb {
            return Err(self.codec_error(
                "JPEG encoding without YCbCr conversion is not supported".to_string(),
            ));
        }
        let color_type = match options.channels {
            1 => ExtendedColorType::L8,
            3 => ExtendedColorType::Rgb8,
            other => {
                return Err(self.codec_error(format!(
                    "JPEG encoding supports 1 or 3 channels, not {}",
                    other
                )))
            }
        };

        let mut compressed = Vec::new();
        let mut encoder =
            JpegEncoder::new_with_quality(&mut compressed, options.quality.clamp(1, 100));
        encoder
            .encode(data, options.width, options.height, color_type)
            .map_err(|e| self.codec_error(format!("JPEG encode failed: {}", e)))?;
        Ok(compressed)
    }

    fn name(&self) -> &'static str {
        "JPEG"
    }

    fn code(&self) -> u64 {
        7
    }
}
