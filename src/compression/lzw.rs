//! Handler for LZW compressed data
//!
//! TIFF LZW uses MSB-first bit order with the early-code-size switch
//! that the TIFF 6.0 specification mandates.

use crate::tiff::errors::{TiffError, TiffResult};

use super::handler::{CodecOptions, CompressionHandler};

/// LZW compression handler (compression code 5)
pub struct LzwHandler;

impl LzwHandler {
    fn codec_error(&self, detail: String) -> TiffError {
        TiffError::CodecError {
            compression: self.code(),
            tile: None,
            detail,
        }
    }
}

impl CompressionHandler for LzwHandler {
    fn decompress(&self, data: &[u8], _options: &CodecOptions) -> TiffResult<Vec<u8>> {
        let mut decoder = weezl::decode::Decoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8);
        let mut decompressed = Vec::new();
        let result = decoder.into_vec(&mut decompressed).decode_all(data);
        match result.status {
            Ok(_) => Ok(decompressed),
            Err(e) => Err(self.codec_error(format!("LZW decode failed: {}", e))),
        }
    }

    fn compress(&self, data: &[u8], _options: &CodecOptions) -> TiffResult<Vec<u8>> {
        let mut encoder = weezl::encode::Encoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8);
        let mut compressed = Vec::new();
        let result = encoder.into_vec(&mut compressed).encode_all(data);
        match result.status {
            Ok(_) => Ok(compressed),
            Err(e) => Err(self.codec_error(format!("LZW encode failed: {}", e))),
        }
    }

    fn name(&self) -> &'static str {
        "LZW"
    }

    fn code(&self) -> u64 {
        5
    }
}
