//! Handler for ZSTD compressed data

use log::debug;

use crate::tiff::errors::{TiffError, TiffResult};

use super::handler::{CodecOptions, CompressionHandler};

/// ZSTD compression handler (compression code 14)
pub struct ZstdHandler {
    /// Compression level (1-22, default 3)
    compression_level: i32,
}

impl ZstdHandler {
    /// Create a new ZSTD handler with default compression level
    pub fn new() -> Self {
        ZstdHandler {
            compression_level: 3,
        }
    }

    /// Create a new ZSTD handler with specified compression level
    pub fn with_level(level: i32) -> Self {
        let level = level.clamp(1, 22);
        ZstdHandler {
            compression_level: level,
        }
    }
}

impl Default for ZstdHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionHandler for ZstdHandler {
    fn decompress(&self, data: &[u8], _options: &CodecOptions) -> TiffResult<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        zstd::decode_all(data).map_err(|e| TiffError::CodecError {
            compression: self.code(),
            tile: None,
            detail: format!("ZSTD decompression error: {}", e),
        })
    }

    fn compress(&self, data: &[u8], _options: &CodecOptions) -> TiffResult<Vec<u8>> {
        debug!(
            "ZSTD compressing {} bytes with level {}",
            data.len(),
            self.compression_level
        );
        if data.is_empty() {
            return Ok(Vec::new());
        }
        zstd::encode_all(data, self.compression_level).map_err(|e| TiffError::CodecError {
            compression: self.code(),
            tile: None,
            detail: format!("ZSTD compression error: {}", e),
        })
    }

    fn name(&self) -> &'static str {
        "ZSTD"
    }

    fn code(&self) -> u64 {
        14
    }
}
