//! Compression handler trait definition

use crate::tiff::errors::TiffResult;

/// Per-tile parameters handed to a codec
///
/// Everything a codec may need to know about the tile it is asked to
/// transform. Codecs ignore the fields that do not apply to them.
#[derive(Debug, Clone)]
pub struct CodecOptions {
    /// Tile width in pixels
    pub width: u32,
    /// Tile height in pixels
    pub height: u32,
    /// Channels stored in this tile (1 for planar-separated tiles)
    pub channels: u32,
    /// Bits per sample
    pub bits_per_sample: u32,
    /// Whether samples are interleaved per pixel
    pub interleaved: bool,
    /// Whether multi-byte samples are little-endian
    pub little_endian: bool,
    /// Whether samples are signed integers
    pub signed: bool,
    /// Upper bound on the decoded size in bytes
    pub max_bytes: usize,
    /// Whether the stored samples are YCbCr
    pub ycbcr: bool,
    /// JPEG only: store RGB samples without colorspace conversion
    pub photometric_rgb: bool,
    /// JPEG only: quality in [1, 100]
    pub quality: u8,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            width: 0,
            height: 0,
            channels: 1,
            bits_per_sample: 8,
            interleaved: true,
            little_endian: true,
            signed: false,
            max_bytes: 0,
            ycbcr: false,
            photometric_rgb: false,
            quality: 90,
        }
    }
}

/// Strategy trait for handling different compression methods
pub trait CompressionHandler: Send + Sync {
    /// Decompress the data
    fn decompress(&self, data: &[u8], options: &CodecOptions) -> TiffResult<Vec<u8>>;

    /// Compress the data
    fn compress(&self, data: &[u8], options: &CodecOptions) -> TiffResult<Vec<u8>>;

    /// Get the name of this compression method
    fn name(&self) -> &'static str;

    /// Get the compression code
    fn code(&self) -> u64;
}
