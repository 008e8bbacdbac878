//! Tile buffers and their lifecycle
//!
//! A `TiffTile` carries the encoded and/or decoded bytes of one tile,
//! its tile-space dimensions and, after flushing, its stored file
//! position. The lifecycle is monotonic: a tile is created empty, gains
//! decoded data (from a caller or a decode) or encoded data (from a
//! parse or an encode), and ends written with a known offset and length.
//! Buffers may be freed to save memory but never resurrected.

use log::trace;

use crate::tiles::index::TileIndex;

/// One tile of an image: buffers plus placement metadata
#[derive(Debug, Clone)]
pub struct TiffTile {
    /// Logical grid coordinate
    index: TileIndex,
    /// Tile width in pixels
    width: u32,
    /// Effective tile height in pixels
    ///
    /// Smaller than the nominal tile height only for the bottom strip of
    /// a stripped image; genuinely tiled images keep nominal dimensions
    /// at every edge.
    height: u32,
    /// Whether the decoded buffer holds interleaved samples
    interleaved: bool,
    /// Encoded (compressed) bytes
    encoded: Option<Vec<u8>>,
    /// Decoded pixel bytes
    decoded: Option<Vec<u8>>,
    /// File offset after flushing
    stored_offset: Option<u64>,
    /// Stored byte count after flushing
    stored_byte_count: Option<u64>,
}

impl TiffTile {
    /// Creates an empty tile of the given tile-space dimensions
    pub fn new(index: TileIndex, width: u32, height: u32) -> Self {
        TiffTile {
            index,
            width,
            height,
            interleaved: false,
            encoded: None,
            decoded: None,
            stored_offset: None,
            stored_byte_count: None,
        }
    }

    /// The tile's grid coordinate
    pub fn index(&self) -> TileIndex {
        self.index
    }

    /// Tile width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Effective tile height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels in the tile (width × effective height)
    pub fn size_in_pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Truncates the effective height (bottom strip of a stripped image)
    pub fn crop_height(&mut self, height: u32) {
        if height < self.height {
            trace!(
                "Cropping tile {} height {} -> {}",
                self.index,
                self.height,
                height
            );
            self.height = height;
        }
    }

    /// Whether the decoded buffer holds interleaved samples
    pub fn is_interleaved(&self) -> bool {
        self.interleaved
    }

    /// Marks the decoded buffer as interleaved or separated
    pub fn set_interleaved(&mut self, interleaved: bool) {
        self.interleaved = interleaved;
    }

    /// Whether the tile carries no data at all
    pub fn is_empty(&self) -> bool {
        self.encoded.is_none() && self.decoded.is_none()
    }

    /// Encoded bytes, when present
    pub fn encoded(&self) -> Option<&[u8]> {
        self.encoded.as_deref()
    }

    /// Decoded bytes, when present
    pub fn decoded(&self) -> Option<&[u8]> {
        self.decoded.as_deref()
    }

    /// Mutable decoded bytes, when present
    pub fn decoded_mut(&mut self) -> Option<&mut Vec<u8>> {
        self.decoded.as_mut()
    }

    /// Attaches decoded pixel data
    pub fn set_decoded(&mut self, data: Vec<u8>) {
        self.decoded = Some(data);
    }

    /// Attaches encoded (compressed) data
    pub fn set_encoded(&mut self, data: Vec<u8>) {
        self.encoded = Some(data);
    }

    /// Whether an encoded buffer is attached
    pub fn has_encoded(&self) -> bool {
        self.encoded.is_some()
    }

    /// Whether a decoded buffer is attached
    pub fn has_decoded(&self) -> bool {
        self.decoded.is_some()
    }

    /// Ensures a decoded buffer of `size` bytes exists, filling new
    /// buffers with the given byte
    pub fn ensure_decoded(&mut self, size: usize, filler: u8) -> &mut Vec<u8> {
        if self.decoded.is_none() {
            self.decoded = Some(vec![filler; size]);
        }
        self.decoded.as_mut().unwrap()
    }

    /// Frees the decoded buffer (typically after flushing)
    pub fn free_decoded(&mut self) {
        self.decoded = None;
    }

    /// Records the stored file position after flushing
    pub fn mark_written(&mut self, offset: u64, byte_count: u64) {
        trace!(
            "Tile {} written at offset {} ({} bytes)",
            self.index,
            offset,
            byte_count
        );
        self.stored_offset = Some(offset);
        self.stored_byte_count = Some(byte_count);
    }

    /// Stored file offset, once written
    pub fn stored_offset(&self) -> Option<u64> {
        self.stored_offset
    }

    /// Stored byte count, once written
    pub fn stored_byte_count(&self) -> Option<u64> {
        self.stored_byte_count
    }

    /// Whether the tile has been flushed to the stream
    pub fn is_written(&self) -> bool {
        self.stored_offset.is_some()
    }
}
