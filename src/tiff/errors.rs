//! Custom error types for TIFF processing

use std::fmt;
use std::io;

/// TIFF-specific error types
#[derive(Debug)]
pub enum TiffError {
    /// I/O error
    IoError(io::Error),
    /// The stream does not look like a TIFF file at all
    NotTiff,
    /// Invalid byte order marker
    InvalidByteOrder(u16),
    /// Invalid BigTIFF header
    InvalidBigTiffHeader(String),
    /// Unsupported TIFF version
    UnsupportedVersion(u16),
    /// Malformed file structure with a description of the problem
    FormatError(String),
    /// Tag not found
    TagNotFound(u16),
    /// Unsupported field type
    UnsupportedFieldType(u16),
    /// Unsupported compression method
    UnsupportedCompression(u64),
    /// Bit depth outside the supported set
    UnsupportedBitDepth(u32),
    /// BitsPerSample values differ between channels
    UnequalBitsPerSample(Vec<u32>),
    /// Image dimensions not found
    MissingDimensions,
    /// Requested region falls outside the image
    RegionOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },
    /// Tile index outside the tile grid
    TileIndexOutOfBounds {
        plane: u32,
        col: u32,
        row: u32,
        planes: u32,
        cols: u32,
        rows: u32,
    },
    /// A size product overflowed the 31-bit limit
    SizeOverflow(u64),
    /// Caller-supplied buffer cannot hold the requested data
    BufferTooSmall { required: usize, actual: usize },
    /// Attempted to mutate an IFD frozen for writing
    FrozenIfd,
    /// An IFD write offset was not even
    OddOffset(u64),
    /// Compression or decompression failure, with tile context when known
    CodecError {
        compression: u64,
        tile: Option<(u32, u32, u32)>,
        detail: String,
    },
    /// Generic error with message
    GenericError(String),
}

impl fmt::Display for TiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TiffError::IoError(e) => write!(f, "I/O error: {}", e),
            TiffError::NotTiff => write!(f, "Not a TIFF file"),
            TiffError::InvalidByteOrder(v) => write!(f, "Invalid byte order marker: {:#06x}", v),
            TiffError::InvalidBigTiffHeader(msg) => write!(f, "Invalid BigTIFF header: {}", msg),
            TiffError::UnsupportedVersion(v) => write!(f, "Unsupported TIFF version: {}", v),
            TiffError::FormatError(msg) => write!(f, "Malformed TIFF: {}", msg),
            TiffError::TagNotFound(tag) => write!(f, "Tag not found: {}", tag),
            TiffError::UnsupportedFieldType(ft) => write!(f, "Unsupported field type: {}", ft),
            TiffError::UnsupportedCompression(c) => {
                write!(f, "Unsupported compression method: {}", c)
            }
            TiffError::UnsupportedBitDepth(bits) => {
                write!(f, "Unsupported bit depth: {} (must be 8, 16, 32 or 64)", bits)
            }
            TiffError::UnequalBitsPerSample(bits) => {
                write!(f, "BitsPerSample values differ between channels: {:?}", bits)
            }
            TiffError::MissingDimensions => write!(f, "Image dimensions not found"),
            TiffError::RegionOutOfBounds {
                x,
                y,
                width,
                height,
                image_width,
                image_height,
            } => write!(
                f,
                "Region {}x{} at ({}, {}) outside image {}x{}",
                width, height, x, y, image_width, image_height
            ),
            TiffError::TileIndexOutOfBounds {
                plane,
                col,
                row,
                planes,
                cols,
                rows,
            } => write!(
                f,
                "Tile index (plane {}, col {}, row {}) outside grid {}x{}x{}",
                plane, col, row, planes, cols, rows
            ),
            TiffError::SizeOverflow(v) => {
                write!(f, "Size product {} exceeds the 31-bit limit", v)
            }
            TiffError::BufferTooSmall { required, actual } => {
                write!(f, "Buffer too small: need {} bytes, have {}", required, actual)
            }
            TiffError::FrozenIfd => write!(f, "IFD is frozen for writing and cannot be modified"),
            TiffError::OddOffset(offset) => {
                write!(f, "IFD offset {} is odd; IFDs must sit at even offsets", offset)
            }
            TiffError::CodecError {
                compression,
                tile,
                detail,
            } => match tile {
                Some((plane, col, row)) => write!(
                    f,
                    "Codec failure (compression {}) at tile (plane {}, col {}, row {}): {}",
                    compression, plane, col, row, detail
                ),
                None => write!(f, "Codec failure (compression {}): {}", compression, detail),
            },
            TiffError::GenericError(msg) => write!(f, "TIFF error: {}", msg),
        }
    }
}

impl std::error::Error for TiffError {}

impl From<io::Error> for TiffError {
    fn from(error: io::Error) -> Self {
        TiffError::IoError(error)
    }
}

impl From<String> for TiffError {
    fn from(msg: String) -> Self {
        TiffError::GenericError(msg)
    }
}

/// Result type for TIFF operations
pub type TiffResult<T> = Result<T, TiffError>;
