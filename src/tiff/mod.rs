//! TIFF container format module
//!
//! This module provides structures and functions for reading and
//! writing TIFF and BigTIFF format files: the typed directory model,
//! the byte-exact header and IFD serialisation, and the tile engine's
//! reader and writer.

pub mod constants;
pub mod errors;
pub mod ifd;
pub mod reader;
pub(crate) mod types;
pub(crate) mod validation;
pub mod value;
pub mod writer;

#[cfg(test)]
mod tests;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use errors::{TiffError, TiffResult};
pub use ifd::{Ifd, IfdEntry};
pub use reader::TiffReader;
pub use types::{
    Compression, FieldType, FillOrder, Photometric, PixelType, PlanarConfig, PredictorKind,
    SampleFormat,
};
pub use value::TiffValue;
pub use writer::{TiffWriter, WriterOptions};

// Constants for TIFF format
pub const BIGTIFF_VERSION: u16 = 43;
pub const BIGTIFF_OFFSETSIZE: u16 = 8;
