//! Compression handling for TIFF tiles
//!
//! This module implements strategies for handling different compression
//! methods, looked up through a registry keyed by compression code.

mod deflate;
mod handler;
mod jpeg;
mod lzw;
mod packbits;
mod registry;
mod uncompressed;
mod zstd;


pub use deflate::AdobeDeflateHandler;
pub use handler::{CodecOptions, CompressionHandler};
pub use jpeg::JpegHandler;
pub use lzw::LzwHandler;
pub use packbits::PackBitsHandler;
pub use registry::CodecRegistry;
pub use uncompressed::UncompressedHandler;
pub use zstd::ZstdHandler;
