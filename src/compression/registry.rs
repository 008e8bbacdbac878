//! Registry of compression handlers
//!
//! The registry maps `Compression` codes to handlers. The default set
//! covers the built-in codecs; callers may register their own handlers
//! for custom compression codes or to override the defaults.

use std::collections::HashMap;

use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::types::Compression;

use super::deflate::AdobeDeflateHandler;
use super::handler::CompressionHandler;
use super::jpeg::JpegHandler;
use super::lzw::LzwHandler;
use super::packbits::PackBitsHandler;
use super::uncompressed::UncompressedHandler;
use super::zstd::ZstdHandler;

/// A registry of compression handlers keyed by compression scheme
pub struct CodecRegistry {
    handlers: HashMap<Compression, Box<dyn CompressionHandler>>,
}

impl CodecRegistry {
    /// Creates an empty registry with no handlers registered
    pub fn empty() -> Self {
        CodecRegistry {
            handlers: HashMap::new(),
        }
    }

    /// Registers (or replaces) the handler for a compression scheme
    pub fn register(&mut self, compression: Compression, handler: Box<dyn CompressionHandler>) {
        self.handlers.insert(compression, handler);
    }

    /// Looks up the handler for a compression scheme
    pub fn get(&self, compression: Compression) -> Option<&dyn CompressionHandler> {
        self.handlers.get(&compression).map(|h| h.as_ref())
    }

    /// Looks up the handler for a compression scheme, failing with
    /// `UnsupportedCompression` when none is registered
    pub fn require(&self, compression: Compression) -> TiffResult<&dyn CompressionHandler> {
        self.get(compression)
            .ok_or_else(|| TiffError::UnsupportedCompression(compression.code() as u64))
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        let mut registry = CodecRegistry::empty();
        registry.register(Compression::None, Box::new(UncompressedHandler));
        registry.register(Compression::Deflate, Box::new(AdobeDeflateHandler));
        registry.register(Compression::Lzw, Box::new(LzwHandler));
        registry.register(Compression::PackBits, Box::new(PackBitsHandler));
        registry.register(Compression::Jpeg, Box::new(JpegHandler));
        registry.register(Compression::Zstd, Box::new(ZstdHandler::new()));
        registry
    }
}
