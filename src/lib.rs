pub mod compression;
pub mod io;
pub mod tiff;
pub mod tiles;
pub mod transforms;
pub mod utils;

pub use tiff::{Ifd, TiffError, TiffReader, TiffResult, TiffWriter, WriterOptions};
pub use tiff::{Compression, FillOrder, Photometric, PixelType, PlanarConfig, PredictorKind};
pub use tiles::{TileIndex, TileMap, TiffTile};
pub use compression::{CodecOptions, CodecRegistry, CompressionHandler};
pub use io::{ByteOrder, SeekableStream};
