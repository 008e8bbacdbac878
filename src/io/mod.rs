//! I/O primitives for TIFF processing
//!
//! Random-access stream abstraction and byte order handling.

pub mod byte_order;
pub mod stream;

pub use byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use stream::SeekableStream;
