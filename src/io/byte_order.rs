//! Byte order handling for TIFF files
//!
//! This module implements the Strategy pattern for handling different
//! byte orders (little-endian vs big-endian) when reading and writing
//! TIFF data. Endianness is a property of the handler, not of each call.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Result, Write};

use crate::io::stream::SeekableStream;
use crate::tiff::errors::{TiffError, TiffResult};

/// Represents the byte order of a TIFF file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian byte order (II)
    LittleEndian,
    /// Big-endian byte order (MM)
    BigEndian,
}

impl ByteOrder {
    /// Detects the byte order from the TIFF header
    pub fn detect(stream: &mut dyn SeekableStream) -> TiffResult<Self> {
        let byte_order = stream.read_u16::<LittleEndian>()?;
        match byte_order {
            0x4949 => Ok(ByteOrder::LittleEndian), // "II" (Intel)
            0x4D4D => Ok(ByteOrder::BigEndian),    // "MM" (Motorola)
            _ => Err(TiffError::InvalidByteOrder(byte_order)),
        }
    }

    /// Returns a string representation of this byte order
    pub fn name(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "Little Endian (II)",
            ByteOrder::BigEndian => "Big Endian (MM)",
        }
    }

    /// Returns the two-byte header marker for this byte order
    pub fn marker(&self) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => [0x49, 0x49],
            ByteOrder::BigEndian => [0x4D, 0x4D],
        }
    }

    /// Whether this is the little-endian order
    pub fn is_little_endian(&self) -> bool {
        matches!(self, ByteOrder::LittleEndian)
    }

    /// Creates the appropriate handler for this byte order
    pub fn create_handler(&self) -> Box<dyn ByteOrderHandler> {
        match self {
            ByteOrder::LittleEndian => Box::new(LittleEndianHandler),
            ByteOrder::BigEndian => Box::new(BigEndianHandler),
        }
    }
}

/// Trait for byte order handling strategies
///
/// Reads operate on seekable streams; writes accept any `Write` sink so
/// values can be serialised into in-memory buffers before they are
/// positioned in the file.
pub trait ByteOrderHandler: Send + Sync {
    /// The byte order this handler implements
    fn order(&self) -> ByteOrder;

    /// Read a u16 value
    fn read_u16(&self, stream: &mut dyn SeekableStream) -> Result<u16>;

    /// Read a u32 value
    fn read_u32(&self, stream: &mut dyn SeekableStream) -> Result<u32>;

    /// Read a u64 value
    fn read_u64(&self, stream: &mut dyn SeekableStream) -> Result<u64>;

    /// Read an i16 value
    fn read_i16(&self, stream: &mut dyn SeekableStream) -> Result<i16>;

    /// Read an i32 value
    fn read_i32(&self, stream: &mut dyn SeekableStream) -> Result<i32>;

    /// Read an i64 value
    fn read_i64(&self, stream: &mut dyn SeekableStream) -> Result<i64>;

    /// Read an f32 value
    fn read_f32(&self, stream: &mut dyn SeekableStream) -> Result<f32>;

    /// Read an f64 value
    fn read_f64(&self, stream: &mut dyn SeekableStream) -> Result<f64>;

    /// Read a rational value (two u32 values as numerator/denominator)
    fn read_rational(&self, stream: &mut dyn SeekableStream) -> Result<(u32, u32)>;

    /// Read a signed rational value (two i32 values as numerator/denominator)
    fn read_srational(&self, stream: &mut dyn SeekableStream) -> Result<(i32, i32)>;

    /// Write a u16 value
    fn write_u16(&self, sink: &mut dyn Write, value: u16) -> Result<()>;

    /// Write a u32 value
    fn write_u32(&self, sink: &mut dyn Write, value: u32) -> Result<()>;

    /// Write a u64 value
    fn write_u64(&self, sink: &mut dyn Write, value: u64) -> Result<()>;

    /// Write an i16 value
    fn write_i16(&self, sink: &mut dyn Write, value: i16) -> Result<()>;

    /// Write an i32 value
    fn write_i32(&self, sink: &mut dyn Write, value: i32) -> Result<()>;

    /// Write an i64 value
    fn write_i64(&self, sink: &mut dyn Write, value: i64) -> Result<()>;

    /// Write an f32 value
    fn write_f32(&self, sink: &mut dyn Write, value: f32) -> Result<()>;

    /// Write an f64 value
    fn write_f64(&self, sink: &mut dyn Write, value: f64) -> Result<()>;

    /// Write a rational value (numerator, denominator)
    fn write_rational(&self, sink: &mut dyn Write, value: (u32, u32)) -> Result<()>;

    /// Write a signed rational value (numerator, denominator)
    fn write_srational(&self, sink: &mut dyn Write, value: (i32, i32)) -> Result<()>;
}

/// Little-endian byte order handler
pub struct LittleEndianHandler;

impl ByteOrderHandler for LittleEndianHandler {
    fn order(&self) -> ByteOrder {
        ByteOrder::LittleEndian
    }

    fn read_u16(&self, stream: &mut dyn SeekableStream) -> Result<u16> {
        stream.read_u16::<LittleEndian>()
    }

    fn read_u32(&self, stream: &mut dyn SeekableStream) -> Result<u32> {
        stream.read_u32::<LittleEndian>()
    }

    fn read_u64(&self, stream: &mut dyn SeekableStream) -> Result<u64> {
        stream.read_u64::<LittleEndian>()
    }

    fn read_i16(&self, stream: &mut dyn SeekableStream) -> Result<i16> {
        stream.read_i16::<LittleEndian>()
    }

    fn read_i32(&self, stream: &mut dyn SeekableStream) -> Result<i32> {
        stream.read_i32::<LittleEndian>()
    }

    fn read_i64(&self, stream: &mut dyn SeekableStream) -> Result<i64> {
        stream.read_i64::<LittleEndian>()
    }

    fn read_f32(&self, stream: &mut dyn SeekableStream) -> Result<f32> {
        stream.read_f32::<LittleEndian>()
    }

    fn read_f64(&self, stream: &mut dyn SeekableStream) -> Result<f64> {
        stream.read_f64::<LittleEndian>()
    }

    fn read_rational(&self, stream: &mut dyn SeekableStream) -> Result<(u32, u32)> {
        let numerator = stream.read_u32::<LittleEndian>()?;
        let denominator = stream.read_u32::<LittleEndian>()?;
        Ok((numerator, denominator))
    }

    fn read_srational(&self, stream: &mut dyn SeekableStream) -> Result<(i32, i32)> {
        let numerator = stream.read_i32::<LittleEndian>()?;
        let denominator = stream.read_i32::<LittleEndian>()?;
        Ok((numerator, denominator))
    }

    fn write_u16(&self, sink: &mut dyn Write, value: u16) -> Result<()> {
        sink.write_u16::<LittleEndian>(value)
    }

    fn write_u32(&self, sink: &mut dyn Write, value: u32) -> Result<()> {
        sink.write_u32::<LittleEndian>(value)
    }

    fn write_u64(&self, sink: &mut dyn Write, value: u64) -> Result<()> {
        sink.write_u64::<LittleEndian>(value)
    }

    fn write_i16(&self, sink: &mut dyn Write, value: i16) -> Result<()> {
        sink.write_i16::<LittleEndian>(value)
    }

    fn write_i32(&self, sink: &mut dyn Write, value: i32) -> Result<()> {
        sink.write_i32::<LittleEndian>(value)
    }

    fn write_i64(&self, sink: &mut dyn Write, value: i64) -> Result<()> {
        sink.write_i64::<LittleEndian>(value)
    }

    fn write_f32(&self, sink: &mut dyn Write, value: f32) -> Result<()> {
        sink.write_f32::<LittleEndian>(value)
    }

    fn write_f64(&self, sink: &mut dyn Write, value: f64) -> Result<()> {
        sink.write_f64::<LittleEndian>(value)
    }

    fn write_rational(&self, sink: &mut dyn Write, value: (u32, u32)) -> Result<()> {
        sink.write_u32::<LittleEndian>(value.0)?;
        sink.write_u32::<LittleEndian>(value.1)
    }

    fn write_srational(&self, sink: &mut dyn Write, value: (i32, i32)) -> Result<()> {
        sink.write_i32::<LittleEndian>(value.0)?;
        sink.write_i32::<LittleEndian>(value.1)
    }
}

/// Big-endian byte order handler
pub struct BigEndianHandler;

impl ByteOrderHandler for BigEndianHandler {
    fn order(&self) -> ByteOrder {
        ByteOrder::BigEndian
    }

    fn read_u16(&self, stream: &mut dyn SeekableStream) -> Result<u16> {
        stream.read_u16::<BigEndian>()
    }

    fn read_u32(&self, stream: &mut dyn SeekableStream) -> Result<u32> {
        stream.read_u32::<BigEndian>()
    }

    fn read_u64(&self, stream: &mut dyn SeekableStream) -> Result<u64> {
        stream.read_u64::<BigEndian>()
    }

    fn read_i16(&self, stream: &mut dyn SeekableStream) -> Result<i16> {
        stream.read_i16::<BigEndian>()
    }

    fn read_i32(&self, stream: &mut dyn SeekableStream) -> Result<i32> {
        stream.read_i32::<BigEndian>()
    }

    fn read_i64(&self, stream: &mut dyn SeekableStream) -> Result<i64> {
        stream.read_i64::<BigEndian>()
    }

    fn read_f32(&self, stream: &mut dyn SeekableStream) -> Result<f32> {
        stream.read_f32::<BigEndian>()
    }

    fn read_f64(&self, stream: &mut dyn SeekableStream) -> Result<f64> {
        stream.read_f64::<BigEndian>()
    }

    fn read_rational(&self, stream: &mut dyn SeekableStream) -> Result<(u32, u32)> {
        let numerator = stream.read_u32::<BigEndian>()?;
        let denominator = stream.read_u32::<BigEndian>()?;
        Ok((numerator, denominator))
    }

    fn read_srational(&self, stream: &mut dyn SeekableStream) -> Result<(i32, i32)> {
        let numerator = stream.read_i32::<BigEndian>()?;
        let denominator = stream.read_i32::<BigEndian>()?;
        Ok((numerator, denominator))
    }

    fn write_u16(&self, sink: &mut dyn Write, value: u16) -> Result<()> {
        sink.write_u16::<BigEndian>(value)
    }

    fn write_u32(&self, sink: &mut dyn Write, value: u32) -> Result<()> {
        sink.write_u32::<BigEndian>(value)
    }

    fn write_u64(&self, sink: &mut dyn Write, value: u64) -> Result<()> {
        sink.write_u64::<BigEndian>(value)
    }

    fn write_i16(&self, sink: &mut dyn Write, value: i16) -> Result<()> {
        sink.write_i16::<BigEndian>(value)
    }

    fn write_i32(&self, sink: &mut dyn Write, value: i32) -> Result<()> {
        sink.write_i32::<BigEndian>(value)
    }

    fn write_i64(&self, sink: &mut dyn Write, value: i64) -> Result<()> {
        sink.write_i64::<BigEndian>(value)
    }

    fn write_f32(&self, sink: &mut dyn Write, value: f32) -> Result<()> {
        sink.write_f32::<BigEndian>(value)
    }

    fn write_f64(&self, sink: &mut dyn Write, value: f64) -> Result<()> {
        sink.write_f64::<BigEndian>(value)
    }

    fn write_rational(&self, sink: &mut dyn Write, value: (u32, u32)) -> Result<()> {
        sink.write_u32::<BigEndian>(value.0)?;
        sink.write_u32::<BigEndian>(value.1)
    }

    fn write_srational(&self, sink: &mut dyn Write, value: (i32, i32)) -> Result<()> {
        sink.write_i32::<BigEndian>(value.0)?;
        sink.write_i32::<BigEndian>(value.1)
    }
}
