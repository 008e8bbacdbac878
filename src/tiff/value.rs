//! Typed IFD entry values
//!
//! A `TiffValue` holds the decoded payload of one IFD entry in its natural
//! Rust representation. Values know how to read themselves from a stream,
//! how large their on-disk payload is, and how to serialise themselves in
//! either byte order, including the BigTIFF rule that a single LONG stays
//! LONG (instead of widening to LONG8) for the well-known size tags.

use std::io::{Read, Write};

use crate::io::byte_order::ByteOrderHandler;
use crate::io::stream::SeekableStream;
use crate::tiff::constants::tags;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::types::FieldType;

/// The decoded payload of one IFD entry
#[derive(Debug, Clone, PartialEq)]
pub enum TiffValue {
    /// 8-bit unsigned integers
    Byte(Vec<u8>),
    /// ASCII text; serialised with a trailing NUL
    Ascii(String),
    /// 16-bit unsigned integers
    Short(Vec<u16>),
    /// 32-bit unsigned integers
    Long(Vec<u32>),
    /// Unsigned rationals (numerator, denominator)
    Rational(Vec<(u32, u32)>),
    /// 8-bit signed integers
    SByte(Vec<i8>),
    /// Raw bytes with unspecified format
    Undefined(Vec<u8>),
    /// 16-bit signed integers
    SShort(Vec<i16>),
    /// 32-bit signed integers
    SLong(Vec<i32>),
    /// Signed rationals (numerator, denominator)
    SRational(Vec<(i32, i32)>),
    /// 32-bit floats
    Float(Vec<f32>),
    /// 64-bit floats
    Double(Vec<f64>),
    /// 32-bit IFD offsets
    Ifd(Vec<u32>),
    /// 64-bit unsigned integers (BigTIFF)
    Long8(Vec<u64>),
    /// 64-bit signed integers (BigTIFF)
    SLong8(Vec<i64>),
    /// 64-bit IFD offsets (BigTIFF)
    Ifd8(Vec<u64>),
}

impl TiffValue {
    /// Convenience constructor for a single SHORT
    pub fn short(value: u16) -> Self {
        TiffValue::Short(vec![value])
    }

    /// Convenience constructor for a single LONG
    pub fn long(value: u32) -> Self {
        TiffValue::Long(vec![value])
    }

    /// Convenience constructor for a single LONG8
    pub fn long8(value: u64) -> Self {
        TiffValue::Long8(vec![value])
    }

    /// Convenience constructor for ASCII text
    pub fn ascii(text: &str) -> Self {
        TiffValue::Ascii(text.to_string())
    }

    /// The natural field type of this value
    pub fn field_type(&self) -> FieldType {
        match self {
            TiffValue::Byte(_) => FieldType::Byte,
            TiffValue::Ascii(_) => FieldType::Ascii,
            TiffValue::Short(_) => FieldType::Short,
            TiffValue::Long(_) => FieldType::Long,
            TiffValue::Rational(_) => FieldType::Rational,
            TiffValue::SByte(_) => FieldType::SByte,
            TiffValue::Undefined(_) => FieldType::Undefined,
            TiffValue::SShort(_) => FieldType::SShort,
            TiffValue::SLong(_) => FieldType::SLong,
            TiffValue::SRational(_) => FieldType::SRational,
            TiffValue::Float(_) => FieldType::Float,
            TiffValue::Double(_) => FieldType::Double,
            TiffValue::Ifd(_) => FieldType::Ifd,
            TiffValue::Long8(_) => FieldType::Long8,
            TiffValue::SLong8(_) => FieldType::SLong8,
            TiffValue::Ifd8(_) => FieldType::Ifd8,
        }
    }

    /// Number of values, as stored in the entry's count field
    ///
    /// ASCII counts include the trailing NUL byte.
    pub fn count(&self) -> u64 {
        match self {
            TiffValue::Byte(v) => v.len() as u64,
            TiffValue::Ascii(s) => s.len() as u64 + 1,
            TiffValue::Short(v) => v.len() as u64,
            TiffValue::Long(v) => v.len() as u64,
            TiffValue::Rational(v) => v.len() as u64,
            TiffValue::SByte(v) => v.len() as u64,
            TiffValue::Undefined(v) => v.len() as u64,
            TiffValue::SShort(v) => v.len() as u64,
            TiffValue::SLong(v) => v.len() as u64,
            TiffValue::SRational(v) => v.len() as u64,
            TiffValue::Float(v) => v.len() as u64,
            TiffValue::Double(v) => v.len() as u64,
            TiffValue::Ifd(v) => v.len() as u64,
            TiffValue::Long8(v) => v.len() as u64,
            TiffValue::SLong8(v) => v.len() as u64,
            TiffValue::Ifd8(v) => v.len() as u64,
        }
    }

    /// The field type this value takes on disk
    ///
    /// BigTIFF widens a single LONG to LONG8 so readers never have to
    /// guess, except for the well-known size tags, which stay LONG when
    /// they fit in 32 bits for compatibility with older viewers.
    pub fn on_disk_field_type(&self, tag: u16, big_tiff: bool) -> FieldType {
        match self {
            TiffValue::Long(v)
                if big_tiff && v.len() == 1 && !tags::WELL_KNOWN_SIZE_TAGS.contains(&tag) =>
            {
                FieldType::Long8
            }
            _ => self.field_type(),
        }
    }

    /// Size in bytes of the serialised payload for the given tag
    pub fn payload_size(&self, tag: u16, big_tiff: bool) -> u64 {
        self.count() * self.on_disk_field_type(tag, big_tiff).size_in_bytes()
    }

    /// Serialises the payload in the handler's byte order
    pub fn serialize_payload(
        &self,
        tag: u16,
        big_tiff: bool,
        handler: &dyn ByteOrderHandler,
    ) -> TiffResult<Vec<u8>> {
        let mut sink: Vec<u8> = Vec::with_capacity(self.payload_size(tag, big_tiff) as usize);
        match self {
            TiffValue::Byte(v) | TiffValue::Undefined(v) => sink.write_all(v)?,
            TiffValue::Ascii(s) => {
                sink.write_all(s.as_bytes())?;
                sink.write_all(&[0])?;
            }
            TiffValue::Short(v) => {
                for value in v {
                    handler.write_u16(&mut sink, *value)?;
                }
            }
            TiffValue::Long(v) => {
                let widen = self.on_disk_field_type(tag, big_tiff) == FieldType::Long8;
                for value in v {
                    if widen {
                        handler.write_u64(&mut sink, *value as u64)?;
                    } else {
                        handler.write_u32(&mut sink, *value)?;
                    }
                }
            }
            TiffValue::Rational(v) => {
                for value in v {
                    handler.write_rational(&mut sink, *value)?;
                }
            }
            TiffValue::SByte(v) => {
                for value in v {
                    sink.write_all(&[*value as u8])?;
                }
            }
            TiffValue::SShort(v) => {
                for value in v {
                    handler.write_i16(&mut sink, *value)?;
                }
            }
            TiffValue::SLong(v) => {
                for value in v {
                    handler.write_i32(&mut sink, *value)?;
                }
            }
            TiffValue::SRational(v) => {
                for value in v {
                    handler.write_srational(&mut sink, *value)?;
                }
            }
            TiffValue::Float(v) => {
                for value in v {
                    handler.write_f32(&mut sink, *value)?;
                }
            }
            TiffValue::Double(v) => {
                for value in v {
                    handler.write_f64(&mut sink, *value)?;
                }
            }
            TiffValue::Ifd(v) => {
                for value in v {
                    handler.write_u32(&mut sink, *value)?;
                }
            }
            TiffValue::Long8(v) | TiffValue::Ifd8(v) => {
                for value in v {
                    handler.write_u64(&mut sink, *value)?;
                }
            }
            TiffValue::SLong8(v) => {
                for value in v {
                    handler.write_i64(&mut sink, *value)?;
                }
            }
        }
        Ok(sink)
    }

    /// Reads `count` values of `field_type` from the stream's current
    /// position
    pub fn read(
        field_type: FieldType,
        count: u64,
        stream: &mut dyn SeekableStream,
        handler: &dyn ByteOrderHandler,
    ) -> TiffResult<TiffValue> {
        let n = count as usize;
        let value = match field_type {
            FieldType::Byte | FieldType::Undefined => {
                let mut buffer = vec![0u8; n];
                stream.read_exact(&mut buffer)?;
                if field_type == FieldType::Byte {
                    TiffValue::Byte(buffer)
                } else {
                    TiffValue::Undefined(buffer)
                }
            }
            FieldType::Ascii => {
                let mut buffer = vec![0u8; n];
                stream.read_exact(&mut buffer)?;
                // Trim at the first NUL; the count includes it
                let end = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
                buffer.truncate(end);
                let text = String::from_utf8(buffer).map_err(|e| {
                    TiffError::FormatError(format!("invalid ASCII value: {}", e))
                })?;
                TiffValue::Ascii(text)
            }
            FieldType::Short => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_u16(stream)?);
                }
                TiffValue::Short(values)
            }
            FieldType::Long => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_u32(stream)?);
                }
                TiffValue::Long(values)
            }
            FieldType::Rational => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_rational(stream)?);
                }
                TiffValue::Rational(values)
            }
            FieldType::SByte => {
                let mut buffer = vec![0u8; n];
                stream.read_exact(&mut buffer)?;
                TiffValue::SByte(buffer.into_iter().map(|b| b as i8).collect())
            }
            FieldType::SShort => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_i16(stream)?);
                }
                TiffValue::SShort(values)
            }
            FieldType::SLong => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_i32(stream)?);
                }
                TiffValue::SLong(values)
            }
            FieldType::SRational => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_srational(stream)?);
                }
                TiffValue::SRational(values)
            }
            FieldType::Float => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_f32(stream)?);
                }
                TiffValue::Float(values)
            }
            FieldType::Double => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_f64(stream)?);
                }
                TiffValue::Double(values)
            }
            FieldType::Ifd => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_u32(stream)?);
                }
                TiffValue::Ifd(values)
            }
            FieldType::Long8 => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_u64(stream)?);
                }
                TiffValue::Long8(values)
            }
            FieldType::SLong8 => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_i64(stream)?);
                }
                TiffValue::SLong8(values)
            }
            FieldType::Ifd8 => {
                let mut values = Vec::with_capacity(n);
                for _ in 0..n {
                    values.push(handler.read_u64(stream)?);
                }
                TiffValue::Ifd8(values)
            }
        };
        Ok(value)
    }

    /// Widens integer payloads to u64; `None` for non-integer values
    pub fn as_u64s(&self) -> Option<Vec<u64>> {
        match self {
            TiffValue::Byte(v) | TiffValue::Undefined(v) => {
                Some(v.iter().map(|&x| x as u64).collect())
            }
            TiffValue::Short(v) => Some(v.iter().map(|&x| x as u64).collect()),
            TiffValue::Long(v) | TiffValue::Ifd(v) => Some(v.iter().map(|&x| x as u64).collect()),
            TiffValue::Long8(v) | TiffValue::Ifd8(v) => Some(v.clone()),
            TiffValue::SByte(v) => Some(v.iter().map(|&x| x as u64).collect()),
            TiffValue::SShort(v) => Some(v.iter().map(|&x| x as u64).collect()),
            TiffValue::SLong(v) => Some(v.iter().map(|&x| x as u64).collect()),
            TiffValue::SLong8(v) => Some(v.iter().map(|&x| x as u64).collect()),
            _ => None,
        }
    }

    /// First value widened to u64, when this is an integer payload
    pub fn first_u64(&self) -> Option<u64> {
        self.as_u64s().and_then(|v| v.first().copied())
    }

    /// First value narrowed to u32, when it fits
    pub fn first_u32(&self) -> Option<u32> {
        self.first_u64().and_then(|v| u32::try_from(v).ok())
    }

    /// First value narrowed to u16, when it fits
    pub fn first_u16(&self) -> Option<u16> {
        self.first_u64().and_then(|v| u16::try_from(v).ok())
    }

    /// Rational payload as f64 quotients; `None` for other values
    pub fn as_f64s(&self) -> Option<Vec<f64>> {
        match self {
            TiffValue::Rational(v) => Some(
                v.iter()
                    .map(|&(n, d)| if d == 0 { 0.0 } else { n as f64 / d as f64 })
                    .collect(),
            ),
            TiffValue::SRational(v) => Some(
                v.iter()
                    .map(|&(n, d)| if d == 0 { 0.0 } else { n as f64 / d as f64 })
                    .collect(),
            ),
            TiffValue::Float(v) => Some(v.iter().map(|&x| x as f64).collect()),
            TiffValue::Double(v) => Some(v.clone()),
            _ => None,
        }
    }
}
