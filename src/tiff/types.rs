//! Closed code sets of the TIFF format
//!
//! Enumerations for field types, compressions, photometric interpretations,
//! planar configurations, sample formats, fill orders, predictors and the
//! pixel types this library writes. Conversions from on-disk codes are
//! total: an unknown code yields `None` rather than aborting the parse.

use crate::tiff::constants::{
    compression, field_types, fill_order, photometric, planar_config, predictor, sample_format,
};

/// Field types as used in IFD entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// 8-bit unsigned integer
    Byte,
    /// 8-bit ASCII character
    Ascii,
    /// 16-bit unsigned integer
    Short,
    /// 32-bit unsigned integer
    Long,
    /// Two LONGs: numerator and denominator
    Rational,
    /// 8-bit signed integer
    SByte,
    /// 8-bit byte with unspecified format
    Undefined,
    /// 16-bit signed integer
    SShort,
    /// 32-bit signed integer
    SLong,
    /// Two SLONGs: numerator and denominator
    SRational,
    /// Single precision IEEE floating point
    Float,
    /// Double precision IEEE floating point
    Double,
    /// 32-bit IFD offset
    Ifd,
    /// BigTIFF 64-bit unsigned integer
    Long8,
    /// BigTIFF 64-bit signed integer
    SLong8,
    /// BigTIFF 64-bit IFD offset
    Ifd8,
}

impl FieldType {
    /// Converts an on-disk type code, `None` for unknown codes
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            field_types::BYTE => Some(FieldType::Byte),
            field_types::ASCII => Some(FieldType::Ascii),
            field_types::SHORT => Some(FieldType::Short),
            field_types::LONG => Some(FieldType::Long),
            field_types::RATIONAL => Some(FieldType::Rational),
            field_types::SBYTE => Some(FieldType::SByte),
            field_types::UNDEFINED => Some(FieldType::Undefined),
            field_types::SSHORT => Some(FieldType::SShort),
            field_types::SLONG => Some(FieldType::SLong),
            field_types::SRATIONAL => Some(FieldType::SRational),
            field_types::FLOAT => Some(FieldType::Float),
            field_types::DOUBLE => Some(FieldType::Double),
            field_types::IFD => Some(FieldType::Ifd),
            field_types::LONG8 => Some(FieldType::Long8),
            field_types::SLONG8 => Some(FieldType::SLong8),
            field_types::IFD8 => Some(FieldType::Ifd8),
            _ => None,
        }
    }

    /// The on-disk type code
    pub fn code(&self) -> u16 {
        match self {
            FieldType::Byte => field_types::BYTE,
            FieldType::Ascii => field_types::ASCII,
            FieldType::Short => field_types::SHORT,
            FieldType::Long => field_types::LONG,
            FieldType::Rational => field_types::RATIONAL,
            FieldType::SByte => field_types::SBYTE,
            FieldType::Undefined => field_types::UNDEFINED,
            FieldType::SShort => field_types::SSHORT,
            FieldType::SLong => field_types::SLONG,
            FieldType::SRational => field_types::SRATIONAL,
            FieldType::Float => field_types::FLOAT,
            FieldType::Double => field_types::DOUBLE,
            FieldType::Ifd => field_types::IFD,
            FieldType::Long8 => field_types::LONG8,
            FieldType::SLong8 => field_types::SLONG8,
            FieldType::Ifd8 => field_types::IFD8,
        }
    }

    /// Size in bytes of a single value of this type
    pub fn size_in_bytes(&self) -> u64 {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::SByte | FieldType::Undefined => 1,
            FieldType::Short | FieldType::SShort => 2,
            FieldType::Long | FieldType::SLong | FieldType::Float | FieldType::Ifd => 4,
            FieldType::Rational | FieldType::SRational | FieldType::Double => 8,
            FieldType::Long8 | FieldType::SLong8 | FieldType::Ifd8 => 8,
        }
    }

    /// Whether this type only exists in BigTIFF files
    pub fn is_big_tiff_only(&self) -> bool {
        matches!(self, FieldType::Long8 | FieldType::SLong8 | FieldType::Ifd8)
    }
}

/// Compression schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {
    /// No compression
    None,
    /// CCITT modified Huffman RLE
    CcittRle,
    /// CCITT Group 3 fax
    CcittFax3,
    /// CCITT Group 4 fax
    CcittFax4,
    /// LZW compression
    Lzw,
    /// Old-style JPEG (deprecated)
    OldJpeg,
    /// JPEG compression
    Jpeg,
    /// Adobe Deflate (zlib)
    Deflate,
    /// Zstandard compression
    Zstd,
    /// PackBits run-length compression
    PackBits,
    /// Any compression code this library has no name for
    Unknown(u16),
}

impl Compression {
    /// Converts an on-disk compression code; never fails, unknown codes
    /// are carried as values so directory listing can proceed
    pub fn from_code(code: u16) -> Self {
        match code {
            compression::NONE => Compression::None,
            compression::CCITT_RLE => Compression::CcittRle,
            compression::CCITT_FAX3 => Compression::CcittFax3,
            compression::CCITT_FAX4 => Compression::CcittFax4,
            compression::LZW => Compression::Lzw,
            compression::JPEG_OLD => Compression::OldJpeg,
            compression::JPEG => Compression::Jpeg,
            compression::DEFLATE => Compression::Deflate,
            compression::ZSTD => Compression::Zstd,
            compression::PACKBITS => Compression::PackBits,
            other => Compression::Unknown(other),
        }
    }

    /// The on-disk compression code
    pub fn code(&self) -> u16 {
        match self {
            Compression::None => compression::NONE,
            Compression::CcittRle => compression::CCITT_RLE,
            Compression::CcittFax3 => compression::CCITT_FAX3,
            Compression::CcittFax4 => compression::CCITT_FAX4,
            Compression::Lzw => compression::LZW,
            Compression::OldJpeg => compression::JPEG_OLD,
            Compression::Jpeg => compression::JPEG,
            Compression::Deflate => compression::DEFLATE,
            Compression::Zstd => compression::ZSTD,
            Compression::PackBits => compression::PACKBITS,
            Compression::Unknown(code) => *code,
        }
    }

    /// Human-readable name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Compression::None => "Uncompressed",
            Compression::CcittRle => "CCITT RLE",
            Compression::CcittFax3 => "CCITT Group 3",
            Compression::CcittFax4 => "CCITT Group 4",
            Compression::Lzw => "LZW",
            Compression::OldJpeg => "Old JPEG",
            Compression::Jpeg => "JPEG",
            Compression::Deflate => "Adobe Deflate",
            Compression::Zstd => "ZSTD",
            Compression::PackBits => "PackBits",
            Compression::Unknown(_) => "Unknown",
        }
    }
}

/// Photometric interpretation values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Photometric {
    /// Minimum value is white
    WhiteIsZero,
    /// Minimum value is black
    BlackIsZero,
    /// RGB color model
    Rgb,
    /// Palette color (color map indexed)
    Palette,
    /// Transparency mask
    TransparencyMask,
    /// CMYK color model
    Cmyk,
    /// YCbCr color model
    YCbCr,
    /// CIE L*a*b color model
    CieLab,
}

impl Photometric {
    /// Converts an on-disk photometric code, `None` for unknown codes
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            photometric::WHITE_IS_ZERO => Some(Photometric::WhiteIsZero),
            photometric::BLACK_IS_ZERO => Some(Photometric::BlackIsZero),
            photometric::RGB => Some(Photometric::Rgb),
            photometric::PALETTE => Some(Photometric::Palette),
            photometric::TRANSPARENCY_MASK => Some(Photometric::TransparencyMask),
            photometric::CMYK => Some(Photometric::Cmyk),
            photometric::YCBCR => Some(Photometric::YCbCr),
            photometric::CIELAB => Some(Photometric::CieLab),
            _ => None,
        }
    }

    /// The on-disk photometric code
    pub fn code(&self) -> u16 {
        match self {
            Photometric::WhiteIsZero => photometric::WHITE_IS_ZERO,
            Photometric::BlackIsZero => photometric::BLACK_IS_ZERO,
            Photometric::Rgb => photometric::RGB,
            Photometric::Palette => photometric::PALETTE,
            Photometric::TransparencyMask => photometric::TRANSPARENCY_MASK,
            Photometric::Cmyk => photometric::CMYK,
            Photometric::YCbCr => photometric::YCBCR,
            Photometric::CieLab => photometric::CIELAB,
        }
    }
}

/// Planar configuration values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanarConfig {
    /// Components stored interleaved (RGBRGBRGB)
    Chunky,
    /// Components stored separately (RRR...GGG...BBB)
    Separate,
}

impl PlanarConfig {
    /// Converts an on-disk planar configuration code
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            planar_config::CHUNKY => Some(PlanarConfig::Chunky),
            planar_config::PLANAR => Some(PlanarConfig::Separate),
            _ => None,
        }
    }

    /// The on-disk planar configuration code
    pub fn code(&self) -> u16 {
        match self {
            PlanarConfig::Chunky => planar_config::CHUNKY,
            PlanarConfig::Separate => planar_config::PLANAR,
        }
    }
}

/// Sample format values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Unsigned integer data
    Uint,
    /// Signed integer data
    Int,
    /// IEEE floating point data
    IeeeFp,
    /// Undefined data format
    Void,
    /// Complex integer data
    ComplexInt,
    /// Complex floating point data
    ComplexFp,
}

impl SampleFormat {
    /// Converts an on-disk sample format code
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            sample_format::UNSIGNED => Some(SampleFormat::Uint),
            sample_format::SIGNED => Some(SampleFormat::Int),
            sample_format::IEEEFP => Some(SampleFormat::IeeeFp),
            sample_format::VOID => Some(SampleFormat::Void),
            sample_format::COMPLEX_INT => Some(SampleFormat::ComplexInt),
            sample_format::COMPLEX_IEEEFP => Some(SampleFormat::ComplexFp),
            _ => None,
        }
    }

    /// The on-disk sample format code
    pub fn code(&self) -> u16 {
        match self {
            SampleFormat::Uint => sample_format::UNSIGNED,
            SampleFormat::Int => sample_format::SIGNED,
            SampleFormat::IeeeFp => sample_format::IEEEFP,
            SampleFormat::Void => sample_format::VOID,
            SampleFormat::ComplexInt => sample_format::COMPLEX_INT,
            SampleFormat::ComplexFp => sample_format::COMPLEX_IEEEFP,
        }
    }
}

/// Fill order values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillOrder {
    /// Most significant bit to least (the TIFF default)
    MsbFirst,
    /// Least significant bit to most
    LsbFirst,
}

impl FillOrder {
    /// Converts an on-disk fill order code
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            fill_order::MSB_TO_LSB => Some(FillOrder::MsbFirst),
            fill_order::LSB_TO_MSB => Some(FillOrder::LsbFirst),
            _ => None,
        }
    }

    /// The on-disk fill order code
    pub fn code(&self) -> u16 {
        match self {
            FillOrder::MsbFirst => fill_order::MSB_TO_LSB,
            FillOrder::LsbFirst => fill_order::LSB_TO_MSB,
        }
    }
}

/// Predictor values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredictorKind {
    /// No prediction scheme
    None,
    /// Horizontal differencing
    Horizontal,
    /// Floating point predictor
    FloatingPoint,
}

impl PredictorKind {
    /// Converts an on-disk predictor code
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            predictor::NONE => Some(PredictorKind::None),
            predictor::HORIZONTAL_DIFFERENCING => Some(PredictorKind::Horizontal),
            predictor::FLOATING_POINT => Some(PredictorKind::FloatingPoint),
            _ => None,
        }
    }

    /// The on-disk predictor code
    pub fn code(&self) -> u16 {
        match self {
            PredictorKind::None => predictor::NONE,
            PredictorKind::Horizontal => predictor::HORIZONTAL_DIFFERENCING,
            PredictorKind::FloatingPoint => predictor::FLOATING_POINT,
        }
    }
}

/// Pixel element types this library writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelType {
    Uint8,
    Int8,
    Uint16,
    Int16,
    Uint32,
    Int32,
    Float32,
    Float64,
}

impl PixelType {
    /// Bits per sample for this pixel type
    pub fn bits(&self) -> u32 {
        match self {
            PixelType::Uint8 | PixelType::Int8 => 8,
            PixelType::Uint16 | PixelType::Int16 => 16,
            PixelType::Uint32 | PixelType::Int32 | PixelType::Float32 => 32,
            PixelType::Float64 => 64,
        }
    }

    /// Bytes per sample for this pixel type
    pub fn bytes(&self) -> u32 {
        self.bits() / 8
    }

    /// Whether the samples are signed integers
    pub fn is_signed(&self) -> bool {
        matches!(self, PixelType::Int8 | PixelType::Int16 | PixelType::Int32)
    }

    /// Whether the samples are floating point
    pub fn is_float(&self) -> bool {
        matches!(self, PixelType::Float32 | PixelType::Float64)
    }

    /// The SampleFormat tag value describing this type
    pub fn sample_format(&self) -> SampleFormat {
        if self.is_float() {
            SampleFormat::IeeeFp
        } else if self.is_signed() {
            SampleFormat::Int
        } else {
            SampleFormat::Uint
        }
    }
}
