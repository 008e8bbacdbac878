//! Image File Directory (IFD) structures and methods
//!
//! This module implements the core TIFF IFD (Image File Directory)
//! structures that store metadata about images in a TIFF file. An IFD is a
//! typed tag→value map: entries parsed from disk keep their raw metadata
//! alongside the decoded value, and entries staged for writing are
//! serialised in ascending tag order.
//!
//! An IFD is either *read* (it has an offset of origin) or *staged for
//! writing* (it has a file offset for writing); the two phases are mutually
//! exclusive over one lifetime. Endianness and BigTIFF-ness are in-memory
//! flags only and are never serialised as entries.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::{debug, trace, warn};

use crate::tiff::constants::{ifd_layout, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::types::{
    Compression, FieldType, FillOrder, Photometric, PlanarConfig, PredictorKind, SampleFormat,
};
use crate::tiff::value::TiffValue;
use crate::utils::tag_utils;

/// Products of pixel dimensions are capped at this to keep byte counts
/// addressable with 32-bit signed arithmetic everywhere
const MAX_SIZE_PRODUCT: u64 = i32::MAX as u64;

/// Raw on-disk metadata of one IFD entry
///
/// Kept alongside the decoded value after parsing so diagnostics can point
/// at the original encoding.
#[derive(Debug, Clone)]
pub struct IfdEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type code as stored on disk
    pub field_type: u16,
    /// Number of values
    pub count: u64,
    /// Value or offset to values
    pub value_offset: u64,
}

impl IfdEntry {
    /// Creates a new raw entry record
    pub fn new(tag: u16, field_type: u16, count: u64, value_offset: u64) -> Self {
        trace!(
            "IFD entry: tag={} ({}), type={}, count={}, offset/value={}",
            tag,
            tag_utils::get_tag_name(tag),
            field_type,
            count,
            value_offset
        );
        Self {
            tag,
            field_type,
            count,
            value_offset,
        }
    }

    /// Size in bytes of a single value of this entry's field type
    pub fn field_type_size(&self) -> u64 {
        FieldType::from_code(self.field_type)
            .map(|t| t.size_in_bytes())
            .unwrap_or(1)
    }

    /// Determines if the value is stored inline in the offset slot rather
    /// than at an external offset
    pub fn is_value_inline(&self, is_big_tiff: bool) -> bool {
        let total_size = self.field_type_size() * self.count;
        let inline_size = if is_big_tiff {
            ifd_layout::BIGTIFF_INLINE_SIZE
        } else {
            ifd_layout::TIFF_INLINE_SIZE
        };
        total_size <= inline_size
    }
}

/// An Image File Directory: typed tag→value map plus file placement state
#[derive(Debug, Clone, Default)]
pub struct Ifd {
    /// Decoded entries, ordered by ascending tag
    entries: BTreeMap<u16, TiffValue>,
    /// Raw entry metadata captured during parsing
    raw_entries: HashMap<u16, IfdEntry>,
    /// IFD number (0-based position in the walk order)
    pub number: usize,
    /// Offset this IFD was read from, when parsed from a file
    offset_of_origin: Option<u64>,
    /// Offset this IFD will be (or was) written at, when staged
    file_offset_for_writing: Option<u64>,
    /// Next-IFD offset read from the file trailer
    next_ifd_offset: Option<u64>,
    /// In-memory flag: values serialise little-endian
    little_endian: bool,
    /// In-memory flag: this directory belongs to a BigTIFF file
    big_tiff: bool,
    /// Set once the IFD is frozen for serialisation
    frozen: bool,
}

impl Ifd {
    /// Creates a new empty IFD
    pub fn new() -> Self {
        Ifd {
            little_endian: true,
            ..Default::default()
        }
    }

    /// Creates an IFD parsed from the given file offset
    pub fn read_from(number: usize, offset: u64) -> Self {
        debug!("Creating IFD #{} read from offset {}", number, offset);
        Ifd {
            number,
            offset_of_origin: Some(offset),
            little_endian: true,
            ..Default::default()
        }
    }

    // ---- map operations -------------------------------------------------

    /// Checks whether a tag is present
    pub fn contains(&self, tag: u16) -> bool {
        self.entries.contains_key(&tag)
    }

    /// Gets the decoded value for a tag
    pub fn get(&self, tag: u16) -> Option<&TiffValue> {
        self.entries.get(&tag)
    }

    /// Sets a tag value, replacing any previous value
    ///
    /// Fails once the IFD has been frozen for writing.
    pub fn set(&mut self, tag: u16, value: TiffValue) -> TiffResult<&mut Self> {
        if self.frozen {
            return Err(TiffError::FrozenIfd);
        }
        trace!(
            "Setting tag {} ({}) in IFD #{}",
            tag,
            tag_utils::get_tag_name(tag),
            self.number
        );
        self.entries.insert(tag, value);
        Ok(self)
    }

    /// Removes a tag, returning its previous value
    pub fn remove(&mut self, tag: u16) -> TiffResult<Option<TiffValue>> {
        if self.frozen {
            return Err(TiffError::FrozenIfd);
        }
        self.raw_entries.remove(&tag);
        Ok(self.entries.remove(&tag))
    }

    /// Number of entries
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Iterates entries in ascending tag order (the serialisation order)
    pub fn iter(&self) -> impl Iterator<Item = (&u16, &TiffValue)> {
        self.entries.iter()
    }

    /// Records the raw on-disk metadata for a parsed entry
    pub fn set_raw_entry(&mut self, entry: IfdEntry) {
        self.raw_entries.insert(entry.tag, entry);
    }

    /// Raw on-disk metadata for a tag, when this IFD was parsed
    pub fn raw_entry(&self, tag: u16) -> Option<&IfdEntry> {
        self.raw_entries.get(&tag)
    }

    // ---- placement state ------------------------------------------------

    /// Offset this IFD was parsed from
    pub fn offset_of_origin(&self) -> Option<u64> {
        self.offset_of_origin
    }

    /// Offset reserved or used for writing this IFD
    pub fn file_offset_for_writing(&self) -> Option<u64> {
        self.file_offset_for_writing
    }

    /// Stages this IFD for writing at the given (even) offset
    ///
    /// Staging ends the read phase: the offset of origin is cleared.
    pub fn set_file_offset_for_writing(&mut self, offset: u64) -> TiffResult<&mut Self> {
        if offset % 2 != 0 {
            return Err(TiffError::OddOffset(offset));
        }
        self.offset_of_origin = None;
        self.file_offset_for_writing = Some(offset);
        Ok(self)
    }

    /// Next-IFD offset recorded by the parser
    pub fn next_ifd_offset(&self) -> Option<u64> {
        self.next_ifd_offset
    }

    /// Records the next-IFD offset seen after this directory
    pub fn set_next_ifd_offset(&mut self, offset: u64) {
        self.next_ifd_offset = Some(offset);
    }

    /// Clears chain state ahead of re-writing the directory
    pub fn clear_next_ifd_offset(&mut self) {
        self.next_ifd_offset = None;
    }

    /// Whether values serialise little-endian
    pub fn is_little_endian(&self) -> bool {
        self.little_endian
    }

    /// Whether this directory belongs to a BigTIFF file
    pub fn is_big_tiff(&self) -> bool {
        self.big_tiff
    }

    /// Stamps the in-memory endianness/BigTIFF flags
    pub fn set_format_flags(&mut self, little_endian: bool, big_tiff: bool) -> &mut Self {
        self.little_endian = little_endian;
        self.big_tiff = big_tiff;
        self
    }

    /// Whether the IFD has been frozen for writing
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Freezes the IFD; later mutation attempts are rejected
    pub fn freeze_for_writing(&mut self) {
        debug!("Freezing IFD #{} for writing", self.number);
        self.frozen = true;
    }

    // ---- derived accessors ----------------------------------------------

    fn required_dimension(&self, tag: u16) -> TiffResult<u32> {
        let value = self
            .get(tag)
            .and_then(|v| v.first_u64())
            .ok_or(TiffError::MissingDimensions)?;
        if value == 0 || value > MAX_SIZE_PRODUCT {
            return Err(TiffError::FormatError(format!(
                "{} is {}; must be positive and below 2^31",
                tag_utils::get_tag_name(tag),
                value
            )));
        }
        Ok(value as u32)
    }

    /// Image width in pixels (positive, below 2^31)
    pub fn image_width(&self) -> TiffResult<u32> {
        self.required_dimension(tags::IMAGE_WIDTH)
    }

    /// Image height in pixels (positive, below 2^31)
    pub fn image_length(&self) -> TiffResult<u32> {
        self.required_dimension(tags::IMAGE_LENGTH)
    }

    /// Bits per sample, equal across channels
    ///
    /// Unequal per-channel bit depths are a fatal format error. A missing
    /// tag means the TIFF default of 1.
    pub fn bits_per_sample(&self) -> TiffResult<u32> {
        let values = match self.get(tags::BITS_PER_SAMPLE).and_then(|v| v.as_u64s()) {
            Some(v) if !v.is_empty() => v,
            _ => return Ok(1),
        };
        let first = values[0];
        if values.iter().any(|&b| b != first) {
            return Err(TiffError::UnequalBitsPerSample(
                values.iter().map(|&b| b as u32).collect(),
            ));
        }
        if first == 0 || first > 64 {
            return Err(TiffError::FormatError(format!(
                "BitsPerSample is {}; must be between 1 and 64",
                first
            )));
        }
        Ok(first as u32)
    }

    /// Bytes per sample, rounding sub-byte precisions up
    pub fn bytes_per_sample(&self) -> TiffResult<u32> {
        Ok((self.bits_per_sample()? + 7) / 8)
    }

    /// Number of components per pixel (default 1)
    pub fn samples_per_pixel(&self) -> u32 {
        self.get(tags::SAMPLES_PER_PIXEL)
            .and_then(|v| v.first_u32())
            .unwrap_or(1)
    }

    /// Compression scheme (default uncompressed)
    pub fn compression(&self) -> Compression {
        self.get(tags::COMPRESSION)
            .and_then(|v| v.first_u16())
            .map(Compression::from_code)
            .unwrap_or(Compression::None)
    }

    /// Photometric interpretation, when present and recognised
    pub fn photometric(&self) -> Option<Photometric> {
        self.get(tags::PHOTOMETRIC_INTERPRETATION)
            .and_then(|v| v.first_u16())
            .and_then(Photometric::from_code)
    }

    /// Planar configuration (default chunky)
    pub fn planar_config(&self) -> TiffResult<PlanarConfig> {
        match self.get(tags::PLANAR_CONFIGURATION).and_then(|v| v.first_u16()) {
            None => Ok(PlanarConfig::Chunky),
            Some(code) => PlanarConfig::from_code(code).ok_or_else(|| {
                TiffError::FormatError(format!("invalid PlanarConfiguration: {}", code))
            }),
        }
    }

    /// Fill order (default MSB-first); unknown codes degrade to the default
    pub fn fill_order(&self) -> FillOrder {
        match self.get(tags::FILL_ORDER).and_then(|v| v.first_u16()) {
            None => FillOrder::MsbFirst,
            Some(code) => FillOrder::from_code(code).unwrap_or_else(|| {
                warn!("Unknown FillOrder {} in IFD #{}, assuming MSB-first", code, self.number);
                FillOrder::MsbFirst
            }),
        }
    }

    /// Predictor (default none)
    pub fn predictor(&self) -> TiffResult<PredictorKind> {
        match self.get(tags::PREDICTOR).and_then(|v| v.first_u16()) {
            None => Ok(PredictorKind::None),
            Some(code) => PredictorKind::from_code(code)
                .ok_or_else(|| TiffError::FormatError(format!("invalid Predictor: {}", code))),
        }
    }

    /// Sample format (default unsigned integer)
    pub fn sample_format(&self) -> SampleFormat {
        self.get(tags::SAMPLE_FORMAT)
            .and_then(|v| v.first_u16())
            .and_then(SampleFormat::from_code)
            .unwrap_or(SampleFormat::Uint)
    }

    /// Whether samples are signed integers
    pub fn is_signed(&self) -> bool {
        self.sample_format() == SampleFormat::Int
    }

    /// Whether samples are floating point
    pub fn is_float(&self) -> bool {
        self.sample_format() == SampleFormat::IeeeFp
    }

    /// Rows per strip, when present
    pub fn rows_per_strip(&self) -> Option<u32> {
        self.get(tags::ROWS_PER_STRIP).and_then(|v| v.first_u32())
    }

    /// Whether this image stores true tiles (both tile dimension tags set)
    pub fn is_tiled(&self) -> bool {
        self.contains(tags::TILE_WIDTH) && self.contains(tags::TILE_LENGTH)
    }

    /// Whether this IFD describes a reduced-resolution (thumbnail) image
    pub fn is_thumbnail(&self) -> bool {
        self.get(tags::NEW_SUBFILE_TYPE)
            .and_then(|v| v.first_u64())
            .map(|v| v & 1 == 1)
            .unwrap_or(false)
    }

    /// Horizontal tile dimension: TileWidth for tiled images, the full
    /// image width for stripped ones
    pub fn tile_size_x(&self) -> TiffResult<u32> {
        if self.is_tiled() {
            self.required_dimension(tags::TILE_WIDTH)
        } else {
            self.image_width()
        }
    }

    /// Vertical tile dimension: TileLength for tiled images, RowsPerStrip
    /// (or the full image height) for stripped ones
    pub fn tile_size_y(&self) -> TiffResult<u32> {
        if self.is_tiled() {
            self.required_dimension(tags::TILE_LENGTH)
        } else {
            let height = self.image_length()?;
            match self.rows_per_strip() {
                Some(rows) if rows > 0 => Ok(rows.min(height)),
                _ => Ok(height),
            }
        }
    }

    /// Number of tile columns: ⌈image width / tile width⌉
    pub fn tiles_per_row(&self) -> TiffResult<u32> {
        let width = self.image_width()? as u64;
        let tile = self.tile_size_x()? as u64;
        Ok(((width + tile - 1) / tile) as u32)
    }

    /// Number of tile rows: ⌈image height / tile height⌉
    pub fn tiles_per_column(&self) -> TiffResult<u32> {
        let height = self.image_length()? as u64;
        let tile = self.tile_size_y()? as u64;
        Ok(((height + tile - 1) / tile) as u32)
    }

    /// Number of separated planes: the channel count for planar images,
    /// 1 for chunky ones
    pub fn separated_plane_count(&self) -> TiffResult<u32> {
        Ok(match self.planar_config()? {
            PlanarConfig::Chunky => 1,
            PlanarConfig::Separate => self.samples_per_pixel(),
        })
    }

    /// Samples stored per pixel inside one tile (1 for planar images)
    pub fn samples_per_tile_pixel(&self) -> TiffResult<u32> {
        Ok(match self.planar_config()? {
            PlanarConfig::Chunky => self.samples_per_pixel(),
            PlanarConfig::Separate => 1,
        })
    }

    /// Total number of grid cells: columns × rows × planes
    pub fn grid_tile_count(&self) -> TiffResult<u64> {
        Ok(self.tiles_per_row()? as u64
            * self.tiles_per_column()? as u64
            * self.separated_plane_count()? as u64)
    }

    fn checked_size_product(&self, factors: &[u64]) -> TiffResult<usize> {
        let mut product: u64 = 1;
        for &factor in factors {
            product = product
                .checked_mul(factor)
                .ok_or(TiffError::SizeOverflow(u64::MAX))?;
            if product > MAX_SIZE_PRODUCT {
                return Err(TiffError::SizeOverflow(product));
            }
        }
        Ok(product as usize)
    }

    /// Size in bytes of one decoded tile, checked against the 31-bit limit
    pub fn size_of_tile(&self, bytes_per_sample: u32) -> TiffResult<usize> {
        self.checked_size_product(&[
            self.tile_size_x()? as u64,
            self.tile_size_y()? as u64,
            self.samples_per_tile_pixel()? as u64,
            bytes_per_sample as u64,
        ])
    }

    /// Size in bytes of a decoded region covering all channels, checked
    /// against the 31-bit limit
    pub fn size_of_region(&self, size_x: u32, size_y: u32) -> TiffResult<usize> {
        self.checked_size_product(&[
            size_x as u64,
            size_y as u64,
            self.samples_per_pixel() as u64,
            self.bytes_per_sample()? as u64,
        ])
    }

    /// Tile (or strip) data offsets
    ///
    /// Tiled images read TileOffsets; everything else reads StripOffsets,
    /// even when stray tile tags are present. When the preferred tag is
    /// missing entirely the other one is accepted with a warning.
    pub fn data_offsets(&self) -> TiffResult<Vec<u64>> {
        self.positioning_array(tags::TILE_OFFSETS, tags::STRIP_OFFSETS)
    }

    /// Tile (or strip) data byte counts, with the same fallback rule as
    /// [`Ifd::data_offsets`]
    pub fn data_byte_counts(&self) -> TiffResult<Vec<u64>> {
        self.positioning_array(tags::TILE_BYTE_COUNTS, tags::STRIP_BYTE_COUNTS)
    }

    fn positioning_array(&self, tiled_tag: u16, stripped_tag: u16) -> TiffResult<Vec<u64>> {
        let (preferred, alternate) = if self.is_tiled() {
            (tiled_tag, stripped_tag)
        } else {
            (stripped_tag, tiled_tag)
        };
        if let Some(values) = self.get(preferred).and_then(|v| v.as_u64s()) {
            return Ok(values);
        }
        if let Some(values) = self.get(alternate).and_then(|v| v.as_u64s()) {
            warn!(
                "IFD #{}: {} missing, falling back to {}",
                self.number,
                tag_utils::get_tag_name(preferred),
                tag_utils::get_tag_name(alternate)
            );
            return Ok(values);
        }
        Err(TiffError::TagNotFound(preferred))
    }

    /// Offsets of child IFDs (SubIFD and Exif IFD pointers)
    pub fn child_ifd_offsets(&self) -> Vec<u64> {
        let mut offsets = Vec::new();
        for tag in [tags::SUB_IFD, tags::EXIF_IFD] {
            if let Some(values) = self.get(tag).and_then(|v| v.as_u64s()) {
                offsets.extend(values);
            }
        }
        offsets
    }

    // ---- write-side staging ---------------------------------------------

    /// Replaces the data positioning arrays after tiles have been flushed
    ///
    /// Offsets become LONG8 in BigTIFF files and LONG in classic ones;
    /// classic offsets that do not fit in 32 bits are a fatal error.
    pub fn update_data_positioning(
        &mut self,
        offsets: &[u64],
        byte_counts: &[u64],
    ) -> TiffResult<&mut Self> {
        if self.frozen {
            return Err(TiffError::FrozenIfd);
        }
        if offsets.len() != byte_counts.len() {
            return Err(TiffError::FormatError(format!(
                "positioning arrays differ in length: {} offsets vs {} byte counts",
                offsets.len(),
                byte_counts.len()
            )));
        }
        let expected = self.grid_tile_count()?;
        if offsets.len() as u64 != expected {
            return Err(TiffError::FormatError(format!(
                "positioning arrays have {} elements; the tile grid has {}",
                offsets.len(),
                expected
            )));
        }
        let (offsets_tag, counts_tag) = if self.is_tiled() {
            (tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS)
        } else {
            (tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS)
        };
        let (offset_value, count_value) = if self.big_tiff {
            (
                TiffValue::Long8(offsets.to_vec()),
                TiffValue::Long8(byte_counts.to_vec()),
            )
        } else {
            let mut narrow_offsets = Vec::with_capacity(offsets.len());
            for &offset in offsets {
                narrow_offsets.push(u32::try_from(offset).map_err(|_| {
                    TiffError::FormatError(format!(
                        "offset {} does not fit in a classic TIFF LONG",
                        offset
                    ))
                })?);
            }
            let mut narrow_counts = Vec::with_capacity(byte_counts.len());
            for &count in byte_counts {
                narrow_counts.push(u32::try_from(count).map_err(|_| {
                    TiffError::FormatError(format!(
                        "byte count {} does not fit in a classic TIFF LONG",
                        count
                    ))
                })?);
            }
            (
                TiffValue::Long(narrow_offsets),
                TiffValue::Long(narrow_counts),
            )
        };
        self.entries.insert(offsets_tag, offset_value);
        self.entries.insert(counts_tag, count_value);
        Ok(self)
    }

    /// Updates the image dimensions (resizable maps settle them late)
    pub fn update_image_dimensions(&mut self, width: u32, height: u32) -> TiffResult<&mut Self> {
        if self.frozen {
            return Err(TiffError::FrozenIfd);
        }
        if width == 0 || height == 0 {
            return Err(TiffError::FormatError(format!(
                "image dimensions {}x{} must be positive",
                width, height
            )));
        }
        self.entries.insert(tags::IMAGE_WIDTH, TiffValue::long(width));
        self.entries
            .insert(tags::IMAGE_LENGTH, TiffValue::long(height));
        Ok(self)
    }

    // ---- convenience setters --------------------------------------------

    /// Sets image width and height
    pub fn set_image_dimensions(&mut self, width: u32, height: u32) -> TiffResult<&mut Self> {
        self.set(tags::IMAGE_WIDTH, TiffValue::long(width))?;
        self.set(tags::IMAGE_LENGTH, TiffValue::long(height))
    }

    /// Sets equal bits per sample for every channel
    pub fn set_bits_per_sample(&mut self, channels: u32, bits: u32) -> TiffResult<&mut Self> {
        self.set(
            tags::BITS_PER_SAMPLE,
            TiffValue::Short(vec![bits as u16; channels as usize]),
        )
    }

    /// Sets the channel count
    pub fn set_samples_per_pixel(&mut self, samples: u32) -> TiffResult<&mut Self> {
        self.set(tags::SAMPLES_PER_PIXEL, TiffValue::short(samples as u16))
    }

    /// Sets the compression scheme
    pub fn set_compression(&mut self, compression: Compression) -> TiffResult<&mut Self> {
        self.set(tags::COMPRESSION, TiffValue::short(compression.code()))
    }

    /// Sets the photometric interpretation
    pub fn set_photometric(&mut self, photometric: Photometric) -> TiffResult<&mut Self> {
        self.set(
            tags::PHOTOMETRIC_INTERPRETATION,
            TiffValue::short(photometric.code()),
        )
    }

    /// Sets the planar configuration
    pub fn set_planar_config(&mut self, config: PlanarConfig) -> TiffResult<&mut Self> {
        self.set(tags::PLANAR_CONFIGURATION, TiffValue::short(config.code()))
    }

    /// Sets the tile dimensions, making this a tiled image
    pub fn set_tile_size(&mut self, width: u32, height: u32) -> TiffResult<&mut Self> {
        self.set(tags::TILE_WIDTH, TiffValue::long(width))?;
        self.set(tags::TILE_LENGTH, TiffValue::long(height))
    }

    /// Sets rows per strip, making this a stripped image
    pub fn set_rows_per_strip(&mut self, rows: u32) -> TiffResult<&mut Self> {
        self.set(tags::ROWS_PER_STRIP, TiffValue::long(rows))
    }

    /// Sets the predictor
    pub fn set_predictor(&mut self, predictor: PredictorKind) -> TiffResult<&mut Self> {
        self.set(tags::PREDICTOR, TiffValue::short(predictor.code()))
    }

    /// Sets the fill order
    pub fn set_fill_order(&mut self, order: FillOrder) -> TiffResult<&mut Self> {
        self.set(tags::FILL_ORDER, TiffValue::short(order.code()))
    }

    /// Sets the sample format for every channel
    pub fn set_sample_format(
        &mut self,
        channels: u32,
        format: SampleFormat,
    ) -> TiffResult<&mut Self> {
        self.set(
            tags::SAMPLE_FORMAT,
            TiffValue::Short(vec![format.code(); channels as usize]),
        )
    }
}

impl fmt::Display for Ifd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset_of_origin {
            Some(offset) => writeln!(f, "IFD #{} (read from offset {})", self.number, offset)?,
            None => writeln!(f, "IFD #{}", self.number)?,
        }
        writeln!(f, "  Number of entries: {}", self.entries.len())?;
        if let (Ok(width), Ok(height)) = (self.image_width(), self.image_length()) {
            writeln!(f, "  Dimensions: {}x{}", width, height)?;
        }
        writeln!(f, "  Samples per pixel: {}", self.samples_per_pixel())?;
        writeln!(f, "  Tags:")?;
        for (tag, value) in &self.entries {
            writeln!(
                f,
                "    {} ({}): count {} [{:?}]",
                tag,
                tag_utils::get_tag_name(*tag),
                value.count(),
                value.field_type()
            )?;
        }
        Ok(())
    }
}
