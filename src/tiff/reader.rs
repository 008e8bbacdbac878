//! TIFF file reader implementation
//!
//! This module implements the TIFF/BigTIFF reader: header validation,
//! IFD chain walking (including SubIFD descent), tolerant entry parsing,
//! and the tile engine's read side: fetching encoded tiles, driving the
//! codec registry, applying pixel transforms and assembling rectangular
//! subregions.
//!
//! The reader is tolerant by default: a stream that is not a TIFF at all
//! yields an empty directory list, unknown field types are skipped and
//! truncated value arrays are clamped to the file length. `require_valid`
//! turns the header problems into hard errors; `set_strict_types(true)`
//! does the same for unknown field types.

use std::collections::HashSet;
use std::io::{Cursor, Read, Seek, SeekFrom};

use log::{debug, info, warn};

use crate::compression::{CodecOptions, CodecRegistry};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::stream::{stream_length, SeekableStream};
use crate::tiff::constants::{ifd_layout, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{Ifd, IfdEntry};
use crate::tiff::types::{Compression, FieldType, FillOrder, Photometric, PlanarConfig, PredictorKind};
use crate::tiff::validation;
use crate::tiff::value::TiffValue;
use crate::tiles::{TileIndex, TiffTile};
use crate::transforms;
use crate::utils::format_utils;
use crate::utils::tag_utils;
use crate::utils::write_utils;

/// The 32-bit offset wrap window applied by the carry-over compensation
const OFFSET_CARRY: u64 = 0x1_0000_0000;

/// Reader for TIFF and BigTIFF files
pub struct TiffReader<S: SeekableStream> {
    /// The underlying stream
    stream: S,
    /// Byte order handler detected from the header
    handler: Box<dyn ByteOrderHandler>,
    /// Detected byte order
    byte_order: ByteOrder,
    /// Whether the file is BigTIFF
    big_tiff: bool,
    /// Whether the header parsed as a TIFF at all
    valid: bool,
    /// Hard-fail on structural problems instead of degrading
    require_valid: bool,
    /// Reject unknown field types instead of skipping the entry
    strict_types: bool,
    /// Cache the directory list after the first walk
    caching: bool,
    /// Cached directories
    cached_ifds: Option<Vec<Ifd>>,
    /// Byte used to pre-fill region buffers
    filler: u8,
    /// Deliver chunky pixel order from read_region
    auto_interleave: bool,
    /// Widen sub-byte precisions to whole bytes after decoding
    auto_unpack: bool,
    /// Apply YCbCr→RGB / CMYK inversion after decoding
    auto_correct_colors: bool,
    /// Codec registry used for tile decoding
    codecs: CodecRegistry,
    /// Offset of the first IFD
    first_ifd_offset: u64,
    /// Total stream length, captured at open time
    file_length: u64,
}

impl<S: SeekableStream> TiffReader<S> {
    /// Opens a TIFF stream and validates its header
    ///
    /// With `require_valid` a malformed header is a hard error; without
    /// it the reader opens anyway and simply reports no directories.
    /// Directories themselves are loaded lazily by [`TiffReader::all_ifds`].
    pub fn open(mut stream: S, require_valid: bool) -> TiffResult<Self> {
        let file_length = stream_length(&mut stream)?;
        debug!("Opening TIFF stream of {} bytes", file_length);

        let mut valid = true;
        let mut byte_order = ByteOrder::LittleEndian;
        let mut big_tiff = false;
        let mut first_ifd_offset = 0u64;

        if file_length < 8 {
            if require_valid {
                return Err(TiffError::NotTiff);
            }
            warn!("Stream is only {} bytes; not a TIFF", file_length);
            valid = false;
        } else {
            stream.seek(SeekFrom::Start(0))?;
            match ByteOrder::detect(&mut stream) {
                Ok(order) => byte_order = order,
                Err(e) => {
                    if require_valid {
                        return Err(e);
                    }
                    warn!("Not a TIFF: {}", e);
                    valid = false;
                }
            }
        }

        let handler = byte_order.create_handler();

        if valid {
            match format_utils::detect_tiff_format(&mut stream, handler.as_ref()) {
                Ok((is_big_tiff, _)) => {
                    big_tiff = is_big_tiff;
                    first_ifd_offset = format_utils::read_first_ifd_offset(
                        &mut stream,
                        big_tiff,
                        handler.as_ref(),
                    )?;
                }
                Err(e) => {
                    if require_valid {
                        return Err(e);
                    }
                    warn!("Not a TIFF: {}", e);
                    valid = false;
                }
            }
        }

        Ok(TiffReader {
            stream,
            handler,
            byte_order,
            big_tiff,
            valid,
            require_valid,
            strict_types: false,
            caching: true,
            cached_ifds: None,
            filler: 0,
            auto_interleave: true,
            auto_unpack: true,
            auto_correct_colors: false,
            codecs: CodecRegistry::default(),
            first_ifd_offset,
            file_length,
        })
    }

    /// Whether the header parsed as a TIFF
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether the file is BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.big_tiff
    }

    /// The detected byte order
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Total stream length captured at open time
    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    /// Replaces the codec registry
    pub fn with_codecs(&mut self, codecs: CodecRegistry) -> &mut Self {
        self.codecs = codecs;
        self
    }

    /// Enables or disables directory caching
    pub fn set_caching(&mut self, caching: bool) -> &mut Self {
        self.caching = caching;
        if !caching {
            self.cached_ifds = None;
        }
        self
    }

    /// Sets the byte used to pre-fill region buffers
    pub fn set_filler(&mut self, filler: u8) -> &mut Self {
        self.filler = filler;
        self
    }

    /// Chooses chunky (true) or separated (false) output pixel order
    pub fn set_auto_interleave(&mut self, auto_interleave: bool) -> &mut Self {
        self.auto_interleave = auto_interleave;
        self
    }

    /// Rejects unknown field types instead of skipping them
    pub fn set_strict_types(&mut self, strict: bool) -> &mut Self {
        self.strict_types = strict;
        self
    }

    /// Enables or disables widening of sub-byte precisions
    pub fn set_auto_unpack(&mut self, auto_unpack: bool) -> &mut Self {
        self.auto_unpack = auto_unpack;
        self
    }

    /// Enables YCbCr→RGB conversion and CMYK inversion after decoding
    pub fn set_auto_correct_colors(&mut self, correct: bool) -> &mut Self {
        self.auto_correct_colors = correct;
        self
    }

    // ---- directory walking ----------------------------------------------

    /// Reads every directory in the file
    ///
    /// Walks the next-IFD chain and additionally follows SubIFD/Exif
    /// pointers as extra directories. The result is cached when caching
    /// is enabled.
    pub fn all_ifds(&mut self) -> TiffResult<Vec<Ifd>> {
        if let Some(cached) = &self.cached_ifds {
            return Ok(cached.clone());
        }
        if !self.valid {
            return Ok(Vec::new());
        }

        let mut ifds = Vec::new();
        let mut visited: HashSet<u64> = HashSet::new();
        let mut ifd_offset = self.first_ifd_offset;
        let mut previous_offset = 0u64;

        while ifd_offset != 0 {
            // Rare classic files beyond 4 GiB wrap their offsets modulo
            // 2^32; compensate only when the file itself is large enough
            if ifd_offset < previous_offset && self.file_length > (i32::MAX as u64) {
                let compensated = ifd_offset + OFFSET_CARRY;
                warn!(
                    "IFD offset {} below previous {}; compensating to {}",
                    ifd_offset, previous_offset, compensated
                );
                ifd_offset = compensated;
            }

            if ifd_offset >= self.file_length {
                warn!(
                    "IFD offset {} exceeds file size {}, stopping IFD chain",
                    ifd_offset, self.file_length
                );
                break;
            }
            if !visited.insert(ifd_offset) {
                warn!("IFD chain loops back to offset {}, stopping", ifd_offset);
                break;
            }

            let number = ifds.len();
            match self.read_ifd_at(ifd_offset, number) {
                Ok(ifd) => {
                    debug!("Read IFD #{} with {} entries", number, ifd.entry_count());
                    previous_offset = ifd_offset;
                    ifd_offset = ifd.next_ifd_offset().unwrap_or(0);
                    ifds.push(ifd);
                }
                Err(e) => {
                    if self.require_valid {
                        return Err(e);
                    }
                    warn!("Error reading IFD at offset {}: {}", ifd_offset, e);
                    break;
                }
            }
        }

        // Child directories referenced through SubIFD/Exif pointers
        let mut child_offsets: Vec<u64> = Vec::new();
        for ifd in &ifds {
            child_offsets.extend(ifd.child_ifd_offsets());
        }
        for offset in child_offsets {
            if offset == 0 || offset >= self.file_length || !visited.insert(offset) {
                continue;
            }
            let number = ifds.len();
            match self.read_ifd_at(offset, number) {
                Ok(ifd) => ifds.push(ifd),
                Err(e) => {
                    if self.require_valid {
                        return Err(e);
                    }
                    warn!("Error reading child IFD at offset {}: {}", offset, e);
                }
            }
        }

        info!("Read {} IFDs from TIFF stream", ifds.len());
        if self.caching {
            self.cached_ifds = Some(ifds.clone());
        }
        Ok(ifds)
    }

    /// Directories describing reduced-resolution (thumbnail) images
    pub fn thumbnails(&mut self) -> TiffResult<Vec<Ifd>> {
        Ok(self
            .all_ifds()?
            .into_iter()
            .filter(|ifd| ifd.is_thumbnail())
            .collect())
    }

    /// Directories describing full-resolution images
    pub fn non_thumbnails(&mut self) -> TiffResult<Vec<Ifd>> {
        Ok(self
            .all_ifds()?
            .into_iter()
            .filter(|ifd| !ifd.is_thumbnail())
            .collect())
    }

    /// Reads the directory at the given offset
    pub fn read_ifd_at(&mut self, offset: u64, number: usize) -> TiffResult<Ifd> {
        self.stream.seek(SeekFrom::Start(offset))?;

        let entry_count = if self.big_tiff {
            let count = self.handler.read_u64(&mut self.stream)?;
            if count > ifd_layout::BIGTIFF_MAX_ENTRY_COUNT {
                return Err(TiffError::FormatError(format!(
                    "BigTIFF IFD declares {} entries (limit {})",
                    count,
                    ifd_layout::BIGTIFF_MAX_ENTRY_COUNT
                )));
            }
            count
        } else {
            self.handler.read_u16(&mut self.stream)? as u64
        };
        debug!("IFD at {}: {} entries", offset, entry_count);

        // Read the raw table first; external values are loaded after the
        // trailer so the seeks don't lose our place
        let mut raw_entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            raw_entries.push(self.read_raw_entry()?);
        }

        let next_ifd_offset = if self.big_tiff {
            self.handler.read_u64(&mut self.stream)?
        } else {
            self.handler.read_u32(&mut self.stream)? as u64
        };

        let mut ifd = Ifd::read_from(number, offset);
        ifd.set_format_flags(self.byte_order.is_little_endian(), self.big_tiff);
        ifd.set_next_ifd_offset(next_ifd_offset);

        for entry in raw_entries {
            match self.decode_entry(&entry)? {
                Some(value) => {
                    ifd.set(entry.tag, value)?;
                    ifd.set_raw_entry(entry);
                }
                None => continue,
            }
        }

        Ok(ifd)
    }

    /// Reads one raw IFD entry at the current position
    fn read_raw_entry(&mut self) -> TiffResult<IfdEntry> {
        let tag = self.handler.read_u16(&mut self.stream)?;
        let field_type = self.handler.read_u16(&mut self.stream)?;
        let (count, value_offset) = if self.big_tiff {
            (
                self.handler.read_u64(&mut self.stream)?,
                self.handler.read_u64(&mut self.stream)?,
            )
        } else {
            (
                self.handler.read_u32(&mut self.stream)? as u64,
                self.handler.read_u32(&mut self.stream)? as u64,
            )
        };
        Ok(IfdEntry::new(tag, field_type, count, value_offset))
    }

    /// Decodes one entry's value, honouring the recovery rules
    ///
    /// Unknown field types are skipped (or rejected in strict mode);
    /// external arrays running past the end of the file are truncated.
    fn decode_entry(&mut self, entry: &IfdEntry) -> TiffResult<Option<TiffValue>> {
        let field_type = match FieldType::from_code(entry.field_type) {
            Some(t) => t,
            None => {
                if self.strict_types {
                    return Err(TiffError::UnsupportedFieldType(entry.field_type));
                }
                warn!(
                    "Skipping tag {} ({}) with unknown field type {}",
                    entry.tag,
                    tag_utils::get_tag_name(entry.tag),
                    entry.field_type
                );
                return Ok(None);
            }
        };

        let type_size = field_type.size_in_bytes();
        if entry.is_value_inline(self.big_tiff) {
            // Re-serialise the slot in file order to recover its raw bytes
            let mut slot = Vec::with_capacity(8);
            if self.big_tiff {
                self.handler.write_u64(&mut slot, entry.value_offset)?;
            } else {
                self.handler.write_u32(&mut slot, entry.value_offset as u32)?;
            }
            let mut cursor = Cursor::new(slot);
            let value = TiffValue::read(field_type, entry.count, &mut cursor, self.handler.as_ref())?;
            return Ok(Some(value));
        }

        let mut count = entry.count;
        if entry.value_offset >= self.file_length {
            warn!(
                "Tag {} value offset {} beyond end of file; dropping values",
                entry.tag, entry.value_offset
            );
            count = 0;
        } else {
            let available = (self.file_length - entry.value_offset) / type_size;
            if available < count {
                warn!(
                    "Tag {} value array truncated from {} to {} values",
                    entry.tag, count, available
                );
                count = available;
            }
        }

        self.stream.seek(SeekFrom::Start(entry.value_offset))?;
        let value = TiffValue::read(field_type, count, &mut self.stream, self.handler.as_ref())?;
        Ok(Some(value))
    }

    // ---- tile reading ---------------------------------------------------

    /// Validates a tile index against the IFD's grid
    fn validate_tile_index(&self, ifd: &Ifd, index: TileIndex) -> TiffResult<(u32, u32, u32)> {
        let cols = ifd.tiles_per_row()?;
        let rows = ifd.tiles_per_column()?;
        let planes = ifd.separated_plane_count()?;
        if index.plane >= planes || index.col >= cols || index.row >= rows {
            return Err(TiffError::TileIndexOutOfBounds {
                plane: index.plane,
                col: index.col,
                row: index.row,
                planes,
                cols,
                rows,
            });
        }
        Ok((planes, cols, rows))
    }

    /// Effective tile dimensions for a grid cell
    ///
    /// Only the bottom strip of a stripped image is truncated; a truly
    /// tiled image keeps nominal dimensions at every edge.
    fn effective_tile_size(&self, ifd: &Ifd, row: u32) -> TiffResult<(u32, u32)> {
        let width = ifd.tile_size_x()?;
        let mut height = ifd.tile_size_y()?;
        if !ifd.is_tiled() {
            let image_height = ifd.image_length()?;
            let top = row * height;
            if top + height > image_height {
                height = image_height - top;
            }
        }
        Ok((width, height))
    }

    /// Reads the encoded bytes of one tile
    ///
    /// A zero or out-of-range offset yields an *empty* tile, which is
    /// legal under missing-tiles-allowed writing. For JPEG images with
    /// shared JPEGTables, the tables are spliced onto the tile bytes
    /// (dropping the tables' EOI and the tile's SOI markers).
    pub fn read_encoded_tile(&mut self, ifd: &Ifd, index: TileIndex) -> TiffResult<TiffTile> {
        let (_, cols, rows) = self.validate_tile_index(ifd, index)?;
        let linear = index.linear_index(cols, rows) as usize;

        let offsets = ifd.data_offsets()?;
        let byte_counts = ifd.data_byte_counts()?;

        let (width, height) = self.effective_tile_size(ifd, index.row)?;
        let mut tile = TiffTile::new(index, width, height);

        if linear >= offsets.len() || linear >= byte_counts.len() {
            let message = format!(
                "tile {} needs positioning element {}, arrays hold {}/{}",
                index,
                linear,
                offsets.len(),
                byte_counts.len()
            );
            if self.require_valid {
                return Err(TiffError::FormatError(message));
            }
            warn!("{}; treating tile as missing", message);
            return Ok(tile);
        }

        let offset = offsets[linear];
        let mut byte_count = byte_counts[linear];

        if offset == 0 || byte_count == 0 || offset >= self.file_length {
            debug!("Tile {} is missing (offset {}, {} bytes)", index, offset, byte_count);
            return Ok(tile);
        }
        if offset + byte_count > self.file_length {
            let available = self.file_length - offset;
            warn!(
                "Tile {} declares {} bytes but only {} remain; truncating",
                index, byte_count, available
            );
            byte_count = available;
        }

        self.stream.seek(SeekFrom::Start(offset))?;
        let mut encoded = vec![0u8; byte_count as usize];
        self.stream.read_exact(&mut encoded)?;

        if ifd.compression() == Compression::Jpeg {
            if let Some(TiffValue::Undefined(tables)) = ifd.get(tags::JPEG_TABLES) {
                encoded = splice_jpeg_tables(tables, &encoded);
            }
        }

        tile.set_encoded(encoded);
        tile.mark_written(offset, byte_count);
        Ok(tile)
    }

    /// Builds the per-tile codec options for decoding
    fn codec_options(&self, ifd: &Ifd, tile: &TiffTile) -> TiffResult<CodecOptions> {
        let bits = ifd.bits_per_sample()?;
        let channels = ifd.samples_per_tile_pixel()?;
        let photometric = ifd.photometric();
        Ok(CodecOptions {
            width: tile.width(),
            height: tile.height(),
            channels,
            bits_per_sample: bits,
            interleaved: true,
            little_endian: ifd.is_little_endian(),
            signed: ifd.is_signed(),
            max_bytes: packed_tile_size(tile.width(), tile.height(), channels, bits)?,
            ycbcr: photometric == Some(Photometric::YCbCr),
            photometric_rgb: photometric == Some(Photometric::Rgb),
            quality: 90,
        })
    }

    /// Reads and decodes one tile
    ///
    /// Pipeline: codec decode, predictor reversal, fill order reversal,
    /// then optional precision widening and colour correction.
    pub fn read_tile(&mut self, ifd: &Ifd, index: TileIndex) -> TiffResult<TiffTile> {
        let mut tile = self.read_encoded_tile(ifd, index)?;
        let encoded = match tile.encoded() {
            Some(bytes) => bytes.to_vec(),
            None => return Ok(tile),
        };

        let options = self.codec_options(ifd, &tile)?;
        let compression = ifd.compression();
        let handler = self.codecs.require(compression)?;

        let tile_context = (index.plane, index.col, index.row);
        let mut decoded = handler.decompress(&encoded, &options).map_err(|e| match e {
            TiffError::CodecError {
                compression,
                detail,
                ..
            } => TiffError::CodecError {
                compression,
                tile: Some(tile_context),
                detail,
            },
            other => other,
        })?;

        let bits = ifd.bits_per_sample()?;
        let channels = ifd.samples_per_tile_pixel()?;
        let little_endian = ifd.is_little_endian();

        match ifd.predictor()? {
            PredictorKind::None => {}
            PredictorKind::Horizontal => {
                if bits % 8 != 0 {
                    return Err(TiffError::FormatError(format!(
                        "horizontal predictor with {}-bit samples",
                        bits
                    )));
                }
                transforms::unpredict_horizontal(
                    &mut decoded,
                    tile.width(),
                    channels,
                    bits / 8,
                    little_endian,
                )?;
            }
            PredictorKind::FloatingPoint => {
                transforms::unpredict_float(
                    &mut decoded,
                    tile.width(),
                    channels,
                    bits / 8,
                    little_endian,
                )?;
            }
        }

        if ifd.fill_order() == FillOrder::LsbFirst {
            transforms::reverse_fill_order(&mut decoded);
        }

        if self.auto_unpack && bits % 8 != 0 {
            decoded = transforms::unpack_bits(
                &decoded,
                bits,
                tile.width(),
                tile.height(),
                channels,
                little_endian,
            )?;
        }

        if self.auto_correct_colors {
            self.correct_colors(ifd, &mut decoded)?;
        }

        tile.set_interleaved(true);
        tile.set_decoded(decoded);
        Ok(tile)
    }

    /// Applies YCbCr→RGB or CMYK inversion to a decoded tile
    fn correct_colors(&self, ifd: &Ifd, decoded: &mut Vec<u8>) -> TiffResult<()> {
        match ifd.photometric() {
            Some(Photometric::Cmyk) => {
                transforms::invert_cmyk(decoded, ifd.bits_per_sample()?)
            }
            Some(Photometric::YCbCr) if ifd.compression() != Compression::Jpeg => {
                if let Some(value) = ifd.get(tags::YCBCR_SUBSAMPLING) {
                    let subsampling = value.as_u64s().unwrap_or_default();
                    if subsampling.iter().any(|&s| s != 1) {
                        return Err(TiffError::GenericError(format!(
                            "subsampled YCbCr ({:?}) conversion is not supported",
                            subsampling
                        )));
                    }
                }
                let luma = ifd
                    .get(tags::YCBCR_COEFFICIENTS)
                    .and_then(|v| v.as_f64s())
                    .and_then(|v| <[f64; 3]>::try_from(v.as_slice()).ok());
                let reference = ifd
                    .get(tags::REFERENCE_BLACK_WHITE)
                    .and_then(|v| v.as_f64s())
                    .and_then(|v| <[f64; 6]>::try_from(v.as_slice()).ok());
                transforms::ycbcr_to_rgb(decoded, luma, reference)
            }
            _ => Ok(()),
        }
    }

    // ---- region assembly ------------------------------------------------

    /// Reads a rectangular subregion into `out`
    ///
    /// The buffer is pre-filled with the configured filler byte, so grid
    /// cells that are missing from the file leave well-defined pixels.
    /// With auto-interleave on (the default) the output is chunky
    /// (RGBRGB…); with it off the output is separated (RRR…GGG…BBB…),
    /// regardless of how the file stores its planes.
    pub fn read_region(
        &mut self,
        ifd: &Ifd,
        from_x: u32,
        from_y: u32,
        size_x: u32,
        size_y: u32,
        out: &mut [u8],
    ) -> TiffResult<()> {
        let image_width = ifd.image_width()?;
        let image_height = ifd.image_length()?;
        if size_x == 0
            || size_y == 0
            || from_x as u64 + size_x as u64 > image_width as u64
            || from_y as u64 + size_y as u64 > image_height as u64
        {
            return Err(TiffError::RegionOutOfBounds {
                x: from_x,
                y: from_y,
                width: size_x,
                height: size_y,
                image_width,
                image_height,
            });
        }

        let required = ifd.size_of_region(size_x, size_y)?;
        if out.len() < required {
            return Err(TiffError::BufferTooSmall {
                required,
                actual: out.len(),
            });
        }

        let bits = ifd.bits_per_sample()?;
        if bits % 8 != 0 && !self.auto_unpack {
            return Err(TiffError::UnsupportedBitDepth(bits));
        }

        let bytes = ifd.bytes_per_sample()? as usize;
        let samples = ifd.samples_per_pixel() as usize;
        let tile_samples = ifd.samples_per_tile_pixel()? as usize;
        let planes = ifd.separated_plane_count()?;
        let tile_width = ifd.tile_size_x()?;
        let tile_height = ifd.tile_size_y()?;
        let planar = ifd.planar_config()? == PlanarConfig::Separate;

        out[..required].fill(self.filler);

        let min_col = from_x / tile_width;
        let max_col = (from_x + size_x - 1) / tile_width;
        let min_row = from_y / tile_height;
        let max_row = (from_y + size_y - 1) / tile_height;

        debug!(
            "Region {}x{}+{}+{}: tiles ({}..{}) x ({}..{}), {} plane(s)",
            size_x, size_y, from_x, from_y, min_col, max_col, min_row, max_row, planes
        );

        // Bytes of one destination plane block; zero-based plane 0 covers
        // the whole chunky case
        let plane_size = size_x as usize * size_y as usize * bytes;
        let pixel_bytes = tile_samples * bytes;

        for plane in 0..planes {
            for row in min_row..=max_row {
                for col in min_col..=max_col {
                    let tile = self.read_tile(ifd, TileIndex::new(plane, col, row))?;
                    let decoded = match tile.decoded() {
                        Some(data) => data,
                        None => continue,
                    };

                    let tile_x0 = col * tile_width;
                    let tile_y0 = row * tile_height;
                    let x_start = from_x.max(tile_x0);
                    let x_end = (from_x + size_x).min(tile_x0 + tile.width());
                    let y_start = from_y.max(tile_y0);
                    let y_end = (from_y + size_y).min(tile_y0 + tile.height());
                    if x_start >= x_end || y_start >= y_end {
                        continue;
                    }

                    let run = (x_end - x_start) as usize * pixel_bytes;
                    let plane_offset = plane as usize * plane_size;
                    for y in y_start..y_end {
                        let src = ((y - tile_y0) as usize * tile.width() as usize
                            + (x_start - tile_x0) as usize)
                            * pixel_bytes;
                        let dst = plane_offset
                            + ((y - from_y) as usize * size_x as usize
                                + (x_start - from_x) as usize)
                                * pixel_bytes;
                        if src + run <= decoded.len() && dst + run <= required {
                            out[dst..dst + run].copy_from_slice(&decoded[src..src + run]);
                        }
                    }
                }
            }
        }

        // Settle the caller-facing layout
        if planar && self.auto_interleave {
            let interleaved = transforms::interleave_samples(&out[..required], samples, bytes);
            out[..required].copy_from_slice(&interleaved);
        } else if !planar && !self.auto_interleave && samples > 1 {
            let separated = transforms::separate_samples(&out[..required], samples, bytes);
            out[..required].copy_from_slice(&separated);
        }

        Ok(())
    }

    /// Convenience wrapper allocating the output buffer
    pub fn read_region_vec(
        &mut self,
        ifd: &Ifd,
        from_x: u32,
        from_y: u32,
        size_x: u32,
        size_y: u32,
    ) -> TiffResult<Vec<u8>> {
        let mut out = vec![0u8; ifd.size_of_region(size_x, size_y)?];
        self.read_region(ifd, from_x, from_y, size_x, size_y, &mut out)?;
        Ok(out)
    }

    /// Reads the whole image of one directory
    pub fn read_image(&mut self, ifd: &Ifd) -> TiffResult<Vec<u8>> {
        let width = ifd.image_width()?;
        let height = ifd.image_length()?;
        self.read_region_vec(ifd, 0, 0, width, height)
    }

    /// Gives the stream back to the caller
    pub fn into_stream(self) -> S {
        self.stream
    }
}

/// Splices shared JPEGTables onto a tile's JPEG stream
///
/// The tables end with an EOI marker and the tile begins with an SOI
/// marker; one of each pair has to go: drop the tables' last two bytes
/// and the tile's first two, then concatenate.
fn splice_jpeg_tables(tables: &[u8], tile: &[u8]) -> Vec<u8> {
    if tables.len() < 2 || tile.len() < 2 {
        return tile.to_vec();
    }
    let mut spliced = Vec::with_capacity(tables.len() + tile.len() - 4);
    spliced.extend_from_slice(&tables[..tables.len() - 2]);
    spliced.extend_from_slice(&tile[2..]);
    spliced
}

/// Size in bytes of a decoded tile, honouring packed sub-byte rows
fn packed_tile_size(width: u32, height: u32, channels: u32, bits: u32) -> TiffResult<usize> {
    if bits == 0 {
        return Err(TiffError::UnsupportedBitDepth(bits));
    }
    let size = if bits % 8 == 0 {
        width as u64 * height as u64 * channels as u64 * (bits / 8) as u64
    } else {
        let row_bits = width as u64 * channels as u64 * bits as u64;
        ((row_bits + 7) / 8) * height as u64
    };
    if size > i32::MAX as u64 {
        return Err(TiffError::SizeOverflow(size));
    }
    Ok(size as usize)
}

// Keep the helper visible to the writer for appending scans
pub(crate) use self::chain_scan::find_last_offset_slot;

mod chain_scan {
    //! Locating the terminator slot of an existing IFD chain

    use super::*;

    /// Walks an existing chain and returns the position of the slot
    /// holding the final zero next-IFD offset
    pub(crate) fn find_last_offset_slot(
        stream: &mut dyn SeekableStream,
        handler: &dyn ByteOrderHandler,
        big_tiff: bool,
        first_offset_position: u64,
        file_length: u64,
    ) -> TiffResult<u64> {
        let mut slot_position = first_offset_position;
        let mut visited: HashSet<u64> = HashSet::new();

        loop {
            stream.seek(SeekFrom::Start(slot_position))?;
            let next = if big_tiff {
                handler.read_u64(stream)?
            } else {
                handler.read_u32(stream)? as u64
            };
            if next == 0 {
                return Ok(slot_position);
            }
            validation::validate_ifd_offset(next, file_length)?;
            if !visited.insert(next) {
                return Err(TiffError::FormatError(format!(
                    "IFD chain loops back to offset {}",
                    next
                )));
            }

            // Skip over the IFD table to its trailer slot
            stream.seek(SeekFrom::Start(next))?;
            let entry_count = if big_tiff {
                handler.read_u64(stream)?
            } else {
                handler.read_u16(stream)? as u64
            };
            let table = write_utils::ifd_table_size(entry_count, big_tiff);
            let trailer_size = if big_tiff { 8 } else { 4 };
            slot_position = next + table - trailer_size;
        }
    }
}
