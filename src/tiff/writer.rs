//! TIFF file writer implementation
//!
//! This module handles the write side of the tile engine: creating or
//! appending to a file, staging an image's IFD, splitting caller buffers
//! into tiles, driving the codec pipeline and emitting the directory
//! with its chain link patched atomically.
//!
//! Writing a valid TIFF requires careful management of offsets, ordering
//! and alignment. The writer tracks `position_of_last_ifd_offset`, the
//! file position of the most recent next-IFD slot, so each completed
//! image can link itself into the chain and leave a zero terminator
//! behind.

use std::collections::HashMap;
use std::io::{Seek, SeekFrom, Write};

use log::{debug, info};

use crate::compression::{CodecOptions, CodecRegistry};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::stream::{stream_length, SeekableStream};
use crate::tiff::constants::{header, tags};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::Ifd;
use crate::tiff::reader::find_last_offset_slot;
use crate::tiff::types::{
    Compression, FillOrder, Photometric, PixelType, PlanarConfig, PredictorKind,
};
use crate::tiles::{TileIndex, TileMap, TiffTile};
use crate::transforms;
use crate::utils::format_utils;
use crate::utils::write_utils;

/// Writer configuration
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Byte order of the produced file
    pub byte_order: ByteOrder,
    /// Produce BigTIFF instead of classic TIFF
    pub big_tiff: bool,
    /// Leave unwritten grid cells as (offset 0, byte count 0)
    pub missing_tiles_allowed: bool,
    /// Allow IFDs to be written ahead of their pixel data
    pub writing_forward_allowed: bool,
    /// Accept separated (channel-major) source buffers for chunky images
    pub auto_interleave: bool,
    /// Byte used to initialise empty tiles
    pub byte_filler: u8,
    /// JPEG quality in [1, 100]
    pub jpeg_quality: u8,
    /// Store JPEG images with RGB photometric instead of YCbCr
    pub jpeg_force_rgb: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            byte_order: ByteOrder::LittleEndian,
            big_tiff: false,
            missing_tiles_allowed: false,
            writing_forward_allowed: true,
            auto_interleave: true,
            byte_filler: 0,
            jpeg_quality: 90,
            jpeg_force_rgb: false,
        }
    }
}

/// Everything the encode pipeline needs to know about one image
struct EncodeParams {
    fill_order: FillOrder,
    predictor: PredictorKind,
    compression: Compression,
    photometric: Option<Photometric>,
    bits: u32,
    bytes: u32,
    tile_samples: u32,
    little_endian: bool,
    signed: bool,
    chunky: bool,
    quality: u8,
}

/// Writer for TIFF and BigTIFF files
pub struct TiffWriter<S: SeekableStream> {
    /// The underlying stream
    stream: S,
    /// Byte order handler for all multi-byte fields
    handler: Box<dyn ByteOrderHandler>,
    /// Writer configuration
    options: WriterOptions,
    /// Codec registry used for tile encoding
    codecs: CodecRegistry,
    /// Position of the most recent next-IFD slot, once a file is started
    position_of_last_ifd_offset: Option<u64>,
}

impl<S: SeekableStream> TiffWriter<S> {
    /// Creates a writer over the given stream
    pub fn new(stream: S, options: WriterOptions) -> Self {
        let handler = options.byte_order.create_handler();
        TiffWriter {
            stream,
            handler,
            options,
            codecs: CodecRegistry::default(),
            position_of_last_ifd_offset: None,
        }
    }

    /// Replaces the codec registry
    pub fn with_codecs(&mut self, codecs: CodecRegistry) -> &mut Self {
        self.codecs = codecs;
        self
    }

    /// The writer configuration
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Position of the slot holding the chain terminator
    pub fn position_of_last_ifd_offset(&self) -> Option<u64> {
        self.position_of_last_ifd_offset
    }

    // ---- file lifecycle -------------------------------------------------

    /// Writes a fresh header, beginning a new file
    ///
    /// The first-IFD offset slot is zero-filled; the first completed
    /// image patches it.
    pub fn start_new_file(&mut self) -> TiffResult<()> {
        info!(
            "Starting new {} file ({})",
            if self.options.big_tiff { "BigTIFF" } else { "TIFF" },
            self.options.byte_order.name()
        );
        self.stream.seek(SeekFrom::Start(0))?;
        self.stream.write_all(&self.options.byte_order.marker())?;

        if self.options.big_tiff {
            self.handler
                .write_u16(&mut self.stream, header::BIG_TIFF_VERSION)?;
            self.handler
                .write_u16(&mut self.stream, header::BIGTIFF_OFFSET_SIZE)?;
            self.handler.write_u16(&mut self.stream, 0)?;
            self.handler.write_u64(&mut self.stream, 0)?;
            self.position_of_last_ifd_offset = Some(header::BIGTIFF_FIRST_OFFSET_POSITION);
        } else {
            self.handler
                .write_u16(&mut self.stream, header::TIFF_VERSION)?;
            self.handler.write_u32(&mut self.stream, 0)?;
            self.position_of_last_ifd_offset = Some(header::TIFF_FIRST_OFFSET_POSITION);
        }
        Ok(())
    }

    /// Opens an existing file for appending further images
    ///
    /// Reads the header (adopting the file's byte order and format),
    /// walks the chain to the terminator slot and seeks to end-of-file.
    pub fn start_appending(&mut self) -> TiffResult<()> {
        let file_length = stream_length(&mut self.stream)?;
        if file_length < 8 {
            return Err(TiffError::NotTiff);
        }
        self.stream.seek(SeekFrom::Start(0))?;
        let byte_order = ByteOrder::detect(&mut self.stream)?;
        self.handler = byte_order.create_handler();
        self.options.byte_order = byte_order;

        let (big_tiff, _) =
            format_utils::detect_tiff_format(&mut self.stream, self.handler.as_ref())?;
        self.options.big_tiff = big_tiff;

        let first_offset_position = if big_tiff {
            header::BIGTIFF_FIRST_OFFSET_POSITION
        } else {
            header::TIFF_FIRST_OFFSET_POSITION
        };
        let slot = find_last_offset_slot(
            &mut self.stream,
            self.handler.as_ref(),
            big_tiff,
            first_offset_position,
            file_length,
        )?;
        debug!("Appending; last next-IFD slot at {}", slot);
        self.position_of_last_ifd_offset = Some(slot);
        self.stream.seek(SeekFrom::End(0))?;
        Ok(())
    }

    // ---- image staging --------------------------------------------------

    /// Stages a new image and returns its tile map
    ///
    /// Fills in the sample description tags, validates them, chooses a
    /// photometric interpretation when the caller left it open and
    /// clears any stale positioning state.
    pub fn start_new_image(
        &mut self,
        mut ifd: Ifd,
        channels: u32,
        pixel_type: PixelType,
        resizable: bool,
    ) -> TiffResult<TileMap> {
        if channels == 0 {
            return Err(TiffError::FormatError("image needs at least one channel".to_string()));
        }
        let bits = pixel_type.bits();

        // A caller-provided BitsPerSample must agree with the pixel type
        if let Some(existing) = ifd.get(tags::BITS_PER_SAMPLE).and_then(|v| v.as_u64s()) {
            if existing.iter().any(|&b| b != bits as u64) {
                return Err(TiffError::UnequalBitsPerSample(
                    existing.iter().map(|&b| b as u32).collect(),
                ));
            }
        }

        ifd.set_samples_per_pixel(channels)?;
        ifd.set_bits_per_sample(channels, bits)?;
        ifd.set_sample_format(channels, pixel_type.sample_format())?;

        if !ifd.contains(tags::COMPRESSION) {
            ifd.set_compression(Compression::None)?;
        }
        let compression = ifd.compression();
        if let Compression::Unknown(code) = compression {
            return Err(TiffError::UnsupportedCompression(code as u64));
        }
        if compression == Compression::Jpeg && (bits != 8 || pixel_type.is_signed()) {
            return Err(TiffError::UnsupportedBitDepth(bits));
        }

        if ifd.photometric().is_none() {
            let photometric = self.choose_photometric(&ifd, channels, compression)?;
            debug!("Choosing photometric {:?}", photometric);
            ifd.set_photometric(photometric)?;
        }

        // Stale positioning arrays from a copied directory would lie
        for tag in [
            tags::STRIP_OFFSETS,
            tags::STRIP_BYTE_COUNTS,
            tags::TILE_OFFSETS,
            tags::TILE_BYTE_COUNTS,
        ] {
            ifd.remove(tag)?;
        }
        ifd.clear_next_ifd_offset();

        // A stripped image without RowsPerStrip is written as one strip
        if !ifd.is_tiled() && !resizable && !ifd.contains(tags::ROWS_PER_STRIP) {
            let height = ifd.image_length()?;
            ifd.set_rows_per_strip(height)?;
        }

        ifd.set_format_flags(
            self.options.byte_order.is_little_endian(),
            self.options.big_tiff,
        );

        TileMap::new(ifd, resizable)
    }

    /// Photometric selection for images that did not predefine one
    fn choose_photometric(
        &self,
        ifd: &Ifd,
        channels: u32,
        compression: Compression,
    ) -> TiffResult<Photometric> {
        if ifd.contains(tags::COLOR_MAP) && channels == 1 {
            return Ok(Photometric::Palette);
        }
        if channels == 1 {
            return Ok(Photometric::BlackIsZero);
        }
        if compression == Compression::Jpeg
            && ifd.planar_config()? == PlanarConfig::Chunky
            && !self.options.jpeg_force_rgb
        {
            return Ok(Photometric::YCbCr);
        }
        Ok(Photometric::Rgb)
    }

    // ---- forward IFD ----------------------------------------------------

    /// Writes the IFD now, ahead of its pixel data
    ///
    /// Positioning arrays are zero-filled placeholders of their final
    /// size; `complete_image` rewrites the directory in place once the
    /// tiles are flushed. Readers of the finished file then find the
    /// header before the pixel data. Only non-resizable maps know their
    /// grid size early enough for this.
    pub fn write_forward(&mut self, map: &mut TileMap) -> TiffResult<()> {
        if !self.options.writing_forward_allowed {
            return Err(TiffError::GenericError(
                "forward IFD writing is disabled".to_string(),
            ));
        }
        if map.is_resizable() {
            return Err(TiffError::GenericError(
                "a resizable map cannot write its IFD forward".to_string(),
            ));
        }
        let cells = map.number_of_grid_tiles() as usize;
        let zeros = vec![0u64; cells];
        map.ifd_mut().update_data_positioning(&zeros, &zeros)?;

        self.stream.seek(SeekFrom::End(0))?;
        let offset = write_utils::pad_to_even(&mut self.stream)?;
        self.serialize_ifd(map.ifd(), offset)?;
        map.ifd_mut().set_file_offset_for_writing(offset)?;
        debug!("Forward IFD written at {}", offset);
        Ok(())
    }

    // ---- tile updates ---------------------------------------------------

    /// Copies a rectangular region of source pixels into the tile grid
    ///
    /// Three source layouts are handled:
    /// - planar-separated images always take separated source buffers;
    /// - chunky images with auto-interleave on (the default) take
    ///   separated buffers too, and tiles keep separated planes until
    ///   the encode step interleaves them;
    /// - chunky images with auto-interleave off take interleaved
    ///   buffers copied row by row.
    pub fn update_tiles(
        &mut self,
        map: &mut TileMap,
        src: &[u8],
        from_x: u32,
        from_y: u32,
        size_x: u32,
        size_y: u32,
    ) -> TiffResult<()> {
        if size_x == 0 || size_y == 0 {
            return Ok(());
        }
        let samples = map.samples_per_pixel() as usize;
        let bytes = map.bytes_per_sample() as usize;
        let required = size_x as usize * size_y as usize * samples * bytes;
        if src.len() < required {
            return Err(TiffError::BufferTooSmall {
                required,
                actual: src.len(),
            });
        }

        if map.is_resizable() {
            map.expand_to(from_x + size_x, from_y + size_y)?;
        } else if from_x as u64 + size_x as u64 > map.dim_x() as u64
            || from_y as u64 + size_y as u64 > map.dim_y() as u64
        {
            return Err(TiffError::RegionOutOfBounds {
                x: from_x,
                y: from_y,
                width: size_x,
                height: size_y,
                image_width: map.dim_x(),
                image_height: map.dim_y(),
            });
        }

        let planar = map.planes() > 1;
        let tile_width = map.tile_width();
        let tile_height = map.tile_height();
        let byte_filler = self.options.byte_filler;
        let auto_interleave = self.options.auto_interleave;

        let min_col = from_x / tile_width;
        let max_col = (from_x + size_x - 1) / tile_width;
        let min_row = from_y / tile_height;
        let max_row = (from_y + size_y - 1) / tile_height;

        let planes = if planar { map.planes() } else { 1 };
        let src_plane_size = size_x as usize * size_y as usize * bytes;

        for plane in 0..planes {
            for row in min_row..=max_row {
                for col in min_col..=max_col {
                    let tile_x0 = col * tile_width;
                    let tile_y0 = row * tile_height;

                    let buffer_size;
                    let tile_w;
                    let tile_h;
                    {
                        let tile = map.get_or_new(TileIndex::new(plane, col, row))?;
                        tile_w = tile.width();
                        tile_h = tile.height();
                        buffer_size = tile_w as usize
                            * tile_h as usize
                            * (if planar { 1 } else { samples })
                            * bytes;
                    }

                    let x_start = from_x.max(tile_x0);
                    let x_end = (from_x + size_x).min(tile_x0 + tile_w);
                    let y_start = from_y.max(tile_y0);
                    let y_end = (from_y + size_y).min(tile_y0 + tile_h);
                    if x_start >= x_end || y_start >= y_end {
                        continue;
                    }

                    let tile = map.get_or_new(TileIndex::new(plane, col, row))?;
                    tile.set_interleaved(!planar && !auto_interleave);
                    let decoded = tile.ensure_decoded(buffer_size, byte_filler);

                    if planar {
                        // One channel per tile; source offsets add the
                        // plane block
                        let src_base = plane as usize * src_plane_size;
                        for y in y_start..y_end {
                            let run = (x_end - x_start) as usize * bytes;
                            let src_at = src_base
                                + ((y - from_y) as usize * size_x as usize
                                    + (x_start - from_x) as usize)
                                    * bytes;
                            let dst_at = ((y - tile_y0) as usize * tile_w as usize
                                + (x_start - tile_x0) as usize)
                                * bytes;
                            decoded[dst_at..dst_at + run]
                                .copy_from_slice(&src[src_at..src_at + run]);
                        }
                    } else if auto_interleave {
                        // Separated source into separated tile planes;
                        // the encode step interleaves later
                        let tile_plane_size = tile_w as usize * tile_h as usize * bytes;
                        for channel in 0..samples {
                            let src_base = channel * src_plane_size;
                            let dst_base = channel * tile_plane_size;
                            for y in y_start..y_end {
                                let run = (x_end - x_start) as usize * bytes;
                                let src_at = src_base
                                    + ((y - from_y) as usize * size_x as usize
                                        + (x_start - from_x) as usize)
                                        * bytes;
                                let dst_at = dst_base
                                    + ((y - tile_y0) as usize * tile_w as usize
                                        + (x_start - tile_x0) as usize)
                                        * bytes;
                                decoded[dst_at..dst_at + run]
                                    .copy_from_slice(&src[src_at..src_at + run]);
                            }
                        }
                    } else {
                        // Interleaved source straight into interleaved
                        // tile rows
                        let pixel_bytes = samples * bytes;
                        for y in y_start..y_end {
                            let run = (x_end - x_start) as usize * pixel_bytes;
                            let src_at = ((y - from_y) as usize * size_x as usize
                                + (x_start - from_x) as usize)
                                * pixel_bytes;
                            let dst_at = ((y - tile_y0) as usize * tile_w as usize
                                + (x_start - tile_x0) as usize)
                                * pixel_bytes;
                            decoded[dst_at..dst_at + run]
                                .copy_from_slice(&src[src_at..src_at + run]);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    // ---- encoding -------------------------------------------------------

    fn encode_params(&self, map: &TileMap) -> TiffResult<EncodeParams> {
        let ifd = map.ifd();
        Ok(EncodeParams {
            fill_order: ifd.fill_order(),
            predictor: ifd.predictor()?,
            compression: ifd.compression(),
            photometric: ifd.photometric(),
            bits: ifd.bits_per_sample()?,
            bytes: ifd.bytes_per_sample()?,
            tile_samples: map.tile_samples(),
            little_endian: ifd.is_little_endian(),
            signed: ifd.is_signed(),
            chunky: map.planes() == 1,
            quality: self.options.jpeg_quality,
        })
    }

    /// Runs one tile through the encode pipeline
    ///
    /// Order: fill order inversion, interleave, predictor differencing,
    /// codec compression.
    fn encode_one(&self, params: &EncodeParams, tile: &mut TiffTile) -> TiffResult<()> {
        if tile.has_encoded() || !tile.has_decoded() {
            return Ok(());
        }

        if params.fill_order == FillOrder::LsbFirst {
            if let Some(decoded) = tile.decoded_mut() {
                transforms::reverse_fill_order(decoded);
            }
        }

        if params.chunky && params.tile_samples > 1 && !tile.is_interleaved() {
            let interleaved = transforms::interleave_samples(
                tile.decoded().unwrap(),
                params.tile_samples as usize,
                params.bytes as usize,
            );
            tile.set_decoded(interleaved);
            tile.set_interleaved(true);
        }

        let width = tile.width();
        match params.predictor {
            PredictorKind::None => {}
            PredictorKind::Horizontal => {
                if params.bits % 8 != 0 {
                    return Err(TiffError::FormatError(format!(
                        "horizontal predictor with {}-bit samples",
                        params.bits
                    )));
                }
                transforms::predict_horizontal(
                    tile.decoded_mut().unwrap(),
                    width,
                    params.tile_samples,
                    params.bytes,
                    params.little_endian,
                )?;
            }
            PredictorKind::FloatingPoint => {
                transforms::predict_float(
                    tile.decoded_mut().unwrap(),
                    width,
                    params.tile_samples,
                    params.bytes,
                    params.little_endian,
                )?;
            }
        }

        let options = CodecOptions {
            width: tile.width(),
            height: tile.height(),
            channels: params.tile_samples,
            bits_per_sample: params.bits,
            interleaved: true,
            little_endian: params.little_endian,
            signed: params.signed,
            max_bytes: tile.decoded().map(|d| d.len()).unwrap_or(0),
            ycbcr: params.photometric == Some(Photometric::YCbCr),
            photometric_rgb: params.compression == Compression::Jpeg
                && params.photometric == Some(Photometric::Rgb),
            quality: params.quality,
        };

        // Unknown compression is always fatal on the write path
        let handler = self.codecs.require(params.compression)?;
        let index = tile.index();
        let encoded = handler
            .compress(tile.decoded().unwrap(), &options)
            .map_err(|e| match e {
                TiffError::CodecError {
                    compression,
                    detail,
                    ..
                } => TiffError::CodecError {
                    compression,
                    tile: Some((index.plane, index.col, index.row)),
                    detail,
                },
                other => other,
            })?;
        tile.set_encoded(encoded);
        Ok(())
    }

    /// Encodes every tile that has decoded data but no encoded bytes yet
    ///
    /// This step never touches the stream, so a caller who wants to
    /// parallelise CPU-bound compression can drive tiles through codecs
    /// itself before handing the map to `complete_image`.
    pub fn encode(&mut self, map: &mut TileMap) -> TiffResult<()> {
        let params = self.encode_params(map)?;
        let mut encoded = 0usize;
        for tile in map.tiles_mut() {
            if !tile.has_encoded() && tile.has_decoded() {
                self.encode_one(&params, tile)?;
                encoded += 1;
            }
        }
        debug!("Encoded {} tile(s)", encoded);
        Ok(())
    }

    // ---- completion -----------------------------------------------------

    /// Flushes the image: writes tiles, patches positioning, emits the
    /// IFD and links it into the chain
    ///
    /// Grid cells that never received data become `(0, 0)` entries when
    /// missing tiles are allowed; otherwise one shared filler tile is
    /// encoded per cell size and every empty cell references that blob.
    /// The IFD lands at its reserved offset when `write_forward` was
    /// used, at (even-aligned) end-of-file otherwise; the previous
    /// next-IFD slot is patched to point here and this directory's own
    /// slot becomes the new zero terminator.
    pub fn complete_image(&mut self, map: &mut TileMap) -> TiffResult<()> {
        let link_slot = self.position_of_last_ifd_offset.ok_or_else(|| {
            TiffError::GenericError(
                "start_new_file or start_appending must run before completing images".to_string(),
            )
        })?;

        if map.is_resizable() {
            let (width, height) = map.complete_image_grid();
            if width == 0 || height == 0 {
                return Err(TiffError::FormatError(
                    "resizable image completed without any tile updates".to_string(),
                ));
            }
            map.ifd_mut().update_image_dimensions(width, height)?;
        }
        map.crop_all(true);
        self.encode(map)?;

        let params = self.encode_params(map)?;
        let grid = map.grid_indices();
        let cells = grid.len();
        let mut offsets = vec![0u64; cells];
        let mut byte_counts = vec![0u64; cells];

        // Shared filler blobs, keyed by decoded size
        let mut filler_blobs: HashMap<usize, (u64, u64)> = HashMap::new();

        self.stream.seek(SeekFrom::End(0))?;

        for (cell, index) in grid.iter().enumerate() {
            let has_data = map.get(*index).map(|t| t.has_encoded()).unwrap_or(false);
            if has_data {
                let position = write_utils::pad_to_even(&mut self.stream)?;
                let tile = map.get_mut(*index).unwrap();
                let encoded = tile.encoded().unwrap().to_vec();
                self.stream.write_all(&encoded)?;
                tile.mark_written(position, encoded.len() as u64);
                tile.free_decoded();
                offsets[cell] = position;
                byte_counts[cell] = encoded.len() as u64;
                continue;
            }

            if self.options.missing_tiles_allowed {
                offsets[cell] = 0;
                byte_counts[cell] = 0;
                continue;
            }

            // Encode one filler tile per distinct size and share it
            let height = map.effective_tile_height(index.row);
            let size = map.tile_width() as usize
                * height as usize
                * map.tile_samples() as usize
                * map.bytes_per_sample() as usize;
            let (offset, byte_count) = match filler_blobs.get(&size).copied() {
                Some(blob) => blob,
                None => {
                    let mut filler_tile = TiffTile::new(*index, map.tile_width(), height);
                    filler_tile.set_decoded(vec![self.options.byte_filler; size]);
                    filler_tile.set_interleaved(true);
                    self.encode_one(&params, &mut filler_tile)?;
                    let encoded = filler_tile.encoded().unwrap();
                    let position = write_utils::pad_to_even(&mut self.stream)?;
                    self.stream.write_all(encoded)?;
                    let blob = (position, encoded.len() as u64);
                    filler_blobs.insert(size, blob);
                    debug!(
                        "Filler tile of {} decoded bytes stored at {} ({} bytes)",
                        size, blob.0, blob.1
                    );
                    blob
                }
            };
            offsets[cell] = offset;
            byte_counts[cell] = byte_count;
        }

        map.ifd_mut().update_data_positioning(&offsets, &byte_counts)?;
        map.ifd_mut().freeze_for_writing();

        // Emit the IFD at its reserved spot or append it
        let ifd_offset = match map.ifd().file_offset_for_writing() {
            Some(reserved) => {
                self.serialize_ifd(map.ifd(), reserved)?;
                reserved
            }
            None => {
                self.stream.seek(SeekFrom::End(0))?;
                let offset = write_utils::pad_to_even(&mut self.stream)?;
                self.serialize_ifd(map.ifd(), offset)?;
                map.ifd_mut().set_file_offset_for_writing(offset)?;
                offset
            }
        };

        // Link the chain: the previous terminator now points here...
        self.stream.seek(SeekFrom::Start(link_slot))?;
        if self.options.big_tiff {
            self.handler.write_u64(&mut self.stream, ifd_offset)?;
        } else {
            let narrow = u32::try_from(ifd_offset).map_err(|_| {
                TiffError::FormatError(format!(
                    "IFD offset {} does not fit in a classic TIFF LONG",
                    ifd_offset
                ))
            })?;
            self.handler.write_u32(&mut self.stream, narrow)?;
        }

        // ...and this directory's own trailer is the new terminator
        let table = write_utils::ifd_table_size(map.ifd().entry_count() as u64, self.options.big_tiff);
        let trailer = if self.options.big_tiff { 8 } else { 4 };
        self.position_of_last_ifd_offset = Some(ifd_offset + table - trailer);

        info!(
            "Image completed: IFD at {}, {} grid cell(s)",
            ifd_offset, cells
        );
        Ok(())
    }

    // ---- IFD serialisation ----------------------------------------------

    /// Serialises an IFD at the given even offset
    ///
    /// Entries are written in ascending tag order. Payloads that fit the
    /// inline slot are zero-padded in place; larger payloads land in the
    /// value area directly after the table, each starting even. The
    /// next-IFD trailer is written as zero.
    fn serialize_ifd(&mut self, ifd: &Ifd, at_offset: u64) -> TiffResult<()> {
        if at_offset % 2 != 0 {
            return Err(TiffError::OddOffset(at_offset));
        }
        let big_tiff = self.options.big_tiff;
        let inline_size = write_utils::inline_size(big_tiff) as usize;
        let entry_count = ifd.entry_count() as u64;
        let table_size = write_utils::ifd_table_size(entry_count, big_tiff);

        // First pass: serialise payloads and allocate the value area
        let mut external_at = at_offset + table_size;
        let mut rendered: Vec<(u16, u16, u64, Vec<u8>, Option<u64>)> =
            Vec::with_capacity(ifd.entry_count());
        for (&tag, value) in ifd.iter() {
            let on_disk_type = value.on_disk_field_type(tag, big_tiff);
            let payload = value.serialize_payload(tag, big_tiff, self.handler.as_ref())?;
            let count = value.count();
            if !big_tiff && count > u32::MAX as u64 {
                return Err(TiffError::FormatError(format!(
                    "tag {} count {} does not fit in a classic TIFF entry",
                    tag, count
                )));
            }
            let external = if payload.len() <= inline_size {
                None
            } else {
                let position = write_utils::align_to_even(external_at);
                external_at = position + payload.len() as u64;
                Some(position)
            };
            rendered.push((tag, on_disk_type.code(), count, payload, external));
        }

        // Second pass: emit the table
        let mut table: Vec<u8> = Vec::with_capacity(table_size as usize);
        if big_tiff {
            self.handler.write_u64(&mut table, entry_count)?;
        } else {
            self.handler.write_u16(&mut table, entry_count as u16)?;
        }
        for (tag, type_code, count, payload, external) in &rendered {
            self.handler.write_u16(&mut table, *tag)?;
            self.handler.write_u16(&mut table, *type_code)?;
            if big_tiff {
                self.handler.write_u64(&mut table, *count)?;
            } else {
                self.handler.write_u32(&mut table, *count as u32)?;
            }
            match external {
                Some(position) => {
                    if big_tiff {
                        self.handler.write_u64(&mut table, *position)?;
                    } else {
                        let narrow = u32::try_from(*position).map_err(|_| {
                            TiffError::FormatError(format!(
                                "value offset {} does not fit in a classic TIFF LONG",
                                position
                            ))
                        })?;
                        self.handler.write_u32(&mut table, narrow)?;
                    }
                }
                None => {
                    let mut slot = payload.clone();
                    slot.resize(inline_size, 0);
                    table.extend_from_slice(&slot);
                }
            }
        }
        // Zero next-IFD trailer; completing the next image patches it
        if big_tiff {
            self.handler.write_u64(&mut table, 0)?;
        } else {
            self.handler.write_u32(&mut table, 0)?;
        }

        self.stream.seek(SeekFrom::Start(at_offset))?;
        self.stream.write_all(&table)?;

        // Third pass: external payloads, each even-aligned
        for (_, _, _, payload, external) in &rendered {
            if let Some(position) = external {
                self.stream.seek(SeekFrom::Start(*position))?;
                self.stream.write_all(payload)?;
                write_utils::write_even_padding(&mut self.stream, payload.len())?;
            }
        }
        Ok(())
    }

    /// Flushes buffered writes to the underlying stream
    pub fn flush(&mut self) -> TiffResult<()> {
        self.stream.flush()?;
        Ok(())
    }

    /// Gives the stream back to the caller
    pub fn into_stream(mut self) -> TiffResult<S> {
        self.stream.flush()?;
        Ok(self.stream)
    }
}
