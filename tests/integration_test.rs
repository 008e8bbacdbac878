//! Integration tests for the tilekit library
//!
//! End-to-end write → reopen → read cycles over in-memory streams,
//! covering the round-trip laws, the chain/offset invariants and the
//! boundary layouts.

use std::io::Cursor;

use tilekit::tiff::constants::{field_types, tags};
use tilekit::tiff::value::TiffValue;
use tilekit::{
    Compression, Ifd, PixelType, PlanarConfig, PredictorKind, TiffReader, TiffWriter, TileIndex,
    WriterOptions,
};
use tilekit::io::ByteOrder;

/// Deterministic pixel pattern
fn pattern(len: usize, seed: u32) -> Vec<u8> {
    (0..len)
        .map(|i| ((i as u32).wrapping_mul(31).wrapping_add(seed.wrapping_mul(17) + 7) & 0xFF) as u8)
        .collect()
}

/// Writes one complete image into a fresh in-memory file
fn write_single_image(
    options: WriterOptions,
    ifd: Ifd,
    channels: u32,
    pixel_type: PixelType,
    data: &[u8],
    width: u32,
    height: u32,
) -> Vec<u8> {
    let mut writer = TiffWriter::new(Cursor::new(Vec::new()), options);
    writer.start_new_file().unwrap();
    let mut map = writer
        .start_new_image(ifd, channels, pixel_type, false)
        .unwrap();
    writer
        .update_tiles(&mut map, data, 0, 0, width, height)
        .unwrap();
    writer.encode(&mut map).unwrap();
    writer.complete_image(&mut map).unwrap();
    writer.into_stream().unwrap().into_inner()
}

fn gray_ifd(width: u32, height: u32) -> Ifd {
    let mut ifd = Ifd::new();
    ifd.set_image_dimensions(width, height).unwrap();
    ifd
}

#[test]
fn test_grayscale_4x3_round_trip() {
    // Write an uncompressed 4x3 uint8 grayscale image, reopen, read the
    // whole image back byte-identically
    let data: Vec<u8> = (0u8..12).collect();
    let bytes = write_single_image(
        WriterOptions::default(),
        gray_ifd(4, 3),
        1,
        PixelType::Uint8,
        &data,
        4,
        3,
    );

    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    let ifds = reader.all_ifds().unwrap();
    assert_eq!(ifds.len(), 1);
    assert_eq!(ifds[0].image_width().unwrap(), 4);
    assert_eq!(ifds[0].image_length().unwrap(), 3);
    assert_eq!(reader.read_image(&ifds[0]).unwrap(), data);
}

#[test]
fn test_rgb_tiled_deflate_keeps_separated_order() {
    // 16x16 RGB chunky, 8x8 tiles, Deflate; the writer takes separated
    // input and a reader with auto-interleave off hands the same
    // separated order back
    let data = pattern(16 * 16 * 3, 2);
    let mut ifd = gray_ifd(16, 16);
    ifd.set_tile_size(8, 8).unwrap();
    ifd.set_compression(Compression::Deflate).unwrap();

    let bytes = write_single_image(
        WriterOptions::default(),
        ifd,
        3,
        PixelType::Uint8,
        &data,
        16,
        16,
    );

    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    reader.set_auto_interleave(false);
    let ifds = reader.all_ifds().unwrap();

    // Grid invariant: offsets and byte counts cover the full 2x2 grid
    assert_eq!(ifds[0].data_offsets().unwrap().len(), 4);
    assert_eq!(ifds[0].data_byte_counts().unwrap().len(), 4);

    assert_eq!(reader.read_image(&ifds[0]).unwrap(), data);
}

#[test]
fn test_two_images_written_sequentially() {
    let first = pattern(16, 3);
    let second = pattern(4, 4);

    let mut writer = TiffWriter::new(Cursor::new(Vec::new()), WriterOptions::default());
    writer.start_new_file().unwrap();

    let mut map1 = writer
        .start_new_image(gray_ifd(4, 4), 1, PixelType::Uint8, false)
        .unwrap();
    writer.update_tiles(&mut map1, &first, 0, 0, 4, 4).unwrap();
    writer.complete_image(&mut map1).unwrap();

    let mut map2 = writer
        .start_new_image(gray_ifd(2, 2), 1, PixelType::Uint8, false)
        .unwrap();
    writer.update_tiles(&mut map2, &second, 0, 0, 2, 2).unwrap();
    writer.complete_image(&mut map2).unwrap();

    let bytes = writer.into_stream().unwrap().into_inner();
    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    let ifds = reader.all_ifds().unwrap();
    assert_eq!(ifds.len(), 2);

    // The second directory sits past the end of the first image's data
    let first_data_end =
        ifds[0].data_offsets().unwrap()[0] + ifds[0].data_byte_counts().unwrap()[0];
    assert!(ifds[1].offset_of_origin().unwrap() > first_data_end);

    // Chain invariants: even IFD offsets, zero terminator on the last
    for ifd in &ifds {
        assert_eq!(ifd.offset_of_origin().unwrap() % 2, 0);
    }
    assert_eq!(ifds[1].next_ifd_offset(), Some(0));

    assert_eq!(reader.read_image(&ifds[0]).unwrap(), first);
    assert_eq!(reader.read_image(&ifds[1]).unwrap(), second);
}

#[test]
fn test_bigtiff_well_known_size_tag_stays_long() {
    // A BigTIFF ImageWidth of 100 000 fits 32 bits and must serialise
    // as LONG; arbitrary single LONGs widen to LONG8
    let data = pattern(100_000, 5);
    let mut ifd = gray_ifd(100_000, 1);
    ifd.set(40001, TiffValue::long(7)).unwrap();

    let options = WriterOptions {
        big_tiff: true,
        ..WriterOptions::default()
    };
    let bytes = write_single_image(options, ifd, 1, PixelType::Uint8, &data, 100_000, 1);

    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    assert!(reader.is_big_tiff());
    let ifds = reader.all_ifds().unwrap();

    let width_entry = ifds[0].raw_entry(tags::IMAGE_WIDTH).unwrap();
    assert_eq!(width_entry.field_type, field_types::LONG);
    assert_eq!(width_entry.count, 1);
    assert_eq!(ifds[0].image_width().unwrap(), 100_000);

    let custom_entry = ifds[0].raw_entry(40001).unwrap();
    assert_eq!(custom_entry.field_type, field_types::LONG8);

    assert_eq!(reader.read_image(&ifds[0]).unwrap(), data);
}

#[test]
fn test_round_trip_matrix() {
    // Lossless round trips across pixel types, photometrics and codecs;
    // 13x7 with 3-row strips leaves a short final strip
    let pixel_types = [
        PixelType::Uint8,
        PixelType::Uint16,
        PixelType::Int16,
        PixelType::Uint32,
        PixelType::Float32,
    ];
    let compressions = [
        Compression::None,
        Compression::Lzw,
        Compression::Deflate,
        Compression::PackBits,
    ];

    for (case, &pixel_type) in pixel_types.iter().enumerate() {
        for &channels in &[1u32, 3] {
            for &compression in &compressions {
                let size = 13 * 7 * channels as usize * pixel_type.bytes() as usize;
                let data = pattern(size, case as u32 + channels);

                let mut ifd = gray_ifd(13, 7);
                ifd.set_rows_per_strip(3).unwrap();
                ifd.set_compression(compression).unwrap();

                let bytes = write_single_image(
                    WriterOptions::default(),
                    ifd,
                    channels,
                    pixel_type,
                    &data,
                    13,
                    7,
                );

                let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
                reader.set_auto_interleave(false);
                let ifds = reader.all_ifds().unwrap();

                // Three strips, the last one short
                let counts = ifds[0].data_byte_counts().unwrap();
                assert_eq!(counts.len(), 3);
                if compression == Compression::None {
                    let row = 13 * channels as usize * pixel_type.bytes() as usize;
                    assert_eq!(counts[2], row as u64);
                }

                let read_back = reader.read_image(&ifds[0]).unwrap();
                assert_eq!(
                    read_back, data,
                    "mismatch for {:?}/{} channels/{:?}",
                    pixel_type, channels, compression
                );
            }
        }
    }
}

#[test]
fn test_subregion_matches_whole_image() {
    let data = pattern(16 * 16 * 3, 9);
    let mut ifd = gray_ifd(16, 16);
    ifd.set_rows_per_strip(5).unwrap();

    let bytes = write_single_image(
        WriterOptions::default(),
        ifd,
        3,
        PixelType::Uint8,
        &data,
        16,
        16,
    );

    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    let ifds = reader.all_ifds().unwrap();
    let whole = reader.read_image(&ifds[0]).unwrap();

    for &(x, y, w, h) in &[(0u32, 0u32, 16u32, 16u32), (3, 2, 7, 9), (15, 15, 1, 1), (0, 13, 16, 3)] {
        let region = reader.read_region_vec(&ifds[0], x, y, w, h).unwrap();
        for row in 0..h {
            let region_at = (row * w) as usize * 3;
            let whole_at = (((y + row) * 16) + x) as usize * 3;
            assert_eq!(
                &region[region_at..region_at + w as usize * 3],
                &whole[whole_at..whole_at + w as usize * 3],
                "row {} of region {}x{}+{}+{}",
                row,
                w,
                h,
                x,
                y
            );
        }
    }
}

#[test]
fn test_planar_separate_three_channels() {
    let data = pattern(8 * 6 * 3, 11);
    let mut ifd = gray_ifd(8, 6);
    ifd.set_planar_config(PlanarConfig::Separate).unwrap();
    ifd.set_rows_per_strip(4).unwrap();

    let bytes = write_single_image(
        WriterOptions::default(),
        ifd,
        3,
        PixelType::Uint8,
        &data,
        8,
        6,
    );

    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    reader.set_auto_interleave(false);
    let ifds = reader.all_ifds().unwrap();

    // Tiles are indexed (plane · tilesPerColumn + row, col): two strip
    // rows per plane, three planes
    assert_eq!(ifds[0].data_offsets().unwrap().len(), 6);
    assert_eq!(ifds[0].separated_plane_count().unwrap(), 3);

    assert_eq!(reader.read_image(&ifds[0]).unwrap(), data);

    // Interleaved delivery works off the same file
    let mut chunky_reader =
        TiffReader::open(Cursor::new(write_single_image(
            WriterOptions::default(),
            {
                let mut ifd = gray_ifd(8, 6);
                ifd.set_planar_config(PlanarConfig::Separate).unwrap();
                ifd.set_rows_per_strip(4).unwrap();
                ifd
            },
            3,
            PixelType::Uint8,
            &data,
            8,
            6,
        )), true)
        .unwrap();
    let chunky_ifds = chunky_reader.all_ifds().unwrap();
    let chunky = chunky_reader.read_image(&chunky_ifds[0]).unwrap();
    let plane = 8 * 6;
    for pixel in 0..plane {
        for channel in 0..3 {
            assert_eq!(chunky[pixel * 3 + channel], data[channel * plane + pixel]);
        }
    }
}

#[test]
fn test_empty_cells_share_one_filler_tile() {
    let tile = pattern(8 * 8, 13);
    let mut writer = TiffWriter::new(
        Cursor::new(Vec::new()),
        WriterOptions {
            byte_filler: 5,
            ..WriterOptions::default()
        },
    );
    writer.start_new_file().unwrap();

    let mut ifd = gray_ifd(16, 16);
    ifd.set_tile_size(8, 8).unwrap();
    let mut map = writer
        .start_new_image(ifd, 1, PixelType::Uint8, false)
        .unwrap();
    writer.update_tiles(&mut map, &tile, 0, 0, 8, 8).unwrap();
    writer.complete_image(&mut map).unwrap();

    let bytes = writer.into_stream().unwrap().into_inner();
    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    let ifds = reader.all_ifds().unwrap();

    // One real tile, three references to a single shared filler blob
    let offsets = ifds[0].data_offsets().unwrap();
    let counts = ifds[0].data_byte_counts().unwrap();
    assert_eq!(offsets.len(), 4);
    assert!(offsets[1] != 0);
    assert_eq!(offsets[1], offsets[2]);
    assert_eq!(offsets[2], offsets[3]);
    assert_eq!(counts[1], counts[2]);
    assert_eq!(counts[2], counts[3]);

    let pixels = reader.read_image(&ifds[0]).unwrap();
    assert_eq!(pixels[0..8], tile[0..8]);
    // A pixel from an empty cell carries the writer's filler byte
    assert_eq!(pixels[(0 * 16 + 12) as usize], 5);
    assert_eq!(pixels[(12 * 16 + 12) as usize], 5);
}

#[test]
fn test_missing_tiles_allowed_writes_zero_cells() {
    let tile = pattern(8 * 8, 14);
    let mut writer = TiffWriter::new(
        Cursor::new(Vec::new()),
        WriterOptions {
            missing_tiles_allowed: true,
            ..WriterOptions::default()
        },
    );
    writer.start_new_file().unwrap();

    let mut ifd = gray_ifd(16, 16);
    ifd.set_tile_size(8, 8).unwrap();
    let mut map = writer
        .start_new_image(ifd, 1, PixelType::Uint8, false)
        .unwrap();
    writer.update_tiles(&mut map, &tile, 0, 0, 8, 8).unwrap();
    writer.complete_image(&mut map).unwrap();

    let bytes = writer.into_stream().unwrap().into_inner();
    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    reader.set_filler(0xEE);
    let ifds = reader.all_ifds().unwrap();

    let offsets = ifds[0].data_offsets().unwrap();
    assert_eq!(&offsets[1..], &[0, 0, 0]);

    // Missing cells keep the reader's filler
    let pixels = reader.read_image(&ifds[0]).unwrap();
    assert_eq!(pixels[12], 0xEE);
    assert_eq!(pixels[0..8], tile[0..8]);
}

#[test]
fn test_tile_larger_than_image_keeps_nominal_size() {
    // A 1x1 image in a 16x16 tile grid: the stored tile keeps its
    // nominal dimensions for libtiff compatibility
    let mut ifd = gray_ifd(1, 1);
    ifd.set_tile_size(16, 16).unwrap();
    let bytes = write_single_image(
        WriterOptions::default(),
        ifd,
        1,
        PixelType::Uint8,
        &[42],
        1,
        1,
    );

    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    let ifds = reader.all_ifds().unwrap();
    assert_eq!(ifds[0].data_byte_counts().unwrap(), vec![256]);
    assert_eq!(reader.read_image(&ifds[0]).unwrap(), vec![42]);
}

#[test]
fn test_appending_to_an_existing_file() {
    let first = pattern(6 * 4, 21);
    let bytes = write_single_image(
        WriterOptions::default(),
        gray_ifd(6, 4),
        1,
        PixelType::Uint8,
        &first,
        6,
        4,
    );

    // Reopen the finished file and append a second image
    let second = pattern(3 * 3, 22);
    let mut writer = TiffWriter::new(Cursor::new(bytes), WriterOptions::default());
    writer.start_appending().unwrap();
    let mut map = writer
        .start_new_image(gray_ifd(3, 3), 1, PixelType::Uint8, false)
        .unwrap();
    writer.update_tiles(&mut map, &second, 0, 0, 3, 3).unwrap();
    writer.complete_image(&mut map).unwrap();

    let bytes = writer.into_stream().unwrap().into_inner();
    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    let ifds = reader.all_ifds().unwrap();
    assert_eq!(ifds.len(), 2);
    assert_eq!(reader.read_image(&ifds[0]).unwrap(), first);
    assert_eq!(reader.read_image(&ifds[1]).unwrap(), second);
    assert_eq!(ifds[1].next_ifd_offset(), Some(0));
}

#[test]
fn test_write_forward_puts_header_before_pixel_data() {
    let data = pattern(8 * 8, 31);
    let mut writer = TiffWriter::new(Cursor::new(Vec::new()), WriterOptions::default());
    writer.start_new_file().unwrap();

    let mut ifd = gray_ifd(8, 8);
    ifd.set_rows_per_strip(8).unwrap();
    let mut map = writer
        .start_new_image(ifd, 1, PixelType::Uint8, false)
        .unwrap();
    writer.write_forward(&mut map).unwrap();
    writer.update_tiles(&mut map, &data, 0, 0, 8, 8).unwrap();
    writer.encode(&mut map).unwrap();
    writer.complete_image(&mut map).unwrap();

    let bytes = writer.into_stream().unwrap().into_inner();
    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    let ifds = reader.all_ifds().unwrap();

    // The directory precedes its pixel data in the file
    assert!(ifds[0].offset_of_origin().unwrap() < ifds[0].data_offsets().unwrap()[0]);
    assert_eq!(reader.read_image(&ifds[0]).unwrap(), data);
}

#[test]
fn test_resizable_map_settles_dimensions_late() {
    let data = pattern(10 * 5, 41);
    let mut writer = TiffWriter::new(Cursor::new(Vec::new()), WriterOptions::default());
    writer.start_new_file().unwrap();

    let mut ifd = Ifd::new();
    ifd.set_tile_size(8, 8).unwrap();
    let mut map = writer
        .start_new_image(ifd, 1, PixelType::Uint8, true)
        .unwrap();
    writer.update_tiles(&mut map, &data, 0, 0, 10, 5).unwrap();
    writer.complete_image(&mut map).unwrap();

    let bytes = writer.into_stream().unwrap().into_inner();
    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    let ifds = reader.all_ifds().unwrap();
    assert_eq!(ifds[0].image_width().unwrap(), 10);
    assert_eq!(ifds[0].image_length().unwrap(), 5);
    assert_eq!(reader.read_image(&ifds[0]).unwrap(), data);
}

#[test]
fn test_horizontal_predictor_with_lzw() {
    let data = pattern(12 * 6 * 2, 51);
    let mut ifd = gray_ifd(12, 6);
    ifd.set_rows_per_strip(6).unwrap();
    ifd.set_compression(Compression::Lzw).unwrap();
    ifd.set_predictor(PredictorKind::Horizontal).unwrap();

    let bytes = write_single_image(
        WriterOptions::default(),
        ifd,
        1,
        PixelType::Uint16,
        &data,
        12,
        6,
    );

    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    let ifds = reader.all_ifds().unwrap();
    assert_eq!(reader.read_image(&ifds[0]).unwrap(), data);
}

#[test]
fn test_floating_point_predictor_with_deflate() {
    let values: Vec<f32> = (0..8 * 4).map(|i| (i as f32) * 1.25 - 7.5).collect();
    let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();

    let mut ifd = gray_ifd(8, 4);
    ifd.set_rows_per_strip(4).unwrap();
    ifd.set_compression(Compression::Deflate).unwrap();
    ifd.set_predictor(PredictorKind::FloatingPoint).unwrap();

    let bytes = write_single_image(
        WriterOptions::default(),
        ifd,
        1,
        PixelType::Float32,
        &data,
        8,
        4,
    );

    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    let ifds = reader.all_ifds().unwrap();
    assert_eq!(reader.read_image(&ifds[0]).unwrap(), data);
}

#[test]
fn test_big_endian_output() {
    let data = pattern(4 * 4 * 2, 61);
    let options = WriterOptions {
        byte_order: ByteOrder::BigEndian,
        ..WriterOptions::default()
    };
    let bytes = write_single_image(options, gray_ifd(4, 4), 1, PixelType::Uint16, &data, 4, 4);

    assert_eq!(&bytes[0..2], &[0x4D, 0x4D]);

    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    assert_eq!(reader.byte_order(), ByteOrder::BigEndian);
    let ifds = reader.all_ifds().unwrap();
    assert_eq!(reader.read_image(&ifds[0]).unwrap(), data);
}

#[test]
fn test_ifd_offsets_stay_even_with_odd_payloads() {
    // 3-byte strips force odd data ends; IFDs must still land even
    let first = vec![1u8, 2, 3];
    let second = vec![9u8, 8, 7, 6, 5];

    let mut writer = TiffWriter::new(Cursor::new(Vec::new()), WriterOptions::default());
    writer.start_new_file().unwrap();
    let mut map1 = writer
        .start_new_image(gray_ifd(3, 1), 1, PixelType::Uint8, false)
        .unwrap();
    writer.update_tiles(&mut map1, &first, 0, 0, 3, 1).unwrap();
    writer.complete_image(&mut map1).unwrap();

    let mut map2 = writer
        .start_new_image(gray_ifd(5, 1), 1, PixelType::Uint8, false)
        .unwrap();
    writer.update_tiles(&mut map2, &second, 0, 0, 5, 1).unwrap();
    writer.complete_image(&mut map2).unwrap();

    let bytes = writer.into_stream().unwrap().into_inner();
    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    let ifds = reader.all_ifds().unwrap();
    assert_eq!(ifds.len(), 2);
    for ifd in &ifds {
        assert_eq!(ifd.offset_of_origin().unwrap() % 2, 0);
    }
    assert_eq!(reader.read_image(&ifds[0]).unwrap(), first);
    assert_eq!(reader.read_image(&ifds[1]).unwrap(), second);
}

#[test]
fn test_ifd_values_survive_serialisation() {
    // serialise ∘ parse is the identity on entry values, including
    // externally stored payloads
    let data = pattern(4 * 4, 81);
    let mut ifd = gray_ifd(4, 4);
    ifd.set(tags::SOFTWARE, TiffValue::ascii("tilekit 0.1"))
        .unwrap();
    ifd.set(tags::X_RESOLUTION, TiffValue::Rational(vec![(300, 1)]))
        .unwrap();
    ifd.set(40002, TiffValue::Short(vec![5, 6, 7, 8, 9]))
        .unwrap();
    ifd.set(40003, TiffValue::Double(vec![1.25, -2.5]))
        .unwrap();

    let bytes = write_single_image(
        WriterOptions::default(),
        ifd,
        1,
        PixelType::Uint8,
        &data,
        4,
        4,
    );

    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    let ifds = reader.all_ifds().unwrap();
    assert_eq!(
        ifds[0].get(tags::SOFTWARE),
        Some(&TiffValue::Ascii("tilekit 0.1".into()))
    );
    assert_eq!(
        ifds[0].get(tags::X_RESOLUTION),
        Some(&TiffValue::Rational(vec![(300, 1)]))
    );
    assert_eq!(
        ifds[0].get(40002),
        Some(&TiffValue::Short(vec![5, 6, 7, 8, 9]))
    );
    assert_eq!(ifds[0].get(40003), Some(&TiffValue::Double(vec![1.25, -2.5])));

    // Entries sit in ascending tag order on disk
    let mut previous = 0u16;
    for (&tag, _) in ifds[0].iter() {
        assert!(tag >= previous);
        previous = tag;
    }
}

#[test]
fn test_read_tile_directly() {
    let data = pattern(16 * 16, 71);
    let mut ifd = gray_ifd(16, 16);
    ifd.set_tile_size(8, 8).unwrap();
    ifd.set_compression(Compression::PackBits).unwrap();

    let bytes = write_single_image(
        WriterOptions::default(),
        ifd,
        1,
        PixelType::Uint8,
        &data,
        16,
        16,
    );

    let mut reader = TiffReader::open(Cursor::new(bytes), true).unwrap();
    let ifds = reader.all_ifds().unwrap();
    let tile = reader.read_tile(&ifds[0], TileIndex::new(0, 1, 1)).unwrap();
    let decoded = tile.decoded().unwrap();
    assert_eq!(decoded.len(), 64);
    // The tile's first pixel is image pixel (8, 8)
    assert_eq!(decoded[0], data[8 * 16 + 8]);
}
