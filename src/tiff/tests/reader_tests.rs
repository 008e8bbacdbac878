//! Tests for the TIFF reader

extern crate std;

use std::io::Cursor;
use std::vec;
use std::vec::Vec;

use crate::tiff::constants::{field_types, tags};
use crate::tiff::errors::TiffError;
use crate::tiff::reader::TiffReader;
use crate::tiff::value::TiffValue;
use crate::tiles::TileIndex;

use super::test_utils::{classic_header, push_entry, push_entry_count, push_next_ifd};

#[test]
fn test_read_minimal_ifd() {
    let mut buffer = classic_header(8);
    push_entry_count(&mut buffer, 2);
    push_entry(&mut buffer, tags::IMAGE_WIDTH, field_types::LONG, 1, 200);
    push_entry(&mut buffer, tags::IMAGE_LENGTH, field_types::LONG, 1, 100);
    push_next_ifd(&mut buffer, 0);

    let mut reader = TiffReader::open(Cursor::new(buffer), true).unwrap();
    std::assert!(reader.is_valid());
    std::assert!(!reader.is_big_tiff());

    let ifds = reader.all_ifds().unwrap();
    std::assert_eq!(ifds.len(), 1);
    std::assert_eq!(ifds[0].image_width().unwrap(), 200);
    std::assert_eq!(ifds[0].image_length().unwrap(), 100);
    std::assert_eq!(ifds[0].offset_of_origin(), Some(8));
    std::assert_eq!(ifds[0].next_ifd_offset(), Some(0));
}

#[test]
fn test_not_a_tiff_is_soft_unless_required() {
    let garbage = vec![0x50u8, 0x4B, 0x03, 0x04, 0, 0, 0, 0, 0, 0];

    let mut tolerant = TiffReader::open(Cursor::new(garbage.clone()), false).unwrap();
    std::assert!(!tolerant.is_valid());
    std::assert_eq!(tolerant.all_ifds().unwrap().len(), 0);

    std::assert!(TiffReader::open(Cursor::new(garbage), true).is_err());
}

#[test]
fn test_unknown_field_type_is_skipped() {
    let mut buffer = classic_header(8);
    push_entry_count(&mut buffer, 3);
    push_entry(&mut buffer, tags::IMAGE_WIDTH, field_types::LONG, 1, 200);
    push_entry(&mut buffer, tags::IMAGE_LENGTH, field_types::LONG, 1, 100);
    push_entry(&mut buffer, tags::SOFTWARE, 99, 1, 0);
    push_next_ifd(&mut buffer, 0);

    let mut reader = TiffReader::open(Cursor::new(buffer.clone()), false).unwrap();
    let ifds = reader.all_ifds().unwrap();
    std::assert_eq!(ifds.len(), 1);
    std::assert_eq!(ifds[0].entry_count(), 2);
    std::assert!(!ifds[0].contains(tags::SOFTWARE));

    // Strict mode turns the skip into a failure
    let mut strict = TiffReader::open(Cursor::new(buffer), false).unwrap();
    strict.set_strict_types(true);
    std::assert!(matches!(
        strict.all_ifds(),
        Err(TiffError::UnsupportedFieldType(99))
    ));
}

#[test]
fn test_truncated_value_array_is_clamped() {
    let mut buffer = classic_header(8);
    push_entry_count(&mut buffer, 3);
    push_entry(&mut buffer, tags::IMAGE_WIDTH, field_types::LONG, 1, 200);
    push_entry(&mut buffer, tags::IMAGE_LENGTH, field_types::LONG, 1, 100);
    // Ten LONGs declared, two actually present
    push_entry(&mut buffer, tags::STRIP_OFFSETS, field_types::LONG, 10, 50);
    push_next_ifd(&mut buffer, 0);
    std::assert_eq!(buffer.len(), 50);
    buffer.extend_from_slice(&123u32.to_le_bytes());
    buffer.extend_from_slice(&456u32.to_le_bytes());

    let mut reader = TiffReader::open(Cursor::new(buffer), false).unwrap();
    let ifds = reader.all_ifds().unwrap();
    std::assert_eq!(
        ifds[0].get(tags::STRIP_OFFSETS),
        Some(&TiffValue::Long(vec![123, 456]))
    );
}

#[test]
fn test_fill_order_reversal_with_packbits() {
    // 4x1 grayscale strip, PackBits-compressed, FillOrder = 2: the
    // decompressed bytes are bit-reversed before delivery
    let mut buffer = classic_header(8);
    push_entry_count(&mut buffer, 10);
    push_entry(&mut buffer, tags::IMAGE_WIDTH, field_types::LONG, 1, 4);
    push_entry(&mut buffer, tags::IMAGE_LENGTH, field_types::LONG, 1, 1);
    push_entry(&mut buffer, tags::BITS_PER_SAMPLE, field_types::SHORT, 1, 8);
    push_entry(&mut buffer, tags::COMPRESSION, field_types::SHORT, 1, 32773);
    push_entry(
        &mut buffer,
        tags::PHOTOMETRIC_INTERPRETATION,
        field_types::SHORT,
        1,
        1,
    );
    push_entry(&mut buffer, tags::FILL_ORDER, field_types::SHORT, 1, 2);
    push_entry(&mut buffer, tags::STRIP_OFFSETS, field_types::LONG, 1, 134);
    push_entry(&mut buffer, tags::SAMPLES_PER_PIXEL, field_types::SHORT, 1, 1);
    push_entry(&mut buffer, tags::ROWS_PER_STRIP, field_types::LONG, 1, 1);
    push_entry(&mut buffer, tags::STRIP_BYTE_COUNTS, field_types::LONG, 1, 5);
    push_next_ifd(&mut buffer, 0);
    std::assert_eq!(buffer.len(), 134);
    // PackBits literal run of the bit-reversed pixels
    buffer.extend_from_slice(&[0x03, 0x80, 0x40, 0x01, 0xFF]);

    let mut reader = TiffReader::open(Cursor::new(buffer), true).unwrap();
    let ifds = reader.all_ifds().unwrap();
    let pixels = reader.read_image(&ifds[0]).unwrap();
    std::assert_eq!(pixels, vec![0x01, 0x02, 0x80, 0xFF]);
}

#[test]
fn test_jpeg_tables_are_spliced() {
    // The tables' trailing EOI and the tile's leading SOI both go
    let mut buffer = classic_header(8);
    push_entry_count(&mut buffer, 10);
    push_entry(&mut buffer, tags::IMAGE_WIDTH, field_types::LONG, 1, 3);
    push_entry(&mut buffer, tags::IMAGE_LENGTH, field_types::LONG, 1, 1);
    push_entry(&mut buffer, tags::BITS_PER_SAMPLE, field_types::SHORT, 1, 8);
    push_entry(&mut buffer, tags::COMPRESSION, field_types::SHORT, 1, 7);
    push_entry(
        &mut buffer,
        tags::PHOTOMETRIC_INTERPRETATION,
        field_types::SHORT,
        1,
        6,
    );
    push_entry(&mut buffer, tags::STRIP_OFFSETS, field_types::LONG, 1, 140);
    push_entry(&mut buffer, tags::SAMPLES_PER_PIXEL, field_types::SHORT, 1, 3);
    push_entry(&mut buffer, tags::ROWS_PER_STRIP, field_types::LONG, 1, 1);
    push_entry(&mut buffer, tags::STRIP_BYTE_COUNTS, field_types::LONG, 1, 5);
    push_entry(&mut buffer, tags::JPEG_TABLES, field_types::UNDEFINED, 6, 134);
    push_next_ifd(&mut buffer, 0);
    std::assert_eq!(buffer.len(), 134);
    buffer.extend_from_slice(&[0x11, 0x22, 0x33, 0x44, 0xFF, 0xD9]); // tables
    buffer.extend_from_slice(&[0xFF, 0xD8, 0xAA, 0xBB, 0xCC]); // tile

    let mut reader = TiffReader::open(Cursor::new(buffer), true).unwrap();
    let ifds = reader.all_ifds().unwrap();
    let tile = reader
        .read_encoded_tile(&ifds[0], TileIndex::new(0, 0, 0))
        .unwrap();
    std::assert_eq!(
        tile.encoded().unwrap(),
        &[0x11, 0x22, 0x33, 0x44, 0xAA, 0xBB, 0xCC]
    );
}

#[test]
fn test_missing_tile_keeps_filler() {
    let mut buffer = classic_header(8);
    push_entry_count(&mut buffer, 8);
    push_entry(&mut buffer, tags::IMAGE_WIDTH, field_types::LONG, 1, 2);
    push_entry(&mut buffer, tags::IMAGE_LENGTH, field_types::LONG, 1, 1);
    push_entry(&mut buffer, tags::BITS_PER_SAMPLE, field_types::SHORT, 1, 8);
    push_entry(
        &mut buffer,
        tags::PHOTOMETRIC_INTERPRETATION,
        field_types::SHORT,
        1,
        1,
    );
    push_entry(&mut buffer, tags::STRIP_OFFSETS, field_types::LONG, 1, 0);
    push_entry(&mut buffer, tags::SAMPLES_PER_PIXEL, field_types::SHORT, 1, 1);
    push_entry(&mut buffer, tags::ROWS_PER_STRIP, field_types::LONG, 1, 1);
    push_entry(&mut buffer, tags::STRIP_BYTE_COUNTS, field_types::LONG, 1, 0);
    push_next_ifd(&mut buffer, 0);

    let mut reader = TiffReader::open(Cursor::new(buffer), true).unwrap();
    reader.set_filler(7);
    let ifds = reader.all_ifds().unwrap();

    let tile = reader
        .read_encoded_tile(&ifds[0], TileIndex::new(0, 0, 0))
        .unwrap();
    std::assert!(tile.is_empty());

    let pixels = reader.read_image(&ifds[0]).unwrap();
    std::assert_eq!(pixels, vec![7, 7]);
}

#[test]
fn test_tile_index_out_of_bounds_is_fatal() {
    let mut buffer = classic_header(8);
    push_entry_count(&mut buffer, 2);
    push_entry(&mut buffer, tags::IMAGE_WIDTH, field_types::LONG, 1, 4);
    push_entry(&mut buffer, tags::IMAGE_LENGTH, field_types::LONG, 1, 4);
    push_next_ifd(&mut buffer, 0);

    let mut reader = TiffReader::open(Cursor::new(buffer), false).unwrap();
    let ifds = reader.all_ifds().unwrap();
    std::assert!(matches!(
        reader.read_encoded_tile(&ifds[0], TileIndex::new(0, 5, 0)),
        Err(TiffError::TileIndexOutOfBounds { .. })
    ));
}

#[test]
fn test_region_out_of_bounds_is_fatal() {
    let mut buffer = classic_header(8);
    push_entry_count(&mut buffer, 2);
    push_entry(&mut buffer, tags::IMAGE_WIDTH, field_types::LONG, 1, 4);
    push_entry(&mut buffer, tags::IMAGE_LENGTH, field_types::LONG, 1, 4);
    push_next_ifd(&mut buffer, 0);

    let mut reader = TiffReader::open(Cursor::new(buffer), false).unwrap();
    let ifds = reader.all_ifds().unwrap();
    let mut out: Vec<u8> = vec![0; 64];
    std::assert!(matches!(
        reader.read_region(&ifds[0], 2, 2, 4, 4, &mut out),
        Err(TiffError::RegionOutOfBounds { .. })
    ));
}

#[test]
fn test_ifd_chain_with_two_directories() {
    let mut buffer = classic_header(8);
    // First IFD at 8 links to a second at 38
    push_entry_count(&mut buffer, 2);
    push_entry(&mut buffer, tags::IMAGE_WIDTH, field_types::LONG, 1, 10);
    push_entry(&mut buffer, tags::IMAGE_LENGTH, field_types::LONG, 1, 10);
    push_next_ifd(&mut buffer, 38);
    std::assert_eq!(buffer.len(), 38);
    push_entry_count(&mut buffer, 2);
    push_entry(&mut buffer, tags::IMAGE_WIDTH, field_types::LONG, 1, 5);
    push_entry(&mut buffer, tags::IMAGE_LENGTH, field_types::LONG, 1, 5);
    push_next_ifd(&mut buffer, 0);

    let mut reader = TiffReader::open(Cursor::new(buffer), true).unwrap();
    let ifds = reader.all_ifds().unwrap();
    std::assert_eq!(ifds.len(), 2);
    std::assert_eq!(ifds[0].image_width().unwrap(), 10);
    std::assert_eq!(ifds[1].image_width().unwrap(), 5);
    std::assert_eq!(ifds[1].next_ifd_offset(), Some(0));
}

#[test]
fn test_thumbnail_filtering() {
    let mut buffer = classic_header(8);
    push_entry_count(&mut buffer, 3);
    push_entry(&mut buffer, tags::NEW_SUBFILE_TYPE, field_types::LONG, 1, 1);
    push_entry(&mut buffer, tags::IMAGE_WIDTH, field_types::LONG, 1, 10);
    push_entry(&mut buffer, tags::IMAGE_LENGTH, field_types::LONG, 1, 10);
    push_next_ifd(&mut buffer, 50);
    std::assert_eq!(buffer.len(), 50);
    push_entry_count(&mut buffer, 2);
    push_entry(&mut buffer, tags::IMAGE_WIDTH, field_types::LONG, 1, 100);
    push_entry(&mut buffer, tags::IMAGE_LENGTH, field_types::LONG, 1, 100);
    push_next_ifd(&mut buffer, 0);

    let mut reader = TiffReader::open(Cursor::new(buffer), true).unwrap();
    std::assert_eq!(reader.thumbnails().unwrap().len(), 1);
    std::assert_eq!(reader.non_thumbnails().unwrap().len(), 1);
    std::assert_eq!(
        reader.non_thumbnails().unwrap()[0].image_width().unwrap(),
        100
    );
}
