//! Tests for the IFD directory model

extern crate std;

use std::vec;

use crate::tiff::constants::tags;
use crate::tiff::errors::TiffError;
use crate::tiff::ifd::Ifd;
use crate::tiff::types::{Compression, FieldType, PlanarConfig};
use crate::tiff::value::TiffValue;

fn basic_ifd(width: u32, height: u32) -> Ifd {
    let mut ifd = Ifd::new();
    ifd.set_image_dimensions(width, height).unwrap();
    ifd
}

#[test]
fn test_map_operations() {
    let mut ifd = Ifd::new();
    std::assert!(!ifd.contains(tags::SOFTWARE));
    ifd.set(tags::SOFTWARE, TiffValue::ascii("tilekit")).unwrap();
    std::assert!(ifd.contains(tags::SOFTWARE));
    std::assert_eq!(
        ifd.get(tags::SOFTWARE),
        Some(&TiffValue::Ascii("tilekit".into()))
    );
    let removed = ifd.remove(tags::SOFTWARE).unwrap();
    std::assert!(removed.is_some());
    std::assert!(!ifd.contains(tags::SOFTWARE));
}

#[test]
fn test_dimension_validation() {
    let ifd = basic_ifd(640, 480);
    std::assert_eq!(ifd.image_width().unwrap(), 640);
    std::assert_eq!(ifd.image_length().unwrap(), 480);

    let mut bad = Ifd::new();
    bad.set(tags::IMAGE_WIDTH, TiffValue::long(0)).unwrap();
    bad.set(tags::IMAGE_LENGTH, TiffValue::long(10)).unwrap();
    std::assert!(bad.image_width().is_err());

    let empty = Ifd::new();
    std::assert!(matches!(
        empty.image_width(),
        Err(TiffError::MissingDimensions)
    ));
}

#[test]
fn test_bits_per_sample_must_be_equal() {
    let mut ifd = basic_ifd(4, 4);
    ifd.set(tags::BITS_PER_SAMPLE, TiffValue::Short(vec![8, 8, 8]))
        .unwrap();
    std::assert_eq!(ifd.bits_per_sample().unwrap(), 8);

    ifd.set(tags::BITS_PER_SAMPLE, TiffValue::Short(vec![8, 16, 8]))
        .unwrap();
    std::assert!(matches!(
        ifd.bits_per_sample(),
        Err(TiffError::UnequalBitsPerSample(_))
    ));

    // Absent tag means the TIFF default of 1 bit
    let plain = basic_ifd(4, 4);
    std::assert_eq!(plain.bits_per_sample().unwrap(), 1);
    std::assert_eq!(plain.bytes_per_sample().unwrap(), 1);
}

#[test]
fn test_tile_size_fallbacks() {
    // Stripped image: tile width is the image width, tile height the
    // rows per strip
    let mut stripped = basic_ifd(100, 30);
    stripped.set_rows_per_strip(8).unwrap();
    std::assert!(!stripped.is_tiled());
    std::assert_eq!(stripped.tile_size_x().unwrap(), 100);
    std::assert_eq!(stripped.tile_size_y().unwrap(), 8);
    std::assert_eq!(stripped.tiles_per_row().unwrap(), 1);
    std::assert_eq!(stripped.tiles_per_column().unwrap(), 4);

    // Without RowsPerStrip the whole image is one strip
    let single = basic_ifd(100, 30);
    std::assert_eq!(single.tile_size_y().unwrap(), 30);
    std::assert_eq!(single.tiles_per_column().unwrap(), 1);

    // Tiled image: the tile tags win
    let mut tiled = basic_ifd(100, 30);
    tiled.set_tile_size(16, 16).unwrap();
    std::assert!(tiled.is_tiled());
    std::assert_eq!(tiled.tile_size_x().unwrap(), 16);
    std::assert_eq!(tiled.tiles_per_row().unwrap(), 7);
    std::assert_eq!(tiled.tiles_per_column().unwrap(), 2);
}

#[test]
fn test_positioning_fallback_quirk() {
    // Not marked tiled but carrying TileByteCounts: the strip tags win
    let mut ifd = basic_ifd(8, 8);
    ifd.set(tags::TILE_BYTE_COUNTS, TiffValue::Long(vec![999]))
        .unwrap();
    ifd.set(tags::STRIP_BYTE_COUNTS, TiffValue::Long(vec![64]))
        .unwrap();
    std::assert_eq!(ifd.data_byte_counts().unwrap(), vec![64]);

    // When the strip tags are missing entirely, the tile tags are
    // accepted as a fallback
    let mut orphan = basic_ifd(8, 8);
    orphan
        .set(tags::TILE_BYTE_COUNTS, TiffValue::Long(vec![64]))
        .unwrap();
    std::assert_eq!(orphan.data_byte_counts().unwrap(), vec![64]);
}

#[test]
fn test_size_products_check_31_bit_overflow() {
    let mut ifd = basic_ifd(70_000, 70_000);
    ifd.set(tags::BITS_PER_SAMPLE, TiffValue::short(8)).unwrap();
    std::assert!(matches!(
        ifd.size_of_region(70_000, 70_000),
        Err(TiffError::SizeOverflow(_))
    ));

    let small = {
        let mut ifd = basic_ifd(640, 480);
        ifd.set(tags::BITS_PER_SAMPLE, TiffValue::short(16)).unwrap();
        ifd.set_samples_per_pixel(3).unwrap();
        ifd
    };
    std::assert_eq!(small.size_of_region(10, 10).unwrap(), 10 * 10 * 3 * 2);
}

#[test]
fn test_separated_planes() {
    let mut ifd = basic_ifd(16, 16);
    ifd.set_samples_per_pixel(3).unwrap();
    std::assert_eq!(ifd.separated_plane_count().unwrap(), 1);
    std::assert_eq!(ifd.samples_per_tile_pixel().unwrap(), 3);

    ifd.set_planar_config(PlanarConfig::Separate).unwrap();
    std::assert_eq!(ifd.separated_plane_count().unwrap(), 3);
    std::assert_eq!(ifd.samples_per_tile_pixel().unwrap(), 1);
    std::assert_eq!(ifd.grid_tile_count().unwrap(), 3);
}

#[test]
fn test_freeze_rejects_mutation() {
    let mut ifd = basic_ifd(4, 4);
    ifd.freeze_for_writing();
    std::assert!(matches!(
        ifd.set(tags::SOFTWARE, TiffValue::ascii("x")),
        Err(TiffError::FrozenIfd)
    ));
    std::assert!(matches!(
        ifd.remove(tags::IMAGE_WIDTH),
        Err(TiffError::FrozenIfd)
    ));
}

#[test]
fn test_write_offset_must_be_even() {
    let mut ifd = Ifd::new();
    std::assert!(matches!(
        ifd.set_file_offset_for_writing(9),
        Err(TiffError::OddOffset(9))
    ));
    ifd.set_file_offset_for_writing(8).unwrap();
    std::assert_eq!(ifd.file_offset_for_writing(), Some(8));
}

#[test]
fn test_update_data_positioning() {
    let mut ifd = basic_ifd(16, 16);
    ifd.set_rows_per_strip(8).unwrap();

    // Length must match the grid (two strips here)
    std::assert!(ifd.update_data_positioning(&[10], &[20]).is_err());
    std::assert!(ifd.update_data_positioning(&[10, 20], &[5]).is_err());

    ifd.update_data_positioning(&[10, 20], &[5, 6]).unwrap();
    std::assert_eq!(ifd.data_offsets().unwrap(), vec![10, 20]);
    std::assert_eq!(ifd.data_byte_counts().unwrap(), vec![5, 6]);
    // Classic files store the arrays as LONG
    std::assert_eq!(
        ifd.get(tags::STRIP_OFFSETS).unwrap().field_type(),
        FieldType::Long
    );

    // BigTIFF stores them as LONG8
    let mut big = basic_ifd(16, 16);
    big.set_rows_per_strip(16).unwrap();
    big.set_format_flags(true, true);
    big.update_data_positioning(&[u32::MAX as u64 + 10], &[7])
        .unwrap();
    std::assert_eq!(
        big.get(tags::STRIP_OFFSETS).unwrap().field_type(),
        FieldType::Long8
    );

    // A classic file cannot address beyond 32 bits
    let mut narrow = basic_ifd(16, 16);
    narrow.set_rows_per_strip(16).unwrap();
    std::assert!(narrow
        .update_data_positioning(&[u32::MAX as u64 + 10], &[7])
        .is_err());
}

#[test]
fn test_defaults() {
    let ifd = basic_ifd(4, 4);
    std::assert_eq!(ifd.compression(), Compression::None);
    std::assert_eq!(ifd.samples_per_pixel(), 1);
    std::assert_eq!(ifd.planar_config().unwrap(), PlanarConfig::Chunky);
    std::assert!(ifd.photometric().is_none());
    std::assert!(!ifd.is_thumbnail());

    let mut thumb = basic_ifd(4, 4);
    thumb.set(tags::NEW_SUBFILE_TYPE, TiffValue::long(1)).unwrap();
    std::assert!(thumb.is_thumbnail());
}
