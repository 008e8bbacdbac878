//! Tests for the TIFF container module

mod ifd_tests;
mod reader_tests;
mod test_utils;
