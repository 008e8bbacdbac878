//! Utility functions for TIFF processing

pub mod format_utils;
pub mod tag_utils;
pub mod write_utils;
