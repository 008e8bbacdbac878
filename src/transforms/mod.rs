//! Pixel transforms
//!
//! Stateless byte-buffer operations keyed on IFD attributes: fill order
//! reversal, predictor differencing, chunky⇄planar interleave, sub-byte
//! precision unpacking and colorspace post-processing.

pub mod color;
pub mod fill_order;
pub mod interleave;
pub mod predictor;
pub mod unpack;


pub use color::{invert_cmyk, ycbcr_to_rgb};
pub use fill_order::reverse_fill_order;
pub use interleave::{interleave_samples, separate_samples};
pub use predictor::{predict_float, predict_horizontal, unpredict_float, unpredict_horizontal};
pub use unpack::unpack_bits;
