//! Colorspace post-processing
//!
//! YCbCr→RGB conversion using the IFD's luma coefficients and reference
//! black/white coding range (BT.601 defaults), and CMYK inversion.

use crate::tiff::errors::{TiffError, TiffResult};

/// BT.601 luma coefficients, the TIFF default
pub const DEFAULT_LUMA: [f64; 3] = [0.299, 0.587, 0.114];

/// Default reference black/white pairs for 8-bit YCbCr
pub const DEFAULT_REFERENCE_BLACK_WHITE: [f64; 6] = [0.0, 255.0, 128.0, 255.0, 128.0, 255.0];

fn clamp_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Converts interleaved 8-bit YCbCr pixels to RGB in place
///
/// `luma` are the Y coefficients for R, G, B; `reference` holds the
/// (black, white) coding range pairs for Y, Cb and Cr. Pass `None` for
/// the TIFF defaults. Subsampled chroma must be expanded before calling.
pub fn ycbcr_to_rgb(
    data: &mut [u8],
    luma: Option<[f64; 3]>,
    reference: Option<[f64; 6]>,
) -> TiffResult<()> {
    if data.len() % 3 != 0 {
        return Err(TiffError::FormatError(format!(
            "YCbCr buffer length {} is not a multiple of 3",
            data.len()
        )));
    }
    let [lr, lg, lb] = luma.unwrap_or(DEFAULT_LUMA);
    if lg == 0.0 {
        return Err(TiffError::FormatError(
            "YCbCr green luma coefficient is zero".to_string(),
        ));
    }
    let reference = reference.unwrap_or(DEFAULT_REFERENCE_BLACK_WHITE);
    let (black_y, white_y) = (reference[0], reference[1]);
    let (black_cb, white_cb) = (reference[2], reference[3]);
    let (black_cr, white_cr) = (reference[4], reference[5]);

    let y_span = (white_y - black_y).max(f64::EPSILON);
    let cb_span = (white_cb - black_cb).max(f64::EPSILON);
    let cr_span = (white_cr - black_cr).max(f64::EPSILON);

    for pixel in data.chunks_mut(3) {
        let y = (pixel[0] as f64 - black_y) * 255.0 / y_span;
        let cb = (pixel[1] as f64 - black_cb) * 127.0 / cb_span;
        let cr = (pixel[2] as f64 - black_cr) * 127.0 / cr_span;

        let r = cr * (2.0 - 2.0 * lr) + y;
        let b = cb * (2.0 - 2.0 * lb) + y;
        let g = (y - lr * r - lb * b) / lg;

        pixel[0] = clamp_u8(r);
        pixel[1] = clamp_u8(g);
        pixel[2] = clamp_u8(b);
    }
    Ok(())
}

/// Inverts CMYK samples in place (max value minus sample)
pub fn invert_cmyk(data: &mut [u8], bits_per_sample: u32) -> TiffResult<()> {
    match bits_per_sample {
        8 => {
            for byte in data.iter_mut() {
                *byte = 255 - *byte;
            }
            Ok(())
        }
        16 => {
            // Complementing both bytes complements the 16-bit value in
            // either endianness
            for byte in data.iter_mut() {
                *byte = !*byte;
            }
            Ok(())
        }
        other => Err(TiffError::UnsupportedBitDepth(other)),
    }
}
