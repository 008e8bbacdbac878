//! Chunky ⇄ planar sample layout conversion
//!
//! Auto-interleave is a pure transformation between the separated
//! (RRR…GGG…BBB…) and interleaved (RGBRGB…) layouts of a pixel buffer.

/// Converts a separated buffer (channel-major) into an interleaved one
pub fn interleave_samples(separated: &[u8], channels: usize, bytes_per_sample: usize) -> Vec<u8> {
    if channels <= 1 {
        return separated.to_vec();
    }
    let plane_size = separated.len() / channels;
    let pixels = plane_size / bytes_per_sample;
    let mut interleaved = vec![0u8; separated.len()];
    for channel in 0..channels {
        let plane = &separated[channel * plane_size..(channel + 1) * plane_size];
        for pixel in 0..pixels {
            let src = pixel * bytes_per_sample;
            let dst = (pixel * channels + channel) * bytes_per_sample;
            interleaved[dst..dst + bytes_per_sample]
                .copy_from_slice(&plane[src..src + bytes_per_sample]);
        }
    }
    interleaved
}

/// Converts an interleaved buffer into a separated (channel-major) one
pub fn separate_samples(interleaved: &[u8], channels: usize, bytes_per_sample: usize) -> Vec<u8> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    let plane_size = interleaved.len() / channels;
    let pixels = plane_size / bytes_per_sample;
    let mut separated = vec![0u8; interleaved.len()];
    for channel in 0..channels {
        for pixel in 0..pixels {
            let src = (pixel * channels + channel) * bytes_per_sample;
            let dst = channel * plane_size + pixel * bytes_per_sample;
            separated[dst..dst + bytes_per_sample]
                .copy_from_slice(&interleaved[src..src + bytes_per_sample]);
        }
    }
    separated
}
