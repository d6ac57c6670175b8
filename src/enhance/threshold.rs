//! Binarization and contrast helpers

use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;

/// Gaussian-weighted adaptive threshold
///
/// A pixel becomes white when it is brighter than its Gaussian-weighted
/// neighbourhood mean minus `offset`, black otherwise. `block_size` is the
/// neighbourhood diameter and is forced to an odd value of at least 3.
pub fn adaptive_threshold_gaussian(image: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let block = block_size.max(3) | 1;
    let sigma = 0.3 * ((block as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let local_mean = gaussian_blur_f32(image, sigma);

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let value = image.get_pixel(x, y)[0] as i32;
        let cutoff = local_mean.get_pixel(x, y)[0] as i32 - offset;
        Luma([if value > cutoff { 255 } else { 0 }])
    })
}

/// Stretch the occupied intensity range onto the full 0-255 range
///
/// Intermediate levels are truncated, as PIL's `ImageOps.autocontrast` does.
/// Images with a single intensity are returned unchanged.
pub fn auto_contrast(image: &GrayImage) -> GrayImage {
    let (lo, hi) = image
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    if lo >= hi {
        return image.clone();
    }

    let range = (hi - lo) as u32;
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        let v = (value as u32).clamp(lo as u32, hi as u32) - lo as u32;
        *slot = (v * 255 / range) as u8;
    }

    let mut out = image.clone();
    for p in out.pixels_mut() {
        p[0] = lut[p[0] as usize];
    }
    out
}
