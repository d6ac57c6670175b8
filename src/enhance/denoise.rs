//! Non-local-means denoising
//!
//! Each output pixel is a weighted mean over a square search window. The
//! weight of a candidate pixel is `exp(-d² / h²)`, where `d²` is the mean
//! squared difference between the template patch around the candidate and
//! the one around the pixel being filtered. Patch distances for one search
//! offset are read from a single integral image, so the cost is
//! `O(pixels × search_window²)` regardless of the template size.
//!
//! Patch sums are integers, so weights come from a lookup table indexed by
//! the sum. Sums whose weight is below `exp(-WEIGHT_CUTOFF)` contribute
//! nothing.

use image::{GrayImage, Luma};

/// Exponent past which a candidate's weight is treated as zero
const WEIGHT_CUTOFF: f32 = 16.0;

/// Denoise a grayscale image
///
/// `strength` is the filter parameter `h`; larger values smooth more.
/// Window sizes are rounded down to the nearest odd size. Borders are
/// handled by replicating edge pixels.
pub fn non_local_means(
    image: &GrayImage,
    strength: f32,
    template_window: u32,
    search_window: u32,
) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || strength <= 0.0 {
        return image.clone();
    }

    let rt = (template_window / 2) as usize;
    let rs = (search_window / 2) as usize;
    let pad = rt + rs;
    let (w, h) = (width as usize, height as usize);

    // Edge-replicated copy so every patch lookup stays in bounds
    let pw = w + 2 * pad;
    let ph = h + 2 * pad;
    let mut padded = vec![0i32; pw * ph];
    for py in 0..ph {
        let sy = py.saturating_sub(pad).min(h - 1) as u32;
        for px in 0..pw {
            let sx = px.saturating_sub(pad).min(w - 1) as u32;
            padded[py * pw + px] = image.get_pixel(sx, sy)[0] as i32;
        }
    }

    // Squared-difference field covers every template position of every pixel
    let dw = w + 2 * rt;
    let dh = h + 2 * rt;
    let iw = dw + 1;
    let mut integral = vec![0u64; iw * (dh + 1)];

    let k = 2 * rt + 1;
    let weights = weight_table(strength, k);

    let mut num = vec![0f32; w * h];
    let mut den = vec![0f32; w * h];

    let rs_i = rs as isize;
    for dy in -rs_i..=rs_i {
        for dx in -rs_i..=rs_i {
            for j in 0..dh {
                let mut row_sum = 0u64;
                let a_row = (j + rs) * pw + rs;
                let b_row = ((j + rs) as isize + dy) as usize * pw;
                for i in 0..dw {
                    let a = padded[a_row + i];
                    let b = padded[b_row + ((i + rs) as isize + dx) as usize];
                    let d = (a - b) as i64;
                    row_sum += (d * d) as u64;
                    integral[(j + 1) * iw + i + 1] = integral[j * iw + i + 1] + row_sum;
                }
            }

            for y in 0..h {
                let q_row = ((y + pad) as isize + dy) as usize * pw;
                for x in 0..w {
                    let sum = integral[(y + k) * iw + x + k] + integral[y * iw + x]
                        - integral[y * iw + x + k]
                        - integral[(y + k) * iw + x];
                    let Some(&weight) = weights.get(sum as usize) else {
                        continue;
                    };
                    let q = padded[q_row + ((x + pad) as isize + dx) as usize];
                    num[y * w + x] += weight * q as f32;
                    den[y * w + x] += weight;
                }
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let idx = y as usize * w + x as usize;
        // den >= 1: the zero offset always contributes weight 1
        let value = (num[idx] / den[idx]).round().clamp(0.0, 255.0);
        Luma([value as u8])
    })
}

/// Weight for every patch sum up to the cutoff
///
/// A patch sum `s` over a `k`×`k` template has weight `exp(-s / (h² k²))`.
fn weight_table(strength: f32, k: usize) -> Vec<f32> {
    let area = (k * k) as f32;
    let scale = strength * strength * area;
    let max_sum = (k * k) as u64 * 255 * 255;
    let len = ((WEIGHT_CUTOFF * scale).ceil() as u64).min(max_sum) + 1;

    (0..len)
        .map(|sum| (-(sum as f32) / scale).exp())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Straightforward per-pixel evaluation with clamped coordinates
    fn direct_nlm(image: &GrayImage, strength: f32, template_window: u32, search_window: u32) -> GrayImage {
        let (w, h) = (image.width() as i64, image.height() as i64);
        let rt = (template_window / 2) as i64;
        let rs = (search_window / 2) as i64;
        let at = |x: i64, y: i64| image.get_pixel(x.clamp(0, w - 1) as u32, y.clamp(0, h - 1) as u32)[0] as f64;
        let area = ((2 * rt + 1) * (2 * rt + 1)) as f64;
        let h2 = (strength * strength) as f64;

        GrayImage::from_fn(image.width(), image.height(), |x, y| {
            let (x, y) = (x as i64, y as i64);
            let (mut num, mut den) = (0.0, 0.0);
            for dy in -rs..=rs {
                for dx in -rs..=rs {
                    let mut d2 = 0.0;
                    for ty in -rt..=rt {
                        for tx in -rt..=rt {
                            let diff = at(x + tx, y + ty) - at(x + dx + tx, y + dy + ty);
                            d2 += diff * diff;
                        }
                    }
                    let weight = (-d2 / area / h2).exp();
                    num += weight * at(x + dx, y + dy);
                    den += weight;
                }
            }
            Luma([(num / den).round().clamp(0.0, 255.0) as u8])
        })
    }

    #[test]
    fn test_matches_direct_evaluation() {
        let img = GrayImage::from_fn(19, 13, |x, y| {
            let noise = ((x * 7919 + y * 104_729) % 41) as u8;
            Luma([if (x / 4 + y / 3) % 2 == 0 { 60 + noise } else { 190 - noise }])
        });

        let fast = non_local_means(&img, 10.0, 5, 9);
        let reference = direct_nlm(&img, 10.0, 5, 9);
        for (a, b) in fast.pixels().zip(reference.pixels()) {
            assert!((a[0] as i32 - b[0] as i32).abs() <= 1, "{} vs {}", a[0], b[0]);
        }
    }

    #[test]
    fn test_weight_table_is_cut_off() {
        let table = weight_table(10.0, 7);
        assert_eq!(table[0], 1.0);
        // 16 * h² * k² = 78400
        assert_eq!(table.len(), 78_401);
        assert!(table.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn test_flat_image_is_unchanged() {
        let img = GrayImage::from_pixel(12, 9, Luma([128]));
        let out = non_local_means(&img, 10.0, 7, 21);
        assert_eq!(out, img);
    }

    #[test]
    fn test_preserves_dimensions() {
        let img = GrayImage::from_fn(17, 5, |x, y| Luma([((x * 13 + y * 7) % 256) as u8]));
        let out = non_local_means(&img, 10.0, 7, 21);
        assert_eq!(out.dimensions(), (17, 5));
    }

    #[test]
    fn test_isolated_speck_is_suppressed() {
        let mut img = GrayImage::from_pixel(15, 15, Luma([200]));
        img.put_pixel(7, 7, Luma([190]));
        let out = non_local_means(&img, 10.0, 3, 7);
        let center = out.get_pixel(7, 7)[0];
        assert!(center > 190, "speck should be pulled toward background, got {}", center);
    }

    #[test]
    fn test_strong_edges_survive() {
        // Left half black, right half white
        let img = GrayImage::from_fn(20, 10, |x, _| Luma([if x < 10 { 0 } else { 255 }]));
        let out = non_local_means(&img, 10.0, 7, 21);
        assert!(out.get_pixel(2, 5)[0] < 20);
        assert!(out.get_pixel(17, 5)[0] > 235);
    }

    #[test]
    fn test_zero_strength_is_identity() {
        let img = GrayImage::from_fn(6, 6, |x, y| Luma([(x * 40 + y) as u8]));
        assert_eq!(non_local_means(&img, 0.0, 7, 21), img);
    }
}
