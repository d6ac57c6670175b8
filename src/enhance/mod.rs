//! Image enhancement for OCR
//!
//! A fixed, order-sensitive filter chain applied to every page before
//! recognition:
//!
//! ```text
//! RGB page → grayscale → NL-means denoise → upscale (short pages only)
//!          → adaptive threshold → morphological opening → auto-contrast
//! ```
//!
//! The chain is pure: the same page and options always give the same output.
//! The only failure is an upscale whose target would exceed the pixel budget.

mod denoise;
mod threshold;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology;

pub use denoise::non_local_means;
pub use threshold::{adaptive_threshold_gaussian, auto_contrast};

/// Enhancement error
#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    #[error("Page too large to enhance: upscaling to {width}x{height} exceeds {max_pixels} pixels")]
    TooLarge {
        width: u64,
        height: u32,
        max_pixels: u64,
    },
}

/// Enhancement parameters
#[derive(Debug, Clone)]
pub struct EnhanceOptions {
    /// Non-local-means filter strength `h`
    pub denoise_strength: f32,
    /// Patch size compared by the denoiser
    pub template_window: u32,
    /// Area searched for similar patches
    pub search_window: u32,
    /// Pages shorter than this are upscaled to it
    pub min_height: u32,
    /// Neighbourhood diameter of the adaptive threshold
    pub threshold_block_size: u32,
    /// Subtracted from the local mean before thresholding
    pub threshold_offset: i32,
    /// Radius of the square opening element; 0 is a 1×1 element
    pub opening_radius: u8,
    /// Largest upscaled page, in pixels
    pub max_pixels: u64,
}

impl Default for EnhanceOptions {
    fn default() -> Self {
        Self {
            denoise_strength: 10.0,
            template_window: 7,
            search_window: 21,
            min_height: 1000,
            threshold_block_size: 25,
            threshold_offset: 12,
            opening_radius: 0,
            max_pixels: 100_000_000,
        }
    }
}

/// Run the full filter chain on one page
pub fn enhance_page(
    page: &RgbImage,
    options: &EnhanceOptions,
    verbose: bool,
) -> Result<GrayImage, EnhanceError> {
    let (width, height) = page.dimensions();
    stage_log!(verbose, width, height, "Starting enhancement for OCR");

    // Reject before the expensive denoise
    upscaled_size(width, height, options.min_height, options.max_pixels)?;

    let gray = DynamicImage::ImageRgb8(page.clone()).to_luma8();

    let denoised = non_local_means(
        &gray,
        options.denoise_strength,
        options.template_window,
        options.search_window,
    );

    let sized = upscale_to_min_height(denoised, options.min_height, options.max_pixels, verbose)?;

    let binary = adaptive_threshold_gaussian(
        &sized,
        options.threshold_block_size,
        options.threshold_offset,
    );

    let cleaned = morphology::open(&binary, Norm::LInf, options.opening_radius);
    let enhanced = auto_contrast(&cleaned);

    stage_log!(
        verbose,
        width = enhanced.width(),
        height = enhanced.height(),
        "Enhancement complete"
    );
    Ok(enhanced)
}

/// Enhance every page, keeping count and order
pub fn enhance_pages(
    pages: &[RgbImage],
    options: &EnhanceOptions,
    verbose: bool,
) -> Result<Vec<GrayImage>, EnhanceError> {
    pages
        .iter()
        .map(|page| enhance_page(page, options, verbose))
        .collect()
}

/// Upscale isotropically so the height reaches `min_height`
///
/// Images already at least `min_height` tall pass through untouched. Fails
/// when the upscaled page would hold more than `max_pixels` pixels.
pub fn upscale_to_min_height(
    image: GrayImage,
    min_height: u32,
    max_pixels: u64,
    verbose: bool,
) -> Result<GrayImage, EnhanceError> {
    let (width, height) = image.dimensions();
    let Some(new_width) = upscaled_size(width, height, min_height, max_pixels)? else {
        return Ok(image);
    };

    let scale = min_height as f64 / height as f64;
    stage_log!(
        verbose,
        width = new_width,
        height = min_height,
        "Upscaled small image by {:.2}x",
        scale
    );
    Ok(imageops::resize(&image, new_width, min_height, FilterType::Triangle))
}

/// Width after upscaling, or `None` when no upscale is needed
fn upscaled_size(
    width: u32,
    height: u32,
    min_height: u32,
    max_pixels: u64,
) -> Result<Option<u32>, EnhanceError> {
    if height == 0 || height >= min_height {
        return Ok(None);
    }

    let new_width = (width as u64 * min_height as u64 / height as u64).max(1);
    if new_width.saturating_mul(min_height as u64) > max_pixels || new_width > u32::MAX as u64 {
        return Err(EnhanceError::TooLarge {
            width: new_width,
            height: min_height,
            max_pixels,
        });
    }

    Ok(Some(new_width as u32))
}
