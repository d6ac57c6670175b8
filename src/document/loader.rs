//! Document loader
//!
//! Turns uploaded bytes into a sequence of RGB page images.

use image::RgbImage;

use super::error::Result;
use super::types::{DocumentKind, RasterOptions};

/// Load the pages of an uploaded document
///
/// PDFs yield one image per page (capped by `max_pages`); anything else is
/// decoded as a single image.
pub fn load_pages(
    data: &[u8],
    filename: &str,
    options: &RasterOptions,
    verbose: bool,
) -> Result<Vec<RgbImage>> {
    match DocumentKind::detect(filename, data) {
        DocumentKind::Pdf => {
            let pages = crate::mupdf::rasterize(data, options)?;
            stage_log!(
                verbose,
                pages = pages.len(),
                dpi = options.dpi,
                "Converted PDF to page images"
            );
            for (index, page) in pages.iter().enumerate() {
                log_page(verbose, index + 1, page);
            }
            Ok(pages)
        }
        DocumentKind::Image => {
            let page = decode_image(data)?;
            log_page(verbose, 1, &page);
            Ok(vec![page])
        }
    }
}

/// Decode a still image and normalize it to 8-bit RGB
pub fn decode_image(data: &[u8]) -> Result<RgbImage> {
    let img = image::load_from_memory(data)?;
    Ok(img.to_rgb8())
}

fn log_page(verbose: bool, page: usize, img: &RgbImage) {
    let (width, height) = img.dimensions();
    let mem_mb = (width as f64 * height as f64 * 3.0) / (1024.0 * 1024.0);
    stage_log!(
        verbose,
        page,
        width,
        height,
        mode = "RGB",
        "Loaded page (~{:.2} MB)",
        mem_mb
    );
}
