//! Page rasterization

use image::RgbImage;
use mupdf::{Colorspace, Document, Matrix};

use crate::document::{DocumentError, RasterOptions, Result};

/// MIME type MuPDF uses to pick its PDF handler
const MIME_PDF: &str = "application/pdf";

/// Render every page (up to `max_pages`) into an RGB image, in page order
pub fn rasterize(data: &[u8], options: &RasterOptions) -> Result<Vec<RgbImage>> {
    let doc = Document::from_bytes(data, MIME_PDF)?;
    let total = doc.page_count()?.max(0) as usize;
    let count = options.max_pages.map_or(total, |cap| cap.min(total));

    let scale = options.scale();
    let matrix = Matrix::new_scale(scale, scale);
    let colorspace = Colorspace::device_rgb();

    let mut pages = Vec::with_capacity(count);
    for index in 0..count {
        let render_err = |message: String| DocumentError::Render {
            page: index + 1,
            message,
        };

        let page = doc
            .load_page(index as i32)
            .map_err(|e| render_err(e.to_string()))?;
        let pixmap = page
            .to_pixmap(&matrix, &colorspace, false, true)
            .map_err(|e| render_err(e.to_string()))?;

        pages.push(pixmap_to_rgb(&pixmap).ok_or_else(|| {
            render_err("Failed to create image buffer".to_string())
        })?);
    }

    Ok(pages)
}

fn pixmap_to_rgb(pixmap: &mupdf::Pixmap) -> Option<RgbImage> {
    let width = pixmap.width() as u32;
    let height = pixmap.height() as u32;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    let mut rgb_buffer = Vec::with_capacity((width * height * 3) as usize);

    for y in 0..height as usize {
        for x in 0..width as usize {
            let offset = (y * width as usize + x) * n;
            // Gray pixmaps repeat the single channel
            let r = samples.get(offset).copied().unwrap_or(0);
            let (g, b) = if n >= 3 {
                (
                    samples.get(offset + 1).copied().unwrap_or(0),
                    samples.get(offset + 2).copied().unwrap_or(0),
                )
            } else {
                (r, r)
            };
            rgb_buffer.extend_from_slice(&[r, g, b]);
        }
    }

    RgbImage::from_raw(width, height, rgb_buffer)
}
