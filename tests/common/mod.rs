//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use image::{GrayImage, ImageFormat, Rgb, RgbImage};

use doc_ocr_server::artifacts::DirectorySink;
use doc_ocr_server::config::Config;
use doc_ocr_server::document::RasterOptions;
use doc_ocr_server::enhance::EnhanceOptions;
use doc_ocr_server::ocr::{ConfidencePolicy, OcrConfig, OcrEngine, OcrError, OcrResult};
use doc_ocr_server::pipeline::{OcrDefaults, Pipeline};
use doc_ocr_server::{routes, AppState};

/// Engine returning the same text and confidence for every page
pub struct MockEngine {
    pub text: String,
    pub confidence: f32,
}

impl MockEngine {
    pub fn new(text: &str, confidence: f32) -> Arc<Self> {
        Arc::new(Self {
            text: text.to_string(),
            confidence,
        })
    }
}

impl OcrEngine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn recognize(&self, _image: &GrayImage, _config: &OcrConfig) -> Result<OcrResult, OcrError> {
        Ok(OcrResult {
            text: self.text.clone(),
            confidence: self.confidence,
        })
    }
}

/// Small windows keep the denoiser cheap on test images
pub fn fast_enhance() -> EnhanceOptions {
    EnhanceOptions {
        search_window: 5,
        template_window: 3,
        min_height: 40,
        max_pixels: 1_000_000,
        ..EnhanceOptions::default()
    }
}

/// Router around a mock engine, rendering PDFs at 72 DPI
pub fn app(engine: Arc<dyn OcrEngine>, policy: ConfidencePolicy) -> Router {
    routes::router(AppState::from_parts(Config::default(), pipeline(engine, policy)))
}

/// Like [`app`], with debug snapshots written under `dir`
pub fn app_with_artifacts(engine: Arc<dyn OcrEngine>, dir: &Path) -> Router {
    let pipeline = pipeline(engine, ConfidencePolicy::Lenient)
        .with_artifacts(Arc::new(DirectorySink::new(dir)));
    routes::router(AppState::from_parts(Config::default(), pipeline))
}

fn pipeline(engine: Arc<dyn OcrEngine>, policy: ConfidencePolicy) -> Pipeline {
    Pipeline::new(engine)
        .with_raster(RasterOptions {
            dpi: 72,
            max_pages: None,
        })
        .with_enhance(fast_enhance())
        .with_ocr_defaults(OcrDefaults {
            policy,
            ..OcrDefaults::default()
        })
}

/// Encode a flat light-gray PNG
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([235, 235, 235]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("encode png");
    out
}

/// Build a PDF with `pages` white pages of `width` x `height` points
///
/// Page `i` (0-based) carries a black bar `10 * (i + 1)` points wide whose
/// top edge sits 10 points below the top of the page, 10 points tall.
pub fn bar_pdf(pages: usize, width: u32, height: u32) -> Vec<u8> {
    let page_ids: Vec<usize> = (0..pages).map(|i| 3 + 2 * i).collect();

    let mut objects: Vec<String> = Vec::new();
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids, pages
    ));

    for (i, id) in page_ids.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Contents {} 0 R /Resources << >> >>",
            width,
            height,
            id + 1
        ));
        let content = format!(
            "0 0 0 rg\n0 {} {} 10 re\nf\n",
            height - 20,
            10 * (i + 1)
        );
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}endstream",
            content.len(),
            content
        ));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref_at = out.len();
    out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    out.push_str("0000000000 65535 f \n");
    for offset in &offsets {
        out.push_str(&format!("{:010} 00000 n \n", offset));
    }
    out.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_at
    ));

    out.into_bytes()
}

/// Count pixels darker than mid-gray in one row
pub fn dark_pixels_in_row(image: &RgbImage, row: u32) -> usize {
    (0..image.width())
        .filter(|&x| image.get_pixel(x, row).0[0] < 128)
        .count()
}
