//! OCR runner
//!
//! Applies an engine to enhanced pages and enforces the confidence policy.

use std::collections::BTreeMap;

use image::GrayImage;

use super::{
    provider::OcrEngine,
    types::{ConfidencePolicy, OcrConfig, OcrError, PageText},
};

/// Recognize one enhanced page
///
/// The returned text is trimmed. A mean confidence strictly below the
/// configured minimum fails under [`ConfidencePolicy::Strict`] and is only
/// logged under [`ConfidencePolicy::Lenient`].
pub fn recognize_page(
    engine: &dyn OcrEngine,
    image: &GrayImage,
    config: &OcrConfig,
    verbose: bool,
) -> Result<PageText, OcrError> {
    let result = engine.recognize(image, config).map_err(|e| {
        tracing::error!(engine = engine.name(), "OCR failed: {}", e);
        e
    })?;

    stage_log!(
        verbose,
        engine = engine.name(),
        confidence = result.confidence,
        chars = result.text.chars().count(),
        "OCR completed"
    );

    if let Some(minimum) = config.min_confidence() {
        if result.confidence < minimum as f32 {
            match config.policy() {
                ConfidencePolicy::Strict => {
                    return Err(OcrError::LowConfidence {
                        confidence: result.confidence,
                        minimum,
                    });
                }
                ConfidencePolicy::Lenient => {
                    tracing::warn!(
                        "Low OCR confidence ({} < {}), keeping text",
                        result.confidence,
                        minimum
                    );
                }
            }
        }
    }

    Ok(PageText {
        text: result.text.trim().to_string(),
        confidence: result.confidence,
    })
}

/// Recognize pages in order, keyed by 1-based page number
///
/// Pages are processed sequentially; the first failure aborts the batch.
pub fn recognize_pages(
    engine: &dyn OcrEngine,
    images: &[GrayImage],
    config: &OcrConfig,
    verbose: bool,
) -> Result<BTreeMap<usize, PageText>, OcrError> {
    let total = images.len();
    let mut pages = BTreeMap::new();

    for (index, image) in images.iter().enumerate() {
        let page = index + 1;
        stage_log!(verbose, page, total, "Processing page");
        pages.insert(page, recognize_page(engine, image, config, verbose)?);
    }

    stage_log!(verbose, pages = pages.len(), "Extracted text from all pages");
    Ok(pages)
}
