//! Text assembly
//!
//! Joins per-page OCR output into one document and applies light clean-up.

mod merge;
mod normalize;

pub use merge::{merge_page_texts, page_marker};
pub use normalize::{normalize_ocr_text, preview, PREVIEW_CHARS};
