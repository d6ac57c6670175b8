//! OCR Module
//!
//! Runs a text-recognition engine over enhanced page images.
//!
//! Supported engines:
//! - Tesseract executable (always available)
//! - libtesseract (`ocr-tesseract` feature)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use doc_ocr_server::ocr::{recognize_pages, ConfidencePolicy, OcrConfig, TesseractCli};
//!
//! let engine = TesseractCli::new("tesseract", None);
//! let config = OcrConfig::new("eng", 3, 3)?
//!     .with_min_confidence(Some(60))?
//!     .with_policy(ConfidencePolicy::Strict);
//!
//! let pages = recognize_pages(&engine, &enhanced, &config, false)?;
//! ```

mod provider;
mod service;
mod types;

pub use provider::{engine_from_config, mean_word_confidence, OcrEngine, TesseractCli};
pub use service::{recognize_page, recognize_pages};
pub use types::{ConfidencePolicy, OcrConfig, OcrError, OcrResult, PageText};

#[cfg(feature = "ocr-tesseract")]
pub use provider::TesseractLib;
