//! Document OCR Server Library
//!
//! Accepts a PDF or raster image, rasterizes and enhances every page, runs
//! OCR page by page and returns the merged, lightly normalized text.
//!
//! # Modules
//!
//! - `document`: Loader turning uploaded bytes into page images
//! - `enhance`: Filter chain preparing pages for recognition
//! - `ocr`: Engines and the per-page OCR runner
//! - `text`: Page aggregation and text normalization
//! - `pipeline`: The stages wired together
//! - `routes`: HTTP surface

/// Log at `info` for verbose (debug) requests, `debug` otherwise
macro_rules! stage_log {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

pub mod artifacts;
pub mod config;
pub mod document;
pub mod enhance;
pub mod error;
pub mod ocr;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod text;

mod mupdf;

pub use config::Config;
pub use pipeline::{DocumentResult, ExtractRequest, Pipeline, PipelineError};
pub use state::AppState;
