//! Document loading
//!
//! Dispatches on the upload's type: PDFs are rasterized page by page through
//! MuPDF at a fixed resolution, everything else is decoded as one image.
//!
//! ```rust,ignore
//! use doc_ocr_server::document::{load_pages, RasterOptions};
//!
//! let pages = load_pages(&bytes, "scan.pdf", &RasterOptions::default(), false)?;
//! ```

mod error;
mod loader;
mod types;

pub use error::{DocumentError, Result};
pub use loader::{decode_image, load_pages};
pub use types::{DocumentKind, RasterOptions};
