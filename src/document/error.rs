//! Document error types
//!
//! Every variant is a decode failure: the uploaded bytes could not be turned
//! into page images.

use thiserror::Error;

/// Document loading error
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Bytes are neither a PDF nor a supported image
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// MuPDF could not open the document
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// Image decoder rejected the bytes
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// A page failed to rasterize
    #[error("Render error on page {page}: {message}")]
    Render { page: usize, message: String },
}

/// Result type alias for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

impl From<mupdf::Error> for DocumentError {
    fn from(err: mupdf::Error) -> Self {
        DocumentError::InvalidPdf(err.to_string())
    }
}

impl From<image::ImageError> for DocumentError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Unsupported(e) => DocumentError::UnsupportedFormat(e.to_string()),
            other => DocumentError::InvalidImage(other.to_string()),
        }
    }
}
