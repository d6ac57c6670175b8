//! Document types

/// How uploaded bytes are turned into pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Rasterized page by page
    Pdf,
    /// Decoded as a single still image
    Image,
}

impl DocumentKind {
    /// Detect the kind from the upload's filename and leading bytes
    ///
    /// The filename wins when it says PDF (by extension or guessed MIME
    /// type); otherwise the `%PDF` magic decides. Anything else is handed to
    /// the image decoder, which reports its own error for garbage.
    pub fn detect(filename: &str, bytes: &[u8]) -> Self {
        if Self::filename_is_pdf(filename) || Self::from_magic_bytes(bytes) == Some(Self::Pdf) {
            Self::Pdf
        } else {
            Self::Image
        }
    }

    fn filename_is_pdf(filename: &str) -> bool {
        if filename.to_ascii_lowercase().ends_with(".pdf") {
            return true;
        }
        mime_guess::from_path(filename)
            .first()
            .is_some_and(|mime| mime.essence_str() == "application/pdf")
    }

    /// Detect format from magic bytes
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        if bytes.starts_with(b"%PDF") {
            return Some(Self::Pdf);
        }

        None
    }
}

/// PDF rasterization options
#[derive(Debug, Clone, Copy)]
pub struct RasterOptions {
    /// Resolution in dots per inch
    pub dpi: u32,
    /// Render at most this many pages
    pub max_pages: Option<usize>,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            dpi: 300,
            max_pages: None,
        }
    }
}

impl RasterOptions {
    /// MuPDF works in points (1/72 inch)
    pub fn scale(&self) -> f32 {
        self.dpi as f32 / 72.0
    }
}
