//! Extraction pipeline
//!
//! Drives one upload through every stage, strictly in sequence:
//!
//! ```text
//! bytes → load_pages → enhance_pages → recognize_pages → merge → normalize
//! ```
//!
//! Any stage failure aborts the request; there are no partial results.

use std::sync::Arc;

use image::GrayImage;
use crate::artifacts::ArtifactSink;
use crate::config::Config;
use crate::document::{self, DocumentError, RasterOptions};
use crate::enhance::{self, EnhanceError, EnhanceOptions};
use crate::ocr::{self, ConfidencePolicy, OcrConfig, OcrEngine, OcrError};
use crate::text;

/// Pipeline error
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Enhance(#[from] EnhanceError),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("Pipeline task failed: {0}")]
    Task(String),
}

/// One extraction job
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub filename: String,
    pub data: Vec<u8>,
    /// Falls back to the pipeline's default language
    pub language: Option<String>,
    pub min_confidence: Option<u8>,
    /// Verbose logging plus debug snapshots
    pub debug: bool,
}

/// Terminal output of the pipeline
#[derive(Debug, Clone)]
pub struct DocumentResult {
    pub filename: String,
    pub pages: usize,
    pub lang: String,
    pub raw_text: String,
    pub normalized_text: String,
    /// First [`text::PREVIEW_CHARS`] characters of the normalized text
    pub preview: String,
}

/// OCR parameters that do not come from the request
#[derive(Debug, Clone)]
pub struct OcrDefaults {
    pub language: String,
    pub psm: u8,
    pub oem: u8,
    pub policy: ConfidencePolicy,
}

impl Default for OcrDefaults {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            psm: 3,
            oem: 3,
            policy: ConfidencePolicy::Lenient,
        }
    }
}

/// Configured extraction pipeline, shared by all requests
pub struct Pipeline {
    engine: Arc<dyn OcrEngine>,
    raster: RasterOptions,
    enhance: EnhanceOptions,
    ocr: OcrDefaults,
    artifacts: Option<Arc<dyn ArtifactSink>>,
}

impl Pipeline {
    /// Create a pipeline with default options around an engine
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self {
            engine,
            raster: RasterOptions::default(),
            enhance: EnhanceOptions::default(),
            ocr: OcrDefaults::default(),
            artifacts: None,
        }
    }

    /// Create a pipeline from the server configuration
    pub fn from_config(config: &Config, engine: Arc<dyn OcrEngine>) -> Self {
        Self::new(engine)
            .with_raster(RasterOptions {
                dpi: config.pdf.dpi,
                max_pages: config.pdf.max_pages,
            })
            .with_enhance(EnhanceOptions {
                max_pixels: config.enhance.max_pixels,
                ..EnhanceOptions::default()
            })
            .with_ocr_defaults(OcrDefaults {
                language: config.ocr.default_language.clone(),
                psm: config.ocr.psm,
                oem: config.ocr.oem,
                policy: config.ocr.confidence_policy,
            })
    }

    pub fn with_raster(mut self, raster: RasterOptions) -> Self {
        self.raster = raster;
        self
    }

    pub fn with_enhance(mut self, enhance: EnhanceOptions) -> Self {
        self.enhance = enhance;
        self
    }

    pub fn with_ocr_defaults(mut self, ocr: OcrDefaults) -> Self {
        self.ocr = ocr;
        self
    }

    pub fn with_artifacts(mut self, sink: Arc<dyn ArtifactSink>) -> Self {
        self.artifacts = Some(sink);
        self
    }

    pub fn engine(&self) -> &dyn OcrEngine {
        self.engine.as_ref()
    }

    /// Run every stage on the calling thread
    pub fn run(&self, request: &ExtractRequest) -> Result<DocumentResult, PipelineError> {
        let verbose = request.debug;
        let language = request
            .language
            .as_deref()
            .unwrap_or(&self.ocr.language)
            .to_string();

        // Reject bad parameters before any expensive work
        let ocr_config = OcrConfig::new(&language, self.ocr.psm, self.ocr.oem)?
            .with_min_confidence(request.min_confidence)?
            .with_policy(self.ocr.policy);

        let pages =
            document::load_pages(&request.data, &request.filename, &self.raster, verbose)?;
        let enhanced = enhance::enhance_pages(&pages, &self.enhance, verbose)?;
        drop(pages);

        if verbose {
            self.snapshot(&enhanced);
        }

        let page_texts = ocr::recognize_pages(self.engine.as_ref(), &enhanced, &ocr_config, verbose)?;

        let raw_text = text::merge_page_texts(&page_texts);
        let normalized_text = text::normalize_ocr_text(&raw_text);

        Ok(DocumentResult {
            filename: request.filename.clone(),
            pages: page_texts.len(),
            lang: language,
            preview: text::preview(&normalized_text),
            raw_text,
            normalized_text,
        })
    }

    /// Run on tokio's blocking pool, keeping the caller's tracing span
    pub async fn run_blocking(
        self: Arc<Self>,
        request: ExtractRequest,
    ) -> Result<DocumentResult, PipelineError> {
        let span = tracing::Span::current();
        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            self.run(&request)
        })
        .await
        .map_err(|e| PipelineError::Task(format!("Task join error: {}", e)))?
    }

    fn snapshot(&self, enhanced: &[GrayImage]) {
        let Some(sink) = &self.artifacts else {
            return;
        };
        for (index, image) in enhanced.iter().enumerate() {
            match sink.store_enhanced(index + 1, image) {
                Ok(path) => tracing::info!("Saved enhanced image to {}", path.display()),
                Err(e) => tracing::warn!("Failed to save debug image: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::DirectorySink;
    use crate::ocr::OcrResult;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Records the size of every page it sees
    struct RecordingEngine {
        text: String,
        confidence: f32,
        seen: Mutex<Vec<(u32, u32)>>,
    }

    impl RecordingEngine {
        fn new(text: &str, confidence: f32) -> Arc<Self> {
            Arc::new(Self {
                text: text.to_string(),
                confidence,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl OcrEngine for RecordingEngine {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn recognize(&self, image: &GrayImage, _config: &OcrConfig) -> Result<OcrResult, OcrError> {
            self.seen.lock().unwrap().push(image.dimensions());
            Ok(OcrResult {
                text: self.text.clone(),
                confidence: self.confidence,
            })
        }
    }

    fn fast_enhance() -> EnhanceOptions {
        EnhanceOptions {
            search_window: 5,
            template_window: 3,
            min_height: 40,
            ..EnhanceOptions::default()
        }
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([240, 240, 240]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn request(data: Vec<u8>) -> ExtractRequest {
        ExtractRequest {
            filename: "scan.png".to_string(),
            data,
            language: None,
            min_confidence: None,
            debug: false,
        }
    }

    #[test]
    fn test_single_image_end_to_end() {
        let engine = RecordingEngine::new("  HELLO   WORLD \n", 93.0);
        let pipeline = Pipeline::new(engine.clone()).with_enhance(fast_enhance());

        let result = pipeline.run(&request(png(30, 20))).unwrap();

        assert_eq!(result.pages, 1);
        assert_eq!(result.lang, "eng");
        assert_eq!(result.raw_text, "--- Page 1 ---\nHELLO   WORLD");
        assert_eq!(result.normalized_text, "HELLO WORLD");
        assert_eq!(result.preview, "HELLO WORLD");
        // 30x20 upscaled to the 40px floor
        assert_eq!(*engine.seen.lock().unwrap(), vec![(60, 40)]);
    }

    #[test]
    fn test_invalid_language_fails_before_decoding() {
        let engine = RecordingEngine::new("x", 90.0);
        let pipeline = Pipeline::new(engine.clone()).with_enhance(fast_enhance());

        let mut req = request(b"garbage".to_vec());
        req.language = Some("eng; rm -rf".to_string());

        let err = pipeline.run(&req).unwrap_err();
        assert!(matches!(err, PipelineError::Ocr(OcrError::InvalidLanguage(_))));
        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_garbage_bytes_fail_with_decode_error() {
        let pipeline = Pipeline::new(RecordingEngine::new("x", 90.0));
        let err = pipeline.run(&request(b"garbage".to_vec())).unwrap_err();
        assert!(matches!(err, PipelineError::Document(_)));
        assert!(!err.to_string().is_empty());
    }

    #[test]
    fn test_strict_policy_fails_request() {
        let pipeline = Pipeline::new(RecordingEngine::new("faint", 30.0))
            .with_enhance(fast_enhance())
            .with_enhance(EnhanceOptions {
                max_pixels: config.enhance.max_pixels,
                ..EnhanceOptions::default()
            })
            .with_ocr_defaults(OcrDefaults {
                policy: ConfidencePolicy::Strict,
                ..OcrDefaults::default()
            });

        let mut req = request(png(10, 10));
        req.min_confidence = Some(50);

        let err = pipeline.run(&req).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Ocr(OcrError::LowConfidence { minimum: 50, .. })
        ));
    }

    #[test]
    fn test_lenient_policy_returns_text_unchanged() {
        let pipeline =
            Pipeline::new(RecordingEngine::new("faint", 30.0)).with_enhance(fast_enhance());

        let mut req = request(png(10, 10));
        req.min_confidence = Some(50);

        let result = pipeline.run(&req).unwrap();
        assert_eq!(result.normalized_text, "faint");
    }

    #[test]
    fn test_debug_writes_snapshots() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(RecordingEngine::new("x", 90.0))
            .with_enhance(fast_enhance())
            .with_artifacts(Arc::new(DirectorySink::new(tmp.path())));

        let mut req = request(png(10, 10));
        req.debug = true;
        pipeline.run(&req).unwrap();

        assert!(tmp.path().join("page-1-enhanced.png").exists());
    }

    #[test]
    fn test_no_snapshots_without_debug() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(RecordingEngine::new("x", 90.0))
            .with_enhance(fast_enhance())
            .with_artifacts(Arc::new(DirectorySink::new(tmp.path())));

        pipeline.run(&request(png(10, 10))).unwrap();

        assert!(!tmp.path().join("page-1-enhanced.png").exists());
    }

    #[test]
    fn test_oversized_upscale_fails_request() {
        let engine = RecordingEngine::new("x", 90.0);
        let pipeline = Pipeline::new(engine.clone()).with_enhance(EnhanceOptions {
            max_pixels: 1_000,
            ..fast_enhance()
        });

        // 400x4 would be upscaled to 4000x40
        let err = pipeline.run(&request(png(400, 4))).unwrap_err();
        assert!(matches!(err, PipelineError::Enhance(EnhanceError::TooLarge { .. })));
        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_blocking() {
        let pipeline = Arc::new(
            Pipeline::new(RecordingEngine::new("async", 90.0)).with_enhance(fast_enhance()),
        );
        let result = pipeline.run_blocking(request(png(8, 8))).await.unwrap();
        assert_eq!(result.pages, 1);
        assert_eq!(result.normalized_text, "async");
    }
}
