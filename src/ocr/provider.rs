//! OCR Engines
//!
//! Defines the engine trait and the Tesseract backends behind it.

use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use image::GrayImage;

use super::types::{OcrConfig, OcrError, OcrResult};
use crate::config::OcrSettings;

/// OCR engine trait
///
/// Engines are called from blocking worker threads, one page at a time.
pub trait OcrEngine: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Check if the engine can run on this host
    fn is_available(&self) -> bool;

    /// Recognize the text of one enhanced page
    fn recognize(&self, image: &GrayImage, config: &OcrConfig) -> Result<OcrResult, OcrError>;
}

/// Pick the engine for this build
///
/// Uses libtesseract when compiled with `ocr-tesseract`, the Tesseract
/// executable otherwise.
pub fn engine_from_config(settings: &OcrSettings) -> Arc<dyn OcrEngine> {
    #[cfg(feature = "ocr-tesseract")]
    {
        Arc::new(TesseractLib::new(
            settings.tessdata_dir.clone(),
            &settings.default_language,
        ))
    }

    #[cfg(not(feature = "ocr-tesseract"))]
    {
        Arc::new(TesseractCli::new(
            &settings.tesseract_bin,
            settings.tessdata_dir.clone(),
        ))
    }
}

/// Tesseract driven through its command-line executable
pub struct TesseractCli {
    binary: String,
    tessdata_dir: Option<PathBuf>,
}

impl TesseractCli {
    pub fn new(binary: &str, tessdata_dir: Option<PathBuf>) -> Self {
        Self {
            binary: binary.to_string(),
            tessdata_dir,
        }
    }
}

impl OcrEngine for TesseractCli {
    fn name(&self) -> &'static str {
        "tesseract-cli"
    }

    fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .is_ok_and(|output| output.status.success())
    }

    fn recognize(&self, image: &GrayImage, config: &OcrConfig) -> Result<OcrResult, OcrError> {
        let workdir = tempfile::Builder::new()
            .prefix("ocr-page-")
            .tempdir()
            .map_err(|e| OcrError::Engine(format!("Failed to create temp dir: {}", e)))?;

        let input_path = workdir.path().join("page.png");
        let output_base = workdir.path().join("page");

        image
            .save_with_format(&input_path, image::ImageFormat::Png)
            .map_err(|e| OcrError::Engine(format!("Failed to write page image: {}", e)))?;

        let mut cmd = Command::new(&self.binary);
        if let Some(dir) = &self.tessdata_dir {
            cmd.arg("--tessdata-dir").arg(dir);
        }
        cmd.arg(&input_path)
            .arg(&output_base)
            .arg("-l")
            .arg(config.language())
            .arg("--psm")
            .arg(config.psm().to_string())
            .arg("--oem")
            .arg(config.oem().to_string())
            // Plain text plus per-word confidences
            .arg("txt")
            .arg("tsv");

        let output = cmd.output().map_err(|e| {
            OcrError::EngineUnavailable(format!("Failed to run {}: {}", self.binary, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        let text = std::fs::read_to_string(output_base.with_extension("txt"))
            .map_err(|e| OcrError::Engine(format!("Failed to read text output: {}", e)))?;
        let tsv = std::fs::read_to_string(output_base.with_extension("tsv"))
            .map_err(|e| OcrError::Engine(format!("Failed to read TSV output: {}", e)))?;

        Ok(OcrResult {
            text,
            confidence: mean_word_confidence(&tsv),
        })
    }
}

/// Mean confidence of the recognized words in Tesseract TSV output
///
/// Only word rows (level 5) with a non-negative confidence and non-empty
/// text count. Returns 0 when no words were recognized.
pub fn mean_word_confidence(tsv: &str) -> f32 {
    let mut sum = 0.0f32;
    let mut count = 0usize;

    for line in tsv.lines() {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 12 || cols[0].trim() != "5" {
            continue;
        }
        let Ok(conf) = cols[10].trim().parse::<f32>() else {
            continue;
        };
        if conf < 0.0 || cols[11].trim().is_empty() {
            continue;
        }
        sum += conf;
        count += 1;
    }

    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

/// Tesseract linked as a library
#[cfg(feature = "ocr-tesseract")]
pub struct TesseractLib {
    tessdata_dir: Option<String>,
    /// Language whose data must load for the engine to count as available
    default_language: String,
}

#[cfg(feature = "ocr-tesseract")]
impl TesseractLib {
    pub fn new(tessdata_dir: Option<PathBuf>, default_language: &str) -> Self {
        Self {
            tessdata_dir: tessdata_dir.map(|p| p.to_string_lossy().into_owned()),
            default_language: default_language.to_string(),
        }
    }
}

#[cfg(feature = "ocr-tesseract")]
impl OcrEngine for TesseractLib {
    fn name(&self) -> &'static str {
        "tesseract-lib"
    }

    fn is_available(&self) -> bool {
        tesseract::Tesseract::new(
            self.tessdata_dir.as_deref(),
            Some(self.default_language.as_str()),
        )
        .is_ok()
    }

    fn recognize(&self, image: &GrayImage, config: &OcrConfig) -> Result<OcrResult, OcrError> {
        use tesseract::{OcrEngineMode, PageSegMode, Tesseract};

        let oem = match config.oem() {
            0 => OcrEngineMode::TesseractOnly,
            1 => OcrEngineMode::LstmOnly,
            2 => OcrEngineMode::TesseractLstmCombined,
            _ => OcrEngineMode::Default,
        };
        let psm = match config.psm() {
            0 => PageSegMode::PsmOsdOnly,
            1 => PageSegMode::PsmAutoOsd,
            2 => PageSegMode::PsmAutoOnly,
            4 => PageSegMode::PsmSingleColumn,
            5 => PageSegMode::PsmSingleBlockVertText,
            6 => PageSegMode::PsmSingleBlock,
            7 => PageSegMode::PsmSingleLine,
            8 => PageSegMode::PsmSingleWord,
            9 => PageSegMode::PsmCircleWord,
            10 => PageSegMode::PsmSingleChar,
            11 => PageSegMode::PsmSparseText,
            12 => PageSegMode::PsmSparseTextOsd,
            13 => PageSegMode::PsmRawLine,
            _ => PageSegMode::PsmAuto,
        };

        let mut tess =
            Tesseract::new_with_oem(self.tessdata_dir.as_deref(), Some(config.language()), oem)
                .map_err(|e| OcrError::Engine(format!("Failed to initialize Tesseract: {}", e)))?;
        tess.set_page_seg_mode(psm);

        let (width, height) = image.dimensions();
        let mut tess = tess
            .set_frame(image.as_raw(), width as i32, height as i32, 1, width as i32)
            .map_err(|e| OcrError::Engine(format!("Failed to set image: {}", e)))?;

        let text = tess
            .get_text()
            .map_err(|e| OcrError::Engine(format!("Failed to read text: {}", e)))?;
        let confidence = tess.mean_text_conf().clamp(0, 100) as f32;

        Ok(OcrResult { text, confidence })
    }
}

/// Engine returning a canned result, for tests
#[cfg(test)]
pub struct MockEngine {
    pub response: OcrResult,
    pub available: bool,
}

#[cfg(test)]
impl OcrEngine for MockEngine {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn recognize(&self, _image: &GrayImage, _config: &OcrConfig) -> Result<OcrResult, OcrError> {
        Ok(self.response.clone())
    }
}
