//! Configuration management for the document OCR server

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::ocr::ConfidencePolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub pdf: PdfConfig,
    pub enhance: EnhanceConfig,
    pub ocr: OcrSettings,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Request body limit for uploads
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PdfConfig {
    /// Rasterization resolution
    pub dpi: u32,
    /// Optional cap on rendered pages
    pub max_pages: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnhanceConfig {
    /// Largest page the upscale step may produce, in pixels
    pub max_pixels: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrSettings {
    pub default_language: String,
    /// Page segmentation mode (0-13)
    pub psm: u8,
    /// OCR engine mode (0-3)
    pub oem: u8,
    pub confidence_policy: ConfidencePolicy,
    pub tessdata_dir: Option<PathBuf>,
    /// Executable used by the command-line backend
    pub tesseract_bin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DebugConfig {
    /// Where debug snapshots of enhanced pages are written
    pub artifact_dir: PathBuf,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                max_upload_bytes: 200 * 1024 * 1024,
            },
            pdf: PdfConfig {
                dpi: 300,
                max_pages: None,
            },
            enhance: EnhanceConfig {
                max_pixels: 100_000_000,
            },
            ocr: OcrSettings {
                default_language: "eng".to_string(),
                psm: 3,
                oem: 3,
                confidence_policy: ConfidencePolicy::Lenient,
                tessdata_dir: None,
                tesseract_bin: "tesseract".to_string(),
            },
            debug: DebugConfig {
                artifact_dir: env::temp_dir(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let config = Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT")?.unwrap_or(defaults.server.port),
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES")?
                    .unwrap_or(defaults.server.max_upload_bytes),
            },
            pdf: PdfConfig {
                dpi: parse_var("PDF_DPI")?.unwrap_or(defaults.pdf.dpi),
                max_pages: parse_var("PDF_MAX_PAGES")?,
            },
            enhance: EnhanceConfig {
                max_pixels: parse_var("ENHANCE_MAX_PIXELS")?
                    .unwrap_or(defaults.enhance.max_pixels),
            },
            ocr: OcrSettings {
                default_language: env::var("OCR_DEFAULT_LANG")
                    .unwrap_or(defaults.ocr.default_language),
                psm: parse_var("OCR_PSM")?.unwrap_or(defaults.ocr.psm),
                oem: parse_var("OCR_OEM")?.unwrap_or(defaults.ocr.oem),
                confidence_policy: parse_var("OCR_CONFIDENCE_POLICY")?
                    .unwrap_or(defaults.ocr.confidence_policy),
                tessdata_dir: env::var("OCR_TESSDATA_DIR").ok().map(PathBuf::from),
                tesseract_bin: env::var("OCR_TESSERACT_BIN")
                    .unwrap_or(defaults.ocr.tesseract_bin),
            },
            debug: DebugConfig {
                artifact_dir: env::var("DEBUG_ARTIFACT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.debug.artifact_dir),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check ranges that the pipeline relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("PDF_DPI", self.pdf.dpi as u64, 1, 1200)?;
        check_range("OCR_PSM", self.ocr.psm as u64, 0, 13)?;
        check_range("OCR_OEM", self.ocr.oem as u64, 0, 3)?;
        check_range("ENHANCE_MAX_PIXELS", self.enhance.max_pixels, 1, u64::MAX)?;
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(None),
    }
}

fn check_range(name: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}
