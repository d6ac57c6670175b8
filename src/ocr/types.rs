//! OCR Types

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What to do when a page's mean confidence is under the configured floor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidencePolicy {
    /// Log a warning and keep the text
    #[default]
    Lenient,
    /// Fail the whole request
    Strict,
}

impl FromStr for ConfidencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" | "warn" => Ok(Self::Lenient),
            "strict" | "fail" => Ok(Self::Strict),
            other => Err(format!("unknown confidence policy: {}", other)),
        }
    }
}

/// Recognition parameters for one request
///
/// Built through [`OcrConfig::new`], which validates every field, so an
/// engine never sees an out-of-range mode or an unsafe language string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrConfig {
    language: String,
    psm: u8,
    oem: u8,
    min_confidence: Option<u8>,
    policy: ConfidencePolicy,
}

impl OcrConfig {
    pub fn new(language: &str, psm: u8, oem: u8) -> Result<Self, OcrError> {
        validate_language(language)?;
        if psm > 13 {
            return Err(OcrError::InvalidConfig(format!(
                "page segmentation mode must be 0-13, got {}",
                psm
            )));
        }
        if oem > 3 {
            return Err(OcrError::InvalidConfig(format!(
                "engine mode must be 0-3, got {}",
                oem
            )));
        }

        Ok(Self {
            language: language.to_string(),
            psm,
            oem,
            min_confidence: None,
            policy: ConfidencePolicy::default(),
        })
    }

    /// Require a mean confidence of at least `minimum` (0-100)
    pub fn with_min_confidence(mut self, minimum: Option<u8>) -> Result<Self, OcrError> {
        if let Some(value) = minimum {
            if value > 100 {
                return Err(OcrError::InvalidConfig(format!(
                    "min_confidence must be 0-100, got {}",
                    value
                )));
            }
        }
        self.min_confidence = minimum;
        Ok(self)
    }

    pub fn with_policy(mut self, policy: ConfidencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn psm(&self) -> u8 {
        self.psm
    }

    pub fn oem(&self) -> u8 {
        self.oem
    }

    pub fn min_confidence(&self) -> Option<u8> {
        self.min_confidence
    }

    pub fn policy(&self) -> ConfidencePolicy {
        self.policy
    }
}

/// Validate language code to prevent argument injection
///
/// Accepts codes such as `eng`, `eng+deu` or `chi_sim`.
fn validate_language(lang: &str) -> Result<(), OcrError> {
    if lang.is_empty() || lang.len() > 20 {
        return Err(OcrError::InvalidLanguage(format!(
            "invalid language code length: {:?}",
            lang
        )));
    }
    for c in lang.chars() {
        if !c.is_ascii_alphanumeric() && c != '+' && c != '_' {
            return Err(OcrError::InvalidLanguage(format!(
                "invalid character in language code: {:?}",
                c
            )));
        }
    }
    Ok(())
}

/// Raw engine output for one image
#[derive(Debug, Clone, Serialize)]
pub struct OcrResult {
    /// Recognized text
    pub text: String,
    /// Mean confidence (0-100)
    pub confidence: f32,
}

/// Text recognized on one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageText {
    /// Trimmed page text
    pub text: String,
    /// Mean confidence reported by the engine
    pub confidence: f32,
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR engine not available: {0}")]
    EngineUnavailable(String),

    #[error("OCR processing failed: {0}")]
    Engine(String),

    #[error("Low OCR confidence ({confidence} < {minimum})")]
    LowConfidence { confidence: f32, minimum: u8 },

    #[error("Invalid language: {0}")]
    InvalidLanguage(String),

    #[error("Invalid OCR configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_validation() {
        assert!(OcrConfig::new("eng", 3, 3).is_ok());
        assert!(OcrConfig::new("eng+deu", 3, 3).is_ok());
        assert!(OcrConfig::new("chi_sim", 3, 3).is_ok());
        assert!(matches!(
            OcrConfig::new("", 3, 3),
            Err(OcrError::InvalidLanguage(_))
        ));
        assert!(matches!(
            OcrConfig::new("eng --psm 0", 3, 3),
            Err(OcrError::InvalidLanguage(_))
        ));
        assert!(OcrConfig::new("a_very_long_language_code", 3, 3).is_err());
    }

    #[test]
    fn test_mode_ranges() {
        assert!(OcrConfig::new("eng", 13, 3).is_ok());
        assert!(matches!(
            OcrConfig::new("eng", 14, 3),
            Err(OcrError::InvalidConfig(_))
        ));
        assert!(OcrConfig::new("eng", 3, 4).is_err());
    }

    #[test]
    fn test_min_confidence_range() {
        let base = OcrConfig::new("eng", 3, 3).unwrap();
        assert!(base.clone().with_min_confidence(Some(100)).is_ok());
        assert!(base.clone().with_min_confidence(Some(101)).is_err());
        assert_eq!(base.with_min_confidence(None).unwrap().min_confidence(), None);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("strict".parse::<ConfidencePolicy>(), Ok(ConfidencePolicy::Strict));
        assert_eq!("Lenient".parse::<ConfidencePolicy>(), Ok(ConfidencePolicy::Lenient));
        assert!("sometimes".parse::<ConfidencePolicy>().is_err());
    }
}
