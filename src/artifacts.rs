//! Debug artifact sinks
//!
//! When a request asks for debug output, the pipeline hands every enhanced
//! page to the configured sink. Sinks are injected through the pipeline, so
//! nothing writes to a hardcoded path.

use std::path::PathBuf;

use image::GrayImage;

/// Artifact write errors
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Failed to create artifact directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Destination for debug snapshots
pub trait ArtifactSink: Send + Sync {
    /// Store the enhanced image of a page (1-based)
    fn store_enhanced(&self, page: usize, image: &GrayImage) -> Result<PathBuf, ArtifactError>;
}

/// Writes PNG snapshots into a directory
///
/// Every request shares the same file names, so concurrent debug requests
/// overwrite each other's snapshots (last writer wins).
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArtifactSink for DirectorySink {
    fn store_enhanced(&self, page: usize, image: &GrayImage) -> Result<PathBuf, ArtifactError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| ArtifactError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(format!("page-{}-enhanced.png", page));
        image
            .save_with_format(&path, image::ImageFormat::Png)
            .map_err(|source| ArtifactError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }
}
