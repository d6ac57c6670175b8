//! Application state management

use std::sync::Arc;

use crate::artifacts::DirectorySink;
use crate::config::Config;
use crate::ocr::{self, OcrEngine};
use crate::pipeline::Pipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Create the state with the engine chosen for this build
    pub fn new(config: Config) -> Self {
        let engine = ocr::engine_from_config(&config.ocr);
        Self::with_engine(config, engine)
    }

    /// Create the state around a specific OCR engine
    pub fn with_engine(config: Config, engine: Arc<dyn OcrEngine>) -> Self {
        let sink = Arc::new(DirectorySink::new(config.debug.artifact_dir.clone()));
        let pipeline = Pipeline::from_config(&config, engine).with_artifacts(sink);
        Self::from_parts(config, pipeline)
    }

    /// Create the state from a fully configured pipeline
    pub fn from_parts(config: Config, pipeline: Pipeline) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline: Arc::new(pipeline),
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the extraction pipeline
    pub fn pipeline(&self) -> Arc<Pipeline> {
        self.inner.pipeline.clone()
    }
}
