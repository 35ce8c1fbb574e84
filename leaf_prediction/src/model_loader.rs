use crate::{config::ModelConfig, ort_service::OrtModelService};
use std::{
    path::PathBuf,
    sync::{Arc, OnceLock},
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelLoadError {
    #[error("Model file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("Failed to build inference session: {0}")]
    Session(String),
    #[error("Model graph declares no outputs")]
    MissingOutput,
}

/// Lazily loads a model exactly once and hands out the shared handle.
///
/// Both outcomes are cached: after a failed load every call returns `None`
/// and [`ModelLoader::load_error`] keeps the cause for reporting.
#[derive(Debug)]
pub struct ModelLoader<M> {
    cell: OnceLock<Result<Arc<M>, ModelLoadError>>,
}

impl<M> Default for ModelLoader<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> ModelLoader<M> {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Runs `load` on the first call only. Concurrent first callers wait for
    /// the same initialization.
    pub fn get_or_load<F>(&self, load: F) -> Option<Arc<M>>
    where
        F: FnOnce() -> Result<M, ModelLoadError>,
    {
        let loaded = self.cell.get_or_init(|| match load() {
            Ok(model) => {
                tracing::info!("Model loaded");
                Ok(Arc::new(model))
            }
            Err(e) => {
                tracing::error!("Failed to load model: {}", e);
                Err(e)
            }
        });

        loaded.as_ref().ok().cloned()
    }

    /// The cached handle, without triggering a load.
    pub fn get(&self) -> Option<Arc<M>> {
        self.cell.get().and_then(|loaded| loaded.as_ref().ok().cloned())
    }

    pub fn load_error(&self) -> Option<&ModelLoadError> {
        self.cell.get().and_then(|loaded| loaded.as_ref().err())
    }

    pub fn is_loaded(&self) -> bool {
        self.get().is_some()
    }
}

static MODEL: ModelLoader<OrtModelService> = ModelLoader::new();

/// The process-wide loader backing [`load_model`].
pub fn global_loader() -> &'static ModelLoader<OrtModelService> {
    &MODEL
}

/// Loads the ONNX classifier once per process.
///
/// Later calls return the same handle and ignore `model_config`. A failed load
/// is logged and returns `None`; it is not retried.
pub fn load_model(model_config: &ModelConfig) -> Option<Arc<OrtModelService>> {
    MODEL.get_or_load(|| OrtModelService::new(model_config))
}

pub fn model_load_error() -> Option<&'static ModelLoadError> {
    MODEL.load_error()
}
