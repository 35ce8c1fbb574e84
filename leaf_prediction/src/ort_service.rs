use crate::{
    config::ModelConfig,
    model_loader::ModelLoadError,
    model_service::ModelService,
    predictor::InferenceError,
    preprocess::ImageTensor,
};
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::{path::Path, sync::Mutex};

/// ONNX Runtime backed classifier.
///
/// The session needs exclusive access to run, so forward passes are
/// serialized through a mutex.
pub struct OrtModelService {
    session: Mutex<Session>,
    output_name: String,
}

impl std::fmt::Debug for OrtModelService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtModelService")
            .field("output_name", &self.output_name)
            .finish_non_exhaustive()
    }
}

impl OrtModelService {
    pub fn new(model_config: &ModelConfig) -> Result<Self, ModelLoadError> {
        Self::from_file(&model_config.get_path())
    }

    pub fn from_file(path: &Path) -> Result<Self, ModelLoadError> {
        if !path.is_file() {
            return Err(ModelLoadError::NotFound(path.to_path_buf()));
        }

        let session = build_session(path).map_err(|e| ModelLoadError::Session(e.to_string()))?;

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or(ModelLoadError::MissingOutput)?;

        tracing::info!(
            "Loaded ONNX model from {:?} with output {}",
            path,
            output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            output_name,
        })
    }
}

fn build_session(path: &Path) -> Result<Session, ort::Error> {
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .commit_from_file(path)?;
    Ok(session)
}

impl ModelService for OrtModelService {
    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::Poisoned)?;

        let tensor_ref = TensorRef::from_array_view(input.view())
            .map_err(|e| InferenceError::Runtime(format!("failed to build tensor: {}", e)))?;

        let outputs = session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| InferenceError::Runtime(format!("forward pass failed: {}", e)))?;

        let (_shape, data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Runtime(format!("failed to extract tensor: {}", e)))?;

        Ok(data.to_vec())
    }
}
