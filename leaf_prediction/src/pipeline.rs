use crate::{
    labels::LabelTable,
    model_service::ModelService,
    predictor::{predict, InferenceError},
    preprocess::{preprocess, PreprocessingError},
};
use serde::Serialize;
use thiserror::Error;

/// Where a request was when it finished or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Preprocessing,
    Predicting,
    Labeling,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Preprocessing => "preprocessing",
            Stage::Predicting => "predicting",
            Stage::Labeling => "labeling",
        }
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Model is not loaded")]
    ModelUnavailable,
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::ModelUnavailable => Stage::Idle,
            PipelineError::Preprocessing(_) => Stage::Preprocessing,
            PipelineError::Inference(InferenceError::ClassCountMismatch { .. }) => Stage::Labeling,
            PipelineError::Inference(_) => Stage::Predicting,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub index: usize,
    pub label: String,
    pub confidence: f32,
}

impl Diagnosis {
    pub fn confidence_percent(&self) -> String {
        format!("{:.2}%", self.confidence * 100.0)
    }
}

/// Runs one image through preprocess, predict and label lookup.
///
/// An absent model is rejected before any work is done.
pub fn diagnose<M: ModelService + ?Sized>(
    model: Option<&M>,
    labels: &LabelTable,
    image_data: &[u8],
) -> Result<Diagnosis, PipelineError> {
    let model = model.ok_or(PipelineError::ModelUnavailable)?;

    tracing::debug!(stage = Stage::Preprocessing.as_str(), bytes = image_data.len());
    let input = preprocess(image_data)?;

    tracing::debug!(stage = Stage::Predicting.as_str());
    let prediction = predict(model, &input)?;

    tracing::debug!(stage = Stage::Labeling.as_str());
    if prediction.num_classes != labels.len() {
        return Err(InferenceError::ClassCountMismatch {
            expected: labels.len(),
            actual: prediction.num_classes,
        }
        .into());
    }
    let label = labels
        .get(prediction.index)
        .ok_or(InferenceError::ClassCountMismatch {
            expected: labels.len(),
            actual: prediction.num_classes,
        })?
        .to_string();

    Ok(Diagnosis {
        index: prediction.index,
        label,
        confidence: prediction.confidence,
    })
}
