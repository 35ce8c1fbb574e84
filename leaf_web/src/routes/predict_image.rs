use crate::server::SharedState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use leaf_prediction::{
    diagnose, labels::describe, InferenceError, ModelService, PipelineError, PreprocessingError,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    #[default]
    Upload,
    Camera,
}

#[derive(Debug, Default, Deserialize)]
pub struct PredictParams {
    #[serde(default)]
    pub source: ImageSource,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub label: String,
    pub class_index: usize,
    pub confidence: f32,
    pub confidence_percent: String,
    pub description: Option<&'static str>,
    pub source: ImageSource,
}

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("No image supplied")]
    MissingImage,
    #[error("Image is {size} bytes, the maximum is {max} bytes")]
    TooLarge { size: usize, max: usize },
    #[error("Model is unavailable: {0}")]
    ModelUnavailable(String),
    #[error("Image could not be processed: {0}")]
    Preprocessing(PreprocessingError),
    #[error("Prediction failed: {0}")]
    Inference(InferenceError),
    #[error("Prediction task failed: {0}")]
    Task(String),
}

impl PredictError {
    fn status(&self) -> StatusCode {
        match self {
            PredictError::MissingImage => StatusCode::BAD_REQUEST,
            PredictError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            PredictError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PredictError::Preprocessing(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PredictError::Inference(_) | PredictError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn stage(&self) -> &'static str {
        match self {
            PredictError::MissingImage | PredictError::TooLarge { .. } => "upload",
            PredictError::ModelUnavailable(_) => "model",
            PredictError::Preprocessing(_) => "preprocessing",
            PredictError::Inference(_) | PredictError::Task(_) => "predicting",
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            PredictError::MissingImage | PredictError::TooLarge { .. } => "rejected",
            PredictError::ModelUnavailable(_) => "model_unavailable",
            PredictError::Preprocessing(_) => "preprocess_failed",
            PredictError::Inference(_) | PredictError::Task(_) => "predict_failed",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    stage: &'static str,
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            stage: self.stage(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Classifies one uploaded or camera-captured image.
#[instrument(skip(state, image_data), fields(bytes = image_data.len()))]
pub async fn predict_image<M: ModelService>(
    State(state): State<SharedState<M>>,
    Query(params): Query<PredictParams>,
    image_data: Bytes,
) -> Result<Json<PredictResponse>, PredictError> {
    state.metrics.record_request("/predict");
    let start = Instant::now();

    let result = run_prediction(&state, image_data).await;
    state
        .metrics
        .record_prediction_duration(start.elapsed().as_millis() as u64, "/predict");

    match result {
        Ok(diagnosis) => {
            state.metrics.record_prediction_outcome("labeled");
            tracing::info!(
                "Predicted {} ({}) from {:?}",
                diagnosis.label,
                diagnosis.confidence_percent(),
                params.source
            );
            Ok(Json(PredictResponse {
                description: describe(&diagnosis.label),
                confidence_percent: diagnosis.confidence_percent(),
                label: diagnosis.label,
                class_index: diagnosis.index,
                confidence: diagnosis.confidence,
                source: params.source,
            }))
        }
        Err(err) => {
            state.metrics.record_prediction_outcome(err.outcome());
            match &err {
                PredictError::ModelUnavailable(_)
                | PredictError::Inference(_)
                | PredictError::Task(_) => tracing::error!("Prediction failed: {}", err),
                _ => tracing::warn!("Prediction rejected: {}", err),
            }
            Err(err)
        }
    }
}

async fn run_prediction<M: ModelService>(
    state: &SharedState<M>,
    image_data: Bytes,
) -> Result<leaf_prediction::Diagnosis, PredictError> {
    if image_data.is_empty() {
        return Err(PredictError::MissingImage);
    }
    if image_data.len() > state.upload.max_bytes {
        return Err(PredictError::TooLarge {
            size: image_data.len(),
            max: state.upload.max_bytes,
        });
    }

    let task_state = state.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let model = task_state.model();
        diagnose(model.as_deref(), &task_state.labels, &image_data)
    })
    .await
    .map_err(|e| PredictError::Task(e.to_string()))?;

    outcome.map_err(|err| match err {
        PipelineError::ModelUnavailable => PredictError::ModelUnavailable(
            state
                .model_error()
                .unwrap_or_else(|| "model not loaded".to_string()),
        ),
        PipelineError::Preprocessing(e) => PredictError::Preprocessing(e),
        PipelineError::Inference(e) => PredictError::Inference(e),
    })
}
