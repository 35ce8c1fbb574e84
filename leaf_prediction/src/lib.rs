//! Romaine lettuce leaf classification: image bytes in, nutrition class out.

pub mod config;
pub mod labels;
pub mod model_loader;
pub mod model_service;
pub mod ort_service;
pub mod pipeline;
pub mod predictor;
pub mod preprocess;

pub use labels::{label_for, LabelTable, CLASS_NAMES};
pub use model_loader::{load_model, ModelLoadError, ModelLoader};
pub use model_service::ModelService;
pub use ort_service::OrtModelService;
pub use pipeline::{diagnose, Diagnosis, PipelineError, Stage};
pub use predictor::{predict, InferenceError, Prediction};
pub use preprocess::{preprocess, ImageTensor, PreprocessingError};
