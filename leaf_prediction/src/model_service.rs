use crate::{predictor::InferenceError, preprocess::ImageTensor};

/// A loaded classifier able to run one forward pass.
///
/// Implementations must be deterministic: the same input always yields the
/// same scores.
pub trait ModelService: Send + Sync + 'static {
    /// Returns one probability-like score per class.
    fn infer(&self, input: &ImageTensor) -> Result<Vec<f32>, InferenceError>;
}
