use crate::{model_service::ModelService, preprocess::ImageTensor};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Inference failed: {0}")]
    Runtime(String),
    #[error("Model session lock poisoned")]
    Poisoned,
    #[error("Invalid input tensor shape {0:?}, expected [1, 224, 224, 3]")]
    InputShape(Vec<usize>),
    #[error("Model returned an empty output vector")]
    EmptyOutput,
    #[error("Model returned a non-finite score at index {index}")]
    NonFinite { index: usize },
    #[error("Model returned score {value} at index {index}, outside [0, 1]")]
    ScoreOutOfRange { index: usize, value: f32 },
    #[error("Model returned {actual} scores but {expected} class labels are known")]
    ClassCountMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub index: usize,
    pub confidence: f32,
    pub num_classes: usize,
}

/// Runs a single forward pass and reduces the scores to the best class.
pub fn predict<M: ModelService + ?Sized>(
    model: &M,
    input: &ImageTensor,
) -> Result<Prediction, InferenceError> {
    let scores = model.infer(input)?;
    let prediction = select_class(&scores)?;

    tracing::debug!(
        "Scores {:?} -> class_id={}, confidence={:.3}",
        scores,
        prediction.index,
        prediction.confidence
    );

    Ok(prediction)
}

/// Argmax over the scores. Ties resolve to the first maximum.
pub fn select_class(scores: &[f32]) -> Result<Prediction, InferenceError> {
    if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
        return Err(InferenceError::NonFinite { index });
    }
    if let Some((index, value)) = scores
        .iter()
        .enumerate()
        .find(|(_, s)| !(0.0..=1.0).contains(*s))
    {
        return Err(InferenceError::ScoreOutOfRange {
            index,
            value: *value,
        });
    }

    scores
        .iter()
        .copied()
        .enumerate()
        .reduce(|accum, row| if row.1 > accum.1 { row } else { accum })
        .map(|(index, confidence)| Prediction {
            index,
            confidence,
            num_classes: scores.len(),
        })
        .ok_or(InferenceError::EmptyOutput)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockModelService {
        scores: Vec<f32>,
        calls: AtomicUsize,
    }

    impl MockModelService {
        fn new(scores: Vec<f32>) -> Self {
            Self {
                scores,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl ModelService for MockModelService {
        fn infer(&self, _input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.scores.clone())
        }
    }

    struct FailingModelService;

    impl ModelService for FailingModelService {
        fn infer(&self, _input: &ImageTensor) -> Result<Vec<f32>, InferenceError> {
            Err(InferenceError::Runtime("out of memory".to_string()))
        }
    }

    fn blank_tensor() -> ImageTensor {
        ImageTensor::from_array(Array4::zeros((1, 224, 224, 3))).unwrap()
    }

    #[test]
    fn test_predict_picks_max() {
        let model = MockModelService::new(vec![0.12, 0.88]);

        let prediction = predict(&model, &blank_tensor()).unwrap();

        assert_eq!(prediction.index, 1);
        assert_eq!(prediction.confidence, 0.88);
        assert_eq!(prediction.num_classes, 2);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_predict_is_deterministic() {
        let model = MockModelService::new(vec![0.7, 0.3]);
        let input = blank_tensor();

        let first = predict(&model, &input).unwrap();
        let second = predict(&model, &input).unwrap();

        assert_eq!(first.index, second.index);
        assert_eq!(first.confidence.to_bits(), second.confidence.to_bits());
    }

    #[test]
    fn test_predict_propagates_runtime_failure() {
        let result = predict(&FailingModelService, &blank_tensor());

        assert_eq!(
            result,
            Err(InferenceError::Runtime("out of memory".to_string()))
        );
    }

    #[test]
    fn test_select_class_ties_keep_first() {
        let prediction = select_class(&[0.5, 0.5]).unwrap();
        assert_eq!(prediction.index, 0);

        let prediction = select_class(&[0.1, 0.45, 0.45]).unwrap();
        assert_eq!(prediction.index, 1);
    }

    #[test]
    fn test_select_class_confidence_is_max_entry() {
        let scores = [0.05, 0.9, 0.05];
        let prediction = select_class(&scores).unwrap();

        let max = scores.iter().copied().fold(f32::MIN, f32::max);
        assert_eq!(prediction.confidence, max);
        assert!((0.0..=1.0).contains(&prediction.confidence));
    }

    #[test]
    fn test_select_class_low_confidence_is_still_a_result() {
        let prediction = select_class(&[0.0, 0.0]).unwrap();
        assert_eq!(
            prediction,
            Prediction {
                index: 0,
                confidence: 0.0,
                num_classes: 2
            }
        );
    }

    #[test]
    fn test_select_class_rejects_invalid_scores() {
        assert_eq!(select_class(&[]), Err(InferenceError::EmptyOutput));
        assert_eq!(
            select_class(&[0.2, f32::NAN]),
            Err(InferenceError::NonFinite { index: 1 })
        );
        assert_eq!(
            select_class(&[1.5, 0.1]),
            Err(InferenceError::ScoreOutOfRange {
                index: 0,
                value: 1.5
            })
        );
    }
}
