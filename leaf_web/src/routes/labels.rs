use crate::server::SharedState;
use axum::{extract::State, response::Json};
use leaf_prediction::{labels::describe, ModelService};
use serde::Serialize;

#[derive(Serialize)]
pub struct ClassLabel {
    index: usize,
    label: String,
    description: Option<&'static str>,
}

#[derive(Serialize)]
pub struct ClassLabels {
    class_labels: Vec<ClassLabel>,
}

pub async fn class_labels<M: ModelService>(
    State(state): State<SharedState<M>>,
) -> Json<ClassLabels> {
    state.metrics.record_request("/labels");

    let class_labels = state
        .labels
        .labels()
        .iter()
        .enumerate()
        .map(|(index, label)| ClassLabel {
            index,
            label: label.clone(),
            description: describe(label),
        })
        .collect();

    Json(ClassLabels { class_labels })
}
