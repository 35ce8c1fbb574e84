use crate::server::SharedState;
use axum::{extract::State, response::Json};
use leaf_prediction::ModelService;
use serde::Serialize;

#[derive(Serialize)]
pub struct Status {
    status: String,
    model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

pub async fn healthcheck<M: ModelService>(State(state): State<SharedState<M>>) -> Json<Status> {
    state.metrics.record_request("/health");

    let warning = state.model_error();
    let status = if warning.is_some() {
        "Degraded"
    } else {
        "Available"
    };

    Json(Status {
        status: status.into(),
        model_loaded: state.models.is_loaded(),
        warning,
    })
}
