use crate::{config::UploadConfig, routes::api_routes, telemetry::Metrics};
use axum::{extract::DefaultBodyLimit, Router};
use axum_otel_metrics::HttpMetricsLayerBuilder;
use leaf_prediction::{LabelTable, ModelLoadError, ModelLoader, ModelService};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::broadcast::Receiver, task::JoinHandle};

pub type LoadFn<M> = dyn Fn() -> Result<M, ModelLoadError> + Send + Sync;

pub struct SharedState<M: ModelService> {
    pub models: &'static ModelLoader<M>,
    pub load_model: Arc<LoadFn<M>>,
    pub labels: Arc<LabelTable>,
    pub upload: UploadConfig,
    pub metrics: Arc<Metrics>,
}

impl<M: ModelService> Clone for SharedState<M> {
    fn clone(&self) -> Self {
        Self {
            models: self.models,
            load_model: self.load_model.clone(),
            labels: self.labels.clone(),
            upload: self.upload.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<M: ModelService> SharedState<M> {
    /// Returns the classifier, loading it on first use.
    pub fn model(&self) -> Option<Arc<M>> {
        self.models.get_or_load(|| (self.load_model)())
    }

    pub fn model_error(&self) -> Option<String> {
        self.models.load_error().map(|e| e.to_string())
    }
}

pub fn build_router<M: ModelService>(state: SharedState<M>) -> Router {
    let body_limit = state.upload.max_bytes.saturating_mul(2);

    Router::new()
        .merge(api_routes::<M>())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new<M: ModelService>(state: SharedState<M>, addr: &str) -> anyhow::Result<Self> {
        let metrics_layer = HttpMetricsLayerBuilder::new().build();
        let router = build_router(state).layer(metrics_layer);

        let listener = TcpListener::bind(addr).await?;

        Ok(Self { router, listener })
    }

    pub async fn run(
        self,
        shutdown_rx: Receiver<()>,
    ) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
        tracing::info!("Starting app on {}", self.listener.local_addr()?);

        let listener = self.listener;
        let router = self.router;
        let server_handle = tokio::spawn({
            let mut shutdown_rx = shutdown_rx.resubscribe();
            async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        shutdown_rx.recv().await.ok();
                    })
                    .await?;
                Ok(())
            }
        });

        Ok(server_handle)
    }
}
