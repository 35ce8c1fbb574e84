use crate::config::Config;
use crate::server::{HttpServer, SharedState};
use crate::telemetry::Metrics;
use leaf_prediction::{model_loader::global_loader, OrtModelService};
use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let labels = match config.labels.load() {
        Ok(labels) => Arc::new(labels),
        Err(e) => {
            tracing::error!("Failed to load class labels: {:?}", e);
            return Err(Box::new(e));
        }
    };
    tracing::info!("Serving {} class labels: {:?}", labels.len(), labels.labels());

    let model_config = config.model.clone();
    tracing::info!(
        "Model will be loaded from {:?} on the first prediction",
        model_config.get_path()
    );

    let state = SharedState {
        models: global_loader(),
        load_model: Arc::new(move || OrtModelService::new(&model_config)),
        labels,
        upload: config.upload.clone(),
        metrics: Arc::new(Metrics::new()?),
    };

    let server = HttpServer::new(state, &config.server.get_address()).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_shutdown_rx = shutdown_tx.subscribe();

    let server_handle = server.run(server_shutdown_rx).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    if let Ok(Err(e)) = server_handle.await {
        tracing::error!("Server stopped with error: {:?}", e);
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
