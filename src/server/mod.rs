//! FraudGuard web form
//!
//! Serves the single-page scoring form and the small JSON API behind it.
//! The model is loaded once at startup and shared read-only.

mod api;
mod error;
mod handlers;
mod state;

pub use api::create_router;
pub use error::ServerError;
pub use handlers::PredictRequest;
pub use state::AppState;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::inference::DEFAULT_MODEL_NAME;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub models_dir: PathBuf,
    pub model_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("FRAUDGUARD_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("FRAUDGUARD_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            models_dir: std::env::var("FRAUDGUARD_MODELS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("models")),
            model_name: DEFAULT_MODEL_NAME.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn model_path(&self) -> PathBuf {
        self.models_dir.join(&self.model_name)
    }
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let start_time = chrono::Utc::now();

    let state = Arc::new(AppState::new(config.clone())?);
    if !state.model_loaded() {
        warn!(path = %config.model_path().display(), "Starting without a model");
    }
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        host = %config.host,
        port = config.port,
        address = %addr,
        started_at = %start_time.to_rfc3339(),
        "FraudGuard server starting"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, pid = std::process::id(), "Server listening and ready to accept connections");

    // Graceful shutdown on ctrl+c
    let shutdown_signal = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install ctrl+c handler");
            std::future::pending::<()>().await;
        }
        let uptime = chrono::Utc::now().signed_duration_since(start_time);
        info!(
            uptime_secs = uptime.num_seconds(),
            "Shutdown signal received, stopping server gracefully"
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_path() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 9000,
            models_dir: PathBuf::from("artifacts"),
            model_name: "m.json".into(),
        };
        assert_eq!(config.model_path(), PathBuf::from("artifacts/m.json"));
    }

    #[test]
    fn test_default_model_name() {
        assert_eq!(ServerConfig::default().model_name, "fraud_model.json");
    }
}
