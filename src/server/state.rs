//! Application state management

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::FraudGuardError;
use crate::inference::load_model;
use crate::models::FraudPipeline;

use super::ServerConfig;

/// Application state shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    /// Loaded once at startup; `None` when no trained model exists
    pub model: Option<Arc<FraudPipeline>>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Build state and load the configured model
    pub fn new(config: ServerConfig) -> crate::error::Result<Self> {
        let model = match load_model(&config.models_dir, &config.model_name) {
            Ok(model) => Some(model),
            Err(FraudGuardError::ModelNotFound { path }) => {
                warn!(path = %path.display(), "Model not found, predictions are disabled until `fraudguard train` runs");
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Self::with_model(config, model))
    }

    pub fn with_model(config: ServerConfig, model: Option<FraudPipeline>) -> Self {
        if let Some(ref m) = model {
            info!(model = m.model_type(), features = m.feature_names().len(), "Serving model");
        }
        Self {
            config,
            model: model.map(Arc::new),
            started_at: chrono::Utc::now(),
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.model.is_some()
    }
}
