use crate::config::AppConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: AppConfig,
    pub config_source: String,
    /// Configuration the process started with; `calc.config.clearOverride` returns to it.
    pub startup_config: AppConfig,
    pub startup_source: String,
}

impl AppState {
    pub fn new(config: AppConfig, source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            startup_config: config.clone(),
            startup_source: source.clone(),
            config,
            config_source: source,
        }
    }

    pub fn replace_config(&mut self, config: AppConfig, source: impl Into<String>) {
        self.config = config;
        self.config_source = source.into();
        tracing::info!(
            source = %self.config_source,
            fingerprint = %self.config.fingerprint(),
            "active config replaced"
        );
    }
}
