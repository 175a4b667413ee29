use crate::config::bootstrap::BootstrapConfig;
use crate::config::notification::NotificationConfig;
use crate::config::*;
use crate::error::{Error, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceConfig,
    pub api: ApiConfig,
    pub orchestrator: OrchestratorConfig,
    pub notification: NotificationConfig,
    pub kafka: KafkaConfig,
    pub logging: LoggingConfig,
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("PAYGATE").separator("__"))
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        config.try_deserialize()
            .map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Parse a TOML document directly; no files or environment involved.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::ConfigError(e.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.orchestrator.request_timeout_ms)
    }
}
