use super::Config;
use crate::errors::ConfigError;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    /// Load `{config_dir}/main.toml`. A missing file falls back to defaults.
    pub async fn new(config_dir: String) -> Result<Self, ConfigError> {
        let config = Self::load_configuration(&config_dir).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(config_dir: &str) -> Result<Config, ConfigError> {
        let main_config_path = format!("{}/main.toml", config_dir);

        if !fs::try_exists(&main_config_path).await.unwrap_or(false) {
            info!(
                "No config found at {}, using built-in defaults",
                main_config_path
            );
            let config = Config::default();
            config.validate()?;
            return Ok(config);
        }

        debug!("Loading main config: {}", main_config_path);

        let content =
            fs::read_to_string(&main_config_path)
                .await
                .map_err(|e| ConfigError::LoadFailed {
                    path: main_config_path.clone(),
                    reason: e.to_string(),
                })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })?;

        config.validate()?;

        info!(
            "Configuration loaded: database={}, tx_timeout={}s, online_window={}m, cooldown={}m",
            config.database_path,
            config.transaction_timeout_seconds,
            config.online_window_minutes,
            config.resurfacing_cooldown_minutes
        );

        Ok(config)
    }
}
