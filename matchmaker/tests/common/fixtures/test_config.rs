//! Test configuration builders

use matchmaker::config::Config;
use std::sync::Arc;

/// Reference configuration: 5 minute online window, 2 hour cooldown, 10 per batch
pub fn test_config() -> Arc<Config> {
    Arc::new(Config {
        database_path: ":memory:".to_string(),
        ..Config::default()
    })
}

pub fn test_config_with(update: impl FnOnce(&mut Config)) -> Arc<Config> {
    let mut config = Config {
        database_path: ":memory:".to_string(),
        ..Config::default()
    };
    update(&mut config);
    Arc::new(config)
}
