pub mod manager;

use crate::constants::{database, inactivity, limits, resurfacing, transactions};
use crate::errors::ConfigError;
use chrono::Duration as ChronoDuration;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use manager::ConfigManager;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_transaction_timeout")]
    pub transaction_timeout_seconds: u64,
    // Resurfacing windows
    #[serde(default = "default_online_window")]
    pub online_window_minutes: i64,
    #[serde(default = "default_resurfacing_cooldown")]
    pub resurfacing_cooldown_minutes: i64,
    #[serde(default = "default_reveal_batch_limit")]
    pub reveal_batch_limit: i64,
    // Inactivity sweep
    #[serde(default)]
    pub inactivity_sweep_enabled: bool,
    #[serde(default = "default_inactivity_schedule")]
    pub inactivity_sweep_schedule: String,
    #[serde(default = "default_inactivity_days")]
    pub inactivity_dissolve_days: i64,
}

fn default_database_path() -> String {
    database::DEFAULT_PATH.to_string()
}

fn default_max_connections() -> u32 {
    transactions::MAX_CONNECTIONS
}

fn default_transaction_timeout() -> u64 {
    transactions::TIMEOUT.as_secs()
}

fn default_online_window() -> i64 {
    resurfacing::ONLINE_WINDOW_MINUTES
}

fn default_resurfacing_cooldown() -> i64 {
    resurfacing::COOLDOWN_MINUTES
}

fn default_reveal_batch_limit() -> i64 {
    limits::REVEAL_BATCH_LIMIT
}

fn default_inactivity_schedule() -> String {
    inactivity::SWEEP_SCHEDULE.to_string()
}

fn default_inactivity_days() -> i64 {
    inactivity::DISSOLVE_AFTER_DAYS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            max_connections: default_max_connections(),
            transaction_timeout_seconds: default_transaction_timeout(),
            online_window_minutes: default_online_window(),
            resurfacing_cooldown_minutes: default_resurfacing_cooldown(),
            reveal_batch_limit: default_reveal_batch_limit(),
            inactivity_sweep_enabled: false,
            inactivity_sweep_schedule: default_inactivity_schedule(),
            inactivity_dissolve_days: default_inactivity_days(),
        }
    }
}

impl Config {
    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_secs(self.transaction_timeout_seconds)
    }

    pub fn online_window(&self) -> ChronoDuration {
        ChronoDuration::minutes(self.online_window_minutes)
    }

    pub fn resurfacing_cooldown(&self) -> ChronoDuration {
        ChronoDuration::minutes(self.resurfacing_cooldown_minutes)
    }

    pub fn inactivity_threshold(&self) -> ChronoDuration {
        ChronoDuration::days(self.inactivity_dissolve_days)
    }

    /// Reject values that would make the engine misbehave silently.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.trim().is_empty() {
            return Err(invalid("database_path", "must not be empty"));
        }
        if self.max_connections == 0 {
            return Err(invalid("max_connections", "must be at least 1"));
        }
        if self.transaction_timeout_seconds == 0 {
            return Err(invalid("transaction_timeout_seconds", "must be positive"));
        }
        if self.online_window_minutes <= 0 {
            return Err(invalid("online_window_minutes", "must be positive"));
        }
        if self.resurfacing_cooldown_minutes < 0 {
            return Err(invalid("resurfacing_cooldown_minutes", "must not be negative"));
        }
        if self.reveal_batch_limit <= 0 {
            return Err(invalid("reveal_batch_limit", "must be positive"));
        }
        if self.inactivity_dissolve_days <= 0 {
            return Err(invalid("inactivity_dissolve_days", "must be positive"));
        }
        if self.inactivity_sweep_enabled {
            validate_6_field_cron(&self.inactivity_sweep_schedule)
                .map_err(|reason| invalid("inactivity_sweep_schedule", &reason))?;
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// tokio-cron-scheduler wants `sec min hour day month dow`.
pub fn validate_6_field_cron(schedule: &str) -> Result<(), String> {
    let parts: Vec<&str> = schedule.split_whitespace().collect();

    if parts.len() != 6 {
        return Err(format!(
            "expected 6 fields (second minute hour day month dayofweek), got {} in '{}'",
            parts.len(),
            schedule
        ));
    }

    validate_cron_field(parts[0], "second", 0, 59)?;
    validate_cron_field(parts[1], "minute", 0, 59)?;
    validate_cron_field(parts[2], "hour", 0, 23)?;
    validate_cron_field(parts[3], "day", 1, 31)?;
    validate_cron_field(parts[4], "month", 1, 12)?;
    validate_cron_field(parts[5], "dayofweek", 0, 7)?;

    Ok(())
}

fn validate_cron_field(field: &str, name: &str, min: u32, max: u32) -> Result<(), String> {
    if field == "*" || field == "?" {
        return Ok(());
    }

    if let Some(step) = field.strip_prefix("*/") {
        let step = step
            .parse::<u32>()
            .map_err(|_| format!("invalid {} step: {}", name, step))?;
        if step == 0 || step > max {
            return Err(format!("{} step {} out of range", name, step));
        }
        return Ok(());
    }

    for part in field.split(',') {
        let bounds: Vec<&str> = part.split('-').collect();
        if bounds.len() > 2 {
            return Err(format!("invalid {} range: {}", name, part));
        }
        for bound in bounds {
            let value = bound
                .parse::<u32>()
                .map_err(|_| format!("invalid {} value: {}", name, bound))?;
            if value < min || value > max {
                return Err(format!(
                    "{} value {} outside {}-{}",
                    name, value, min, max
                ));
            }
        }
    }

    Ok(())
}
