//! Central repository for the engine's windows, cooldowns and limits
//!
//! Values here are the defaults; most of them can be overridden through
//! `config/main.toml`.

use std::time::Duration;

/// Transaction bounds
pub mod transactions {
    use super::Duration;

    /// Upper bound for a serializable transaction, including the wait for the write lock
    pub const TIMEOUT: Duration = Duration::from_secs(10);

    /// Default pool size for file-backed databases
    pub const MAX_CONNECTIONS: u32 = 8;
}

/// Presence and resurfacing windows
pub mod resurfacing {
    /// A member counts as online if they were active within this many minutes
    pub const ONLINE_WINDOW_MINUTES: i64 = 5;

    /// Minimum gap between two prompts for the same revealed match
    pub const COOLDOWN_MINUTES: i64 = 120;
}

/// Limits and constraints
pub mod limits {
    /// Maximum number of reveals returned by a pending or resurfacing query
    pub const REVEAL_BATCH_LIMIT: i64 = 10;

    /// Maximum number of matches dissolved by one inactivity sweep run
    pub const SWEEP_BATCH_SIZE: i64 = 500;
}

/// Inactivity sweep defaults
pub mod inactivity {
    /// Both participants idle for this many days dissolves the match
    pub const DISSOLVE_AFTER_DAYS: i64 = 30;

    /// Daily at 04:00 (sec min hour day month dow)
    pub const SWEEP_SCHEDULE: &str = "0 0 4 * * *";

    /// Actor recorded on matches dissolved by the sweep
    pub const SYSTEM_ACTOR: &str = "system";
}

/// Database defaults
pub mod database {
    pub const DEFAULT_PATH: &str = "data/matchmaker.db";
}
