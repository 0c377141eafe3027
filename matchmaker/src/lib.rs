//! Match & reveal lifecycle engine.
//!
//! Turns a mutual-like pair into exactly one match with a reveal per
//! participant, advances each reveal independently, re-prompts revealed
//! matches when the counterpart comes online, and dissolves matches. The
//! relational store is the only coordination point between instances.

pub mod config;
pub mod constants;
pub mod database;
pub mod errors;
pub mod scheduler;
pub mod services;

// Re-export commonly used types
pub use config::{Config, ConfigManager};
pub use database::Database;
pub use errors::{EngineError, Result};
pub use scheduler::SweepScheduler;
pub use services::{
    DissolutionService, InactivitySweepService, MatchCreation, MatchCreationService,
    MatchWithReveals, ResurfacingService, RevealQueryService,
};
