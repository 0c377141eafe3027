//! Dissolves matches whose participants have both gone idle.
//!
//! Every candidate goes through `DissolutionService`, so several instances
//! sweeping at once only ever dissolve a match once.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::config::Config;
use crate::constants::{inactivity, limits};
use crate::database::{matches, Database, DissolutionReason};
use crate::errors::Result;
use crate::services::DissolutionService;

#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub candidates: usize,
    pub dissolved: usize,
    pub failed: usize,
}

pub struct InactivitySweepService {
    config: Arc<Config>,
    database: Arc<Database>,
    dissolution: Arc<DissolutionService>,
}

impl InactivitySweepService {
    pub fn new(
        config: Arc<Config>,
        database: Arc<Database>,
        dissolution: Arc<DissolutionService>,
    ) -> Self {
        Self {
            config,
            database,
            dissolution,
        }
    }

    #[instrument(skip(self))]
    pub async fn run_sweep(&self) -> Result<SweepReport> {
        let idle_since = Utc::now() - self.config.inactivity_threshold();

        let candidates = matches::find_inactive(
            self.database.pool(),
            idle_since,
            limits::SWEEP_BATCH_SIZE,
        )
        .await?;

        let mut report = SweepReport {
            candidates: candidates.len(),
            ..SweepReport::default()
        };

        for match_id in &candidates {
            match self
                .dissolution
                .dissolve_match(
                    match_id,
                    inactivity::SYSTEM_ACTOR,
                    DissolutionReason::Inactivity,
                )
                .await
            {
                Ok(0) => {}
                Ok(_) => report.dissolved += 1,
                Err(e) => {
                    // Keep sweeping; the failure count is part of the report.
                    error!("Failed to dissolve inactive match {}: {}", match_id, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Inactivity sweep: {} candidates, {} dissolved, {} failed",
            report.candidates, report.dissolved, report.failed
        );
        Ok(report)
    }
}
