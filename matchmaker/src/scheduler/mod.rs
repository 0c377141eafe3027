//! Cron-based scheduling for background jobs
//!
//! Currently runs the inactivity sweep. Schedules use the 6-field cron format
//! (sec min hour day month dow) that tokio-cron-scheduler expects:
//!
//! ```toml
//! inactivity_sweep_enabled = true
//! inactivity_sweep_schedule = "0 0 4 * * *"  # Daily at 4 AM
//! ```
//!
//! Every instance may run the same schedule; the jobs only issue guarded
//! updates against the store.

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, instrument, warn};

use crate::config::{validate_6_field_cron, Config};
use crate::services::InactivitySweepService;

pub struct SweepScheduler {
    config: Arc<Config>,
    sweep_service: Arc<InactivitySweepService>,
    scheduler: JobScheduler,
}

impl SweepScheduler {
    pub async fn new(
        config: Arc<Config>,
        sweep_service: Arc<InactivitySweepService>,
    ) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create JobScheduler: {}", e))?;

        Ok(Self {
            config,
            sweep_service,
            scheduler,
        })
    }

    /// Register configured jobs and start the scheduler. Returns the number of jobs.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<usize> {
        let mut scheduled_count = 0;

        if self.config.inactivity_sweep_enabled {
            let schedule = self.config.inactivity_sweep_schedule.clone();
            self.schedule_inactivity_sweep(&schedule).await?;
            scheduled_count += 1;
            info!("Scheduled inactivity sweep: {}", schedule);
        } else {
            info!("Inactivity sweep disabled, skipping schedule");
        }

        if scheduled_count > 0 {
            self.scheduler
                .start()
                .await
                .map_err(|e| anyhow!("Failed to start scheduler: {}", e))?;
            info!("Scheduler started with {} jobs", scheduled_count);
        } else {
            warn!("No scheduled jobs configured - scheduler not started");
        }

        Ok(scheduled_count)
    }

    async fn schedule_inactivity_sweep(&self, schedule: &str) -> Result<()> {
        validate_6_field_cron(schedule)
            .map_err(|e| anyhow!("Invalid 6-field cron schedule '{}': {}", schedule, e))?;

        let sweep_service = self.sweep_service.clone();

        let job = Job::new_async(schedule, move |_uuid, _scheduler| {
            let sweep_service = sweep_service.clone();

            Box::pin(async move {
                info!("Executing scheduled inactivity sweep");

                if let Err(e) = sweep_service.run_sweep().await {
                    error!("Scheduled inactivity sweep failed: {}", e);
                }
            })
        })
        .map_err(|e| anyhow!("Failed to create sweep job for '{}': {}", schedule, e))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add sweep job to scheduler: {}", e))?;

        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| anyhow!("Failed to stop scheduler: {}", e))
    }
}
