use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::database::{reveals, Database, RevealWithCounterpart};
use crate::errors::Result;

/// Reads and advances a single user's reveals.
pub struct RevealQueryService {
    config: Arc<Config>,
    database: Arc<Database>,
}

impl RevealQueryService {
    pub fn new(config: Arc<Config>, database: Arc<Database>) -> Self {
        Self { config, database }
    }

    /// Most recent PENDING reveals of ACTIVE matches, with the counterpart's
    /// public profile attached.
    #[instrument(skip(self))]
    pub async fn get_pending_reveals(&self, user_id: &str) -> Result<Vec<RevealWithCounterpart>> {
        let pending =
            reveals::pending_for_user(self.database.pool(), user_id, self.config.reveal_batch_limit)
                .await?;
        debug!("{} pending reveals for {}", pending.len(), user_id);
        Ok(pending)
    }

    /// PENDING -> REVEALED. A result of 0 means the reveal was already handled
    /// (or is not owned by `user_id`); callers should not retry on 0.
    #[must_use = "0 rows affected means the reveal was already handled"]
    #[instrument(skip(self))]
    pub async fn mark_reveal_seen(&self, reveal_id: &str, user_id: &str) -> Result<u64> {
        let affected =
            reveals::mark_seen(self.database.pool(), reveal_id, user_id, Utc::now()).await?;

        if affected == 0 {
            debug!("Reveal {} not PENDING for {}, nothing to do", reveal_id, user_id);
        } else {
            info!("Reveal {} seen by {}", reveal_id, user_id);
        }
        Ok(affected)
    }

    /// PENDING or REVEALED -> DISMISSED. Returns 0 if already dismissed.
    #[must_use = "0 rows affected means the reveal was already dismissed"]
    #[instrument(skip(self))]
    pub async fn mark_reveal_dismissed(&self, reveal_id: &str, user_id: &str) -> Result<u64> {
        let affected =
            reveals::mark_dismissed(self.database.pool(), reveal_id, user_id, Utc::now()).await?;

        if affected == 0 {
            debug!("Reveal {} already dismissed or not owned by {}", reveal_id, user_id);
        } else {
            info!("Reveal {} dismissed by {}", reveal_id, user_id);
        }
        Ok(affected)
    }
}
