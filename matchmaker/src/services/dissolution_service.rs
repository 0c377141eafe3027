use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::database::{matches, Database, DissolutionReason};
use crate::errors::Result;

pub struct DissolutionService {
    database: Arc<Database>,
}

impl DissolutionService {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// ACTIVE -> DISSOLVED. Idempotent: a second call affects 0 rows and
    /// leaves the first call's `dissolved_*` fields in place.
    #[must_use = "0 rows affected means the match was not active"]
    #[instrument(skip(self))]
    pub async fn dissolve_match(
        &self,
        match_id: &str,
        actor_user_id: &str,
        reason: DissolutionReason,
    ) -> Result<u64> {
        let affected = matches::dissolve(
            self.database.pool(),
            match_id,
            actor_user_id,
            reason,
            Utc::now(),
        )
        .await?;

        if affected == 0 {
            debug!("Match {} not active, dissolve is a no-op", match_id);
        } else {
            info!(
                "Match {} dissolved by {} ({})",
                match_id, actor_user_id, reason
            );
        }
        Ok(affected)
    }
}
