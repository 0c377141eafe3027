//! Presence-gated re-prompting of already revealed matches.
//!
//! A REVEALED reveal resurfaces when the counterpart is online now and the
//! reveal has not been shown within the cooldown. Selecting the eligible rows
//! and stamping `last_shown_at` on them happen in one write-locked
//! transaction, so a polling client and a push job running at the same moment
//! cannot both receive the same reveal.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::database::{reveals, Database, RevealWithCounterpart};
use crate::errors::{EngineError, Result};

pub struct ResurfacingService {
    config: Arc<Config>,
    database: Arc<Database>,
}

impl ResurfacingService {
    pub fn new(config: Arc<Config>, database: Arc<Database>) -> Self {
        Self { config, database }
    }

    #[instrument(skip(self))]
    pub async fn get_resurfacing_reveals(
        &self,
        user_id: &str,
    ) -> Result<Vec<RevealWithCounterpart>> {
        let user_id = user_id.to_string();
        let online_window = self.config.online_window();
        let cooldown = self.config.resurfacing_cooldown();
        let limit = self.config.reveal_batch_limit;

        let resurfaced = self
            .database
            .run_serializable("get_resurfacing_reveals", move |conn| {
                Box::pin(async move {
                    let now = Utc::now();

                    let mut eligible = reveals::resurfacing_candidates(
                        &mut *conn,
                        &user_id,
                        now - online_window,
                        now - cooldown,
                        limit,
                    )
                    .await?;

                    if eligible.is_empty() {
                        return Ok(eligible);
                    }

                    // Stamp exactly the rows just read, nothing broader.
                    let ids: Vec<String> =
                        eligible.iter().map(|item| item.reveal.id.clone()).collect();
                    let stamped = reveals::stamp_last_shown(&mut *conn, &ids, now).await?;

                    // Erroring here rolls the stamps back with the transaction.
                    if stamped != ids.len() as u64 {
                        return Err(EngineError::Other(format!(
                            "stamped {} of {} resurfacing reveals for {}",
                            stamped,
                            ids.len(),
                            user_id
                        )));
                    }

                    for item in &mut eligible {
                        item.reveal.last_shown_at = Some(now);
                    }
                    Ok(eligible)
                })
            })
            .await?;

        if resurfaced.is_empty() {
            debug!("Nothing to resurface");
        } else {
            info!("Resurfaced {} reveals", resurfaced.len());
        }
        Ok(resurfaced)
    }
}
