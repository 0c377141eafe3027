//! Match creation from a confirmed mutual-like pair.
//!
//! Callers may invoke `create_match` any number of times, concurrently, in
//! either argument order. The unique index on `(user_id_1, user_id_2)` is what
//! makes that safe: the losing insert of a race is recognised by its
//! unique-violation error and turned into a read of the winner's row.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::database::{
    directory, matches, reveals, CanonicalPair, Database, MatchRecord, MatchStatus,
    RevealRecord, RevealStatus,
};
use crate::errors::{EngineError, Result};

/// A match together with the reveal each participant owns.
#[derive(Debug, Clone, Serialize)]
pub struct MatchWithReveals {
    #[serde(rename = "match")]
    pub match_record: MatchRecord,
    pub reveal_for_user1: RevealRecord,
    pub reveal_for_user2: RevealRecord,
}

impl MatchWithReveals {
    /// The reveal owned by `user_id`, if they are part of the match.
    pub fn reveal_for(&self, user_id: &str) -> Option<&RevealRecord> {
        [&self.reveal_for_user1, &self.reveal_for_user2]
            .into_iter()
            .find(|reveal| reveal.user_id == user_id)
    }
}

/// Outcome of `create_match`. Both variants are successes; display code should
/// treat them the same way.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "result", rename_all = "snake_case")]
pub enum MatchCreation {
    Created(MatchWithReveals),
    AlreadyExisted(MatchWithReveals),
}

impl MatchCreation {
    pub fn already_existed(&self) -> bool {
        matches!(self, MatchCreation::AlreadyExisted(_))
    }

    pub fn result(&self) -> &MatchWithReveals {
        match self {
            MatchCreation::Created(result) | MatchCreation::AlreadyExisted(result) => result,
        }
    }

    pub fn into_result(self) -> MatchWithReveals {
        match self {
            MatchCreation::Created(result) | MatchCreation::AlreadyExisted(result) => result,
        }
    }
}

pub struct MatchCreationService {
    database: Arc<Database>,
}

impl MatchCreationService {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    #[instrument(skip(self))]
    pub async fn create_match(&self, user_a: &str, user_b: &str) -> Result<MatchCreation> {
        let pair = CanonicalPair::new(user_a, user_b)?;

        if !directory::mutual_likes_exist(self.database.pool(), pair.user_id_1(), pair.user_id_2())
            .await?
        {
            info!("Rejecting match for {}: likes are not mutual", pair);
            return Err(EngineError::MutualLikesRequired {
                user_id_1: pair.user_id_1().to_string(),
                user_id_2: pair.user_id_2().to_string(),
            });
        }

        if let Some(existing) = self.load_existing(&pair).await? {
            debug!("Match already exists for {}: {}", pair, existing.match_record.id);
            return Ok(MatchCreation::AlreadyExisted(existing));
        }

        match self.insert_match(pair.clone()).await {
            Ok(created) => {
                info!(
                    "Created match {} for {}",
                    created.match_record.id, pair
                );
                Ok(MatchCreation::Created(created))
            }
            Err(e) if e.is_unique_violation() => {
                info!("Concurrent creation won for {}, reading committed match", pair);

                // Re-derive the key from the inputs rather than reusing what we tried to insert.
                let pair = CanonicalPair::new(user_a, user_b)?;
                match self.load_existing(&pair).await? {
                    Some(existing) => Ok(MatchCreation::AlreadyExisted(existing)),
                    None => {
                        warn!(
                            "Unique violation for {} but no committed match is visible",
                            pair
                        );
                        Err(e)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn load_existing(&self, pair: &CanonicalPair) -> Result<Option<MatchWithReveals>> {
        let Some(record) = matches::find_by_pair(self.database.pool(), pair).await? else {
            return Ok(None);
        };

        // The match and its reveals commit together, so both are visible here.
        let found = reveals::find_for_match(self.database.pool(), &record.id).await?;
        Self::assemble(record, found).map(Some)
    }

    fn assemble(record: MatchRecord, found: Vec<RevealRecord>) -> Result<MatchWithReveals> {
        let mut reveal_for_user1 = None;
        let mut reveal_for_user2 = None;

        for reveal in found {
            if reveal.user_id == record.user_id_1 {
                reveal_for_user1 = Some(reveal);
            } else if reveal.user_id == record.user_id_2 {
                reveal_for_user2 = Some(reveal);
            }
        }

        match (reveal_for_user1, reveal_for_user2) {
            (Some(reveal_for_user1), Some(reveal_for_user2)) => Ok(MatchWithReveals {
                match_record: record,
                reveal_for_user1,
                reveal_for_user2,
            }),
            _ => Err(EngineError::Other(format!(
                "match {} does not have a reveal for each participant",
                record.id
            ))),
        }
    }

    /// Insert the match and both reveals in one write-locked transaction.
    async fn insert_match(&self, pair: CanonicalPair) -> Result<MatchWithReveals> {
        self.database
            .run_serializable("create_match", move |conn| {
                Box::pin(async move {
                    let now = Utc::now();

                    let member1 = directory::find_member(&mut *conn, pair.user_id_1())
                        .await?
                        .ok_or_else(|| EngineError::MemberNotFound {
                            user_id: pair.user_id_1().to_string(),
                        })?;
                    let member2 = directory::find_member(&mut *conn, pair.user_id_2())
                        .await?
                        .ok_or_else(|| EngineError::MemberNotFound {
                            user_id: pair.user_id_2().to_string(),
                        })?;

                    let record = MatchRecord {
                        id: Uuid::new_v4().to_string(),
                        user_id_1: pair.user_id_1().to_string(),
                        user_id_2: pair.user_id_2().to_string(),
                        status: MatchStatus::Active,
                        user1_video_snapshot: member1.snapshot_video(now),
                        user2_video_snapshot: member2.snapshot_video(now),
                        dissolved_at: None,
                        dissolved_by: None,
                        dissolved_reason: None,
                        created_at: now,
                    };
                    matches::insert(&mut *conn, &record).await?;

                    // Each side is shown the other side's frozen video.
                    let reveal_for_user1 = RevealRecord {
                        id: Uuid::new_v4().to_string(),
                        match_id: record.id.clone(),
                        user_id: record.user_id_1.clone(),
                        video_snapshot: record.user2_video_snapshot.clone(),
                        status: RevealStatus::Pending,
                        created_at: now,
                        revealed_at: None,
                        last_shown_at: None,
                        dismissed_at: None,
                    };
                    let reveal_for_user2 = RevealRecord {
                        id: Uuid::new_v4().to_string(),
                        match_id: record.id.clone(),
                        user_id: record.user_id_2.clone(),
                        video_snapshot: record.user1_video_snapshot.clone(),
                        status: RevealStatus::Pending,
                        created_at: now,
                        revealed_at: None,
                        last_shown_at: None,
                        dismissed_at: None,
                    };
                    reveals::insert(&mut *conn, &reveal_for_user1).await?;
                    reveals::insert(&mut *conn, &reveal_for_user2).await?;

                    Ok(MatchWithReveals {
                        match_record: record,
                        reveal_for_user1,
                        reveal_for_user2,
                    })
                })
            })
            .await
    }
}
