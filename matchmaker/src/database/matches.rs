//! Match database operations.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite};
use tracing::debug;

use super::records::{
    CanonicalPair, DissolutionReason, MatchRecord, MatchStatus, VideoSnapshot,
};
use super::Database;
use crate::errors::Result;

const MATCH_COLUMNS: &str = r#"
    id, user_id_1, user_id_2, status, user1_video_snapshot, user2_video_snapshot,
    dissolved_at, dissolved_by, dissolved_reason, created_at
"#;

pub(crate) fn match_from_row(row: &SqliteRow) -> Result<MatchRecord> {
    let status: String = row.try_get("status")?;
    let dissolved_reason: Option<String> = row.try_get("dissolved_reason")?;

    Ok(MatchRecord {
        id: row.try_get("id")?,
        user_id_1: row.try_get("user_id_1")?,
        user_id_2: row.try_get("user_id_2")?,
        status: status.parse::<MatchStatus>()?,
        user1_video_snapshot: decode_snapshot(row.try_get("user1_video_snapshot")?)?,
        user2_video_snapshot: decode_snapshot(row.try_get("user2_video_snapshot")?)?,
        dissolved_at: row.try_get("dissolved_at")?,
        dissolved_by: row.try_get("dissolved_by")?,
        dissolved_reason: dissolved_reason
            .map(|r| r.parse::<DissolutionReason>())
            .transpose()?,
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) fn encode_snapshot(snapshot: &Option<VideoSnapshot>) -> Result<Option<String>> {
    Ok(snapshot.as_ref().map(serde_json::to_string).transpose()?)
}

pub(crate) fn decode_snapshot(raw: Option<String>) -> Result<Option<VideoSnapshot>> {
    Ok(raw.as_deref().map(serde_json::from_str).transpose()?)
}

pub(crate) async fn find_by_pair<'e, E>(executor: E, pair: &CanonicalPair) -> Result<Option<MatchRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM matches WHERE user_id_1 = ? AND user_id_2 = ?",
        MATCH_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(pair.user_id_1())
        .bind(pair.user_id_2())
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(match_from_row).transpose()
}

pub(crate) async fn find_by_id<'e, E>(executor: E, match_id: &str) -> Result<Option<MatchRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM matches WHERE id = ?", MATCH_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(match_id)
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(match_from_row).transpose()
}

/// Plain insert. A second row for the same pair fails on `idx_matches_pair`.
pub(crate) async fn insert<'e, E>(executor: E, record: &MatchRecord) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO matches (
            id, user_id_1, user_id_2, status, user1_video_snapshot, user2_video_snapshot,
            dissolved_at, dissolved_by, dissolved_reason, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.user_id_1)
    .bind(&record.user_id_2)
    .bind(record.status.as_str())
    .bind(encode_snapshot(&record.user1_video_snapshot)?)
    .bind(encode_snapshot(&record.user2_video_snapshot)?)
    .bind(record.dissolved_at)
    .bind(&record.dissolved_by)
    .bind(record.dissolved_reason.map(|r| r.as_str()))
    .bind(record.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// ACTIVE -> DISSOLVED. The status check and the write happen in one statement.
pub(crate) async fn dissolve<'e, E>(
    executor: E,
    match_id: &str,
    actor_user_id: &str,
    reason: DissolutionReason,
    at: DateTime<Utc>,
) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE matches
        SET status = 'DISSOLVED',
            dissolved_at = ?,
            dissolved_by = ?,
            dissolved_reason = ?
        WHERE id = ? AND status = 'ACTIVE'
        "#,
    )
    .bind(at)
    .bind(actor_user_id)
    .bind(reason.as_str())
    .bind(match_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

pub(crate) async fn list_for_user<'e, E>(
    executor: E,
    user_id: &str,
    status: Option<MatchStatus>,
) -> Result<Vec<MatchRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"
        SELECT {} FROM matches
        WHERE (user_id_1 = ? OR user_id_2 = ?)
          AND (? IS NULL OR status = ?)
        ORDER BY created_at DESC, id DESC
        "#,
        MATCH_COLUMNS
    );
    let status = status.map(|s| s.as_str());
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(user_id)
        .bind(status)
        .bind(status)
        .fetch_all(executor)
        .await?;

    rows.iter().map(match_from_row).collect()
}

/// ACTIVE matches created before `idle_since` whose participants have both
/// been inactive since then. A participant with no member row counts as idle.
pub(crate) async fn find_inactive<'e, E>(
    executor: E,
    idle_since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<String>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let ids: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT m.id
        FROM matches m
        LEFT JOIN members a ON a.id = m.user_id_1
        LEFT JOIN members b ON b.id = m.user_id_2
        WHERE m.status = 'ACTIVE'
          AND m.created_at < ?
          AND (a.last_active_at IS NULL OR a.last_active_at < ?)
          AND (b.last_active_at IS NULL OR b.last_active_at < ?)
        ORDER BY m.created_at ASC
        LIMIT ?
        "#,
    )
    .bind(idle_since)
    .bind(idle_since)
    .bind(idle_since)
    .bind(limit)
    .fetch_all(executor)
    .await?;

    Ok(ids)
}

impl Database {
    pub async fn get_match(&self, match_id: &str) -> Result<Option<MatchRecord>> {
        debug!("Querying match by ID: {}", match_id);
        find_by_id(&self.pool, match_id).await
    }

    /// Order-independent lookup of the match between two users.
    pub async fn find_match_between(&self, a: &str, b: &str) -> Result<Option<MatchRecord>> {
        let pair = CanonicalPair::new(a, b)?;
        debug!("Querying match for pair: {}", pair);
        find_by_pair(&self.pool, &pair).await
    }

    pub async fn list_matches_for_user(
        &self,
        user_id: &str,
        status: Option<MatchStatus>,
    ) -> Result<Vec<MatchRecord>> {
        list_for_user(&self.pool, user_id, status).await
    }
}
