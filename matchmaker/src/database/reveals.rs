//! Reveal database operations.
//!
//! Status only moves forward: every update carries its allowed source states
//! in the `WHERE` clause and reports how many rows it touched.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, QueryBuilder, Row, Sqlite};
use tracing::debug;

use super::matches::{decode_snapshot, encode_snapshot};
use super::records::{ProfileSummary, RevealRecord, RevealStatus, RevealWithCounterpart};
use super::Database;
use crate::errors::Result;

const REVEAL_COLUMNS: &str = r#"
    r.id, r.match_id, r.user_id, r.video_snapshot, r.status, r.created_at,
    r.revealed_at, r.last_shown_at, r.dismissed_at
"#;

// Reveal joined to its match and the other participant's member row
const COUNTERPART_JOIN: &str = r#"
    FROM match_reveals r
    JOIN matches m ON m.id = r.match_id
    LEFT JOIN members p
        ON p.id = CASE WHEN m.user_id_1 = r.user_id THEN m.user_id_2 ELSE m.user_id_1 END
"#;

const COUNTERPART_COLUMNS: &str = r#"
    CASE WHEN m.user_id_1 = r.user_id THEN m.user_id_2 ELSE m.user_id_1 END AS counterpart_id,
    p.name AS counterpart_name,
    p.image_url AS counterpart_image_url,
    p.city AS counterpart_city
"#;

pub(crate) fn reveal_from_row(row: &SqliteRow) -> Result<RevealRecord> {
    let status: String = row.try_get("status")?;

    Ok(RevealRecord {
        id: row.try_get("id")?,
        match_id: row.try_get("match_id")?,
        user_id: row.try_get("user_id")?,
        video_snapshot: decode_snapshot(row.try_get("video_snapshot")?)?,
        status: status.parse::<RevealStatus>()?,
        created_at: row.try_get("created_at")?,
        revealed_at: row.try_get("revealed_at")?,
        last_shown_at: row.try_get("last_shown_at")?,
        dismissed_at: row.try_get("dismissed_at")?,
    })
}

fn with_counterpart_from_row(row: &SqliteRow) -> Result<RevealWithCounterpart> {
    Ok(RevealWithCounterpart {
        reveal: reveal_from_row(row)?,
        counterpart: ProfileSummary {
            user_id: row.try_get("counterpart_id")?,
            name: row.try_get("counterpart_name")?,
            image_url: row.try_get("counterpart_image_url")?,
            city: row.try_get("counterpart_city")?,
        },
    })
}

pub(crate) async fn insert<'e, E>(executor: E, record: &RevealRecord) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO match_reveals (
            id, match_id, user_id, video_snapshot, status, created_at,
            revealed_at, last_shown_at, dismissed_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.match_id)
    .bind(&record.user_id)
    .bind(encode_snapshot(&record.video_snapshot)?)
    .bind(record.status.as_str())
    .bind(record.created_at)
    .bind(record.revealed_at)
    .bind(record.last_shown_at)
    .bind(record.dismissed_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn find_for_match<'e, E>(executor: E, match_id: &str) -> Result<Vec<RevealRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM match_reveals r WHERE r.match_id = ? ORDER BY r.user_id",
        REVEAL_COLUMNS
    );
    let rows = sqlx::query(&sql).bind(match_id).fetch_all(executor).await?;

    rows.iter().map(reveal_from_row).collect()
}

pub(crate) async fn find_by_id<'e, E>(executor: E, reveal_id: &str) -> Result<Option<RevealRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM match_reveals r WHERE r.id = ?",
        REVEAL_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(reveal_id)
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(reveal_from_row).transpose()
}

/// Most recent PENDING reveals of ACTIVE matches owned by `user_id`.
pub(crate) async fn pending_for_user<'e, E>(
    executor: E,
    user_id: &str,
    limit: i64,
) -> Result<Vec<RevealWithCounterpart>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"
        SELECT {}, {}
        {}
        WHERE r.user_id = ?
          AND r.status = 'PENDING'
          AND m.status = 'ACTIVE'
        ORDER BY r.created_at DESC, r.id DESC
        LIMIT ?
        "#,
        REVEAL_COLUMNS, COUNTERPART_COLUMNS, COUNTERPART_JOIN
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(limit)
        .fetch_all(executor)
        .await?;

    rows.iter().map(with_counterpart_from_row).collect()
}

/// REVEALED reveals of ACTIVE matches whose counterpart was active at or after
/// `online_since` and which were last shown before `shown_before` (or never).
pub(crate) async fn resurfacing_candidates<'e, E>(
    executor: E,
    user_id: &str,
    online_since: DateTime<Utc>,
    shown_before: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<RevealWithCounterpart>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"
        SELECT {}, {}
        {}
        WHERE r.user_id = ?
          AND r.status = 'REVEALED'
          AND m.status = 'ACTIVE'
          AND p.last_active_at IS NOT NULL
          AND p.last_active_at >= ?
          AND (r.last_shown_at IS NULL OR r.last_shown_at < ?)
        ORDER BY r.created_at DESC, r.id DESC
        LIMIT ?
        "#,
        REVEAL_COLUMNS, COUNTERPART_COLUMNS, COUNTERPART_JOIN
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(online_since)
        .bind(shown_before)
        .bind(limit)
        .fetch_all(executor)
        .await?;

    rows.iter().map(with_counterpart_from_row).collect()
}

/// Stamp `last_shown_at` on exactly the given reveal ids.
pub(crate) async fn stamp_last_shown<'e, E>(
    executor: E,
    reveal_ids: &[String],
    at: DateTime<Utc>,
) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    if reveal_ids.is_empty() {
        return Ok(0);
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("UPDATE match_reveals SET last_shown_at = ");
    builder.push_bind(at);
    builder.push(" WHERE status = 'REVEALED' AND id IN (");
    let mut ids = builder.separated(", ");
    for id in reveal_ids {
        ids.push_bind(id);
    }
    ids.push_unseparated(")");

    let result = builder.build().execute(executor).await?;
    Ok(result.rows_affected())
}

/// PENDING -> REVEALED for the owner only.
pub(crate) async fn mark_seen<'e, E>(
    executor: E,
    reveal_id: &str,
    user_id: &str,
    at: DateTime<Utc>,
) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE match_reveals
        SET status = 'REVEALED',
            revealed_at = ?,
            last_shown_at = ?
        WHERE id = ? AND user_id = ? AND status = 'PENDING'
        "#,
    )
    .bind(at)
    .bind(at)
    .bind(reveal_id)
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// PENDING or REVEALED -> DISMISSED for the owner only.
pub(crate) async fn mark_dismissed<'e, E>(
    executor: E,
    reveal_id: &str,
    user_id: &str,
    at: DateTime<Utc>,
) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        UPDATE match_reveals
        SET status = 'DISMISSED',
            dismissed_at = ?
        WHERE id = ? AND user_id = ? AND status IN ('PENDING', 'REVEALED')
        "#,
    )
    .bind(at)
    .bind(reveal_id)
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

impl Database {
    pub async fn get_reveal(&self, reveal_id: &str) -> Result<Option<RevealRecord>> {
        debug!("Querying reveal by ID: {}", reveal_id);
        find_by_id(&self.pool, reveal_id).await
    }

    /// Both reveals of a match, ordered by owner id.
    pub async fn get_reveals_for_match(&self, match_id: &str) -> Result<Vec<RevealRecord>> {
        debug!("Querying reveals for match: {}", match_id);
        find_for_match(&self.pool, match_id).await
    }
}
