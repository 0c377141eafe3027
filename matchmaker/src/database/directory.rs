//! Like and member store access.
//!
//! The engine only reads these tables. The write helpers are used by the
//! upstream like workflow, the presence tracker and test seeding.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite};
use tracing::debug;

use super::records::{LikeRecord, MemberRecord};
use super::Database;
use crate::errors::Result;

fn member_from_row(row: &SqliteRow) -> Result<MemberRecord> {
    Ok(MemberRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        image_url: row.try_get("image_url")?,
        city: row.try_get("city")?,
        video_url: row.try_get("video_url")?,
        video_thumbnail_url: row.try_get("video_thumbnail_url")?,
        last_active_at: row.try_get("last_active_at")?,
        created_at: row.try_get("created_at")?,
    })
}

/// True only if both directional likes between `a` and `b` exist.
pub(crate) async fn mutual_likes_exist<'e, E>(executor: E, a: &str, b: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM likes
        WHERE (source_user_id = ? AND target_user_id = ?)
           OR (source_user_id = ? AND target_user_id = ?)
        "#,
    )
    .bind(a)
    .bind(b)
    .bind(b)
    .bind(a)
    .fetch_one(executor)
    .await?;

    Ok(count == 2)
}

pub(crate) async fn find_member<'e, E>(executor: E, user_id: &str) -> Result<Option<MemberRecord>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        SELECT id, name, image_url, city, video_url, video_thumbnail_url,
               last_active_at, created_at
        FROM members
        WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    row.as_ref().map(member_from_row).transpose()
}

impl Database {
    /// Record a directional like. Returns false if it already existed.
    pub async fn record_like(&self, source_user_id: &str, target_user_id: &str) -> Result<bool> {
        debug!("Recording like {} -> {}", source_user_id, target_user_id);

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO likes (source_user_id, target_user_id, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(source_user_id)
        .bind(target_user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn has_like(&self, source_user_id: &str, target_user_id: &str) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM likes WHERE source_user_id = ? AND target_user_id = ?)",
        )
        .bind(source_user_id)
        .bind(target_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists != 0)
    }

    pub async fn get_like(
        &self,
        source_user_id: &str,
        target_user_id: &str,
    ) -> Result<Option<LikeRecord>> {
        let row = sqlx::query(
            r#"
            SELECT source_user_id, target_user_id, created_at
            FROM likes
            WHERE source_user_id = ? AND target_user_id = ?
            "#,
        )
        .bind(source_user_id)
        .bind(target_user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(LikeRecord {
                source_user_id: row.try_get("source_user_id")?,
                target_user_id: row.try_get("target_user_id")?,
                created_at: row.try_get("created_at")?,
            })),
            None => Ok(None),
        }
    }

    /// Insert or replace a member's profile, video and presence fields.
    pub async fn upsert_member(&self, member: &MemberRecord) -> Result<()> {
        debug!("Storing member: {}", member.id);

        sqlx::query(
            r#"
            INSERT INTO members (
                id, name, image_url, city, video_url, video_thumbnail_url,
                last_active_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                image_url = excluded.image_url,
                city = excluded.city,
                video_url = excluded.video_url,
                video_thumbnail_url = excluded.video_thumbnail_url,
                last_active_at = excluded.last_active_at
            "#,
        )
        .bind(&member.id)
        .bind(&member.name)
        .bind(&member.image_url)
        .bind(&member.city)
        .bind(&member.video_url)
        .bind(&member.video_thumbnail_url)
        .bind(member.last_active_at)
        .bind(member.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_member(&self, user_id: &str) -> Result<Option<MemberRecord>> {
        find_member(&self.pool, user_id).await
    }

    /// Presence heartbeat. Returns the number of members updated (0 or 1).
    pub async fn touch_member_activity(&self, user_id: &str, at: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("UPDATE members SET last_active_at = ? WHERE id = ?")
            .bind(at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
