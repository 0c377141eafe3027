//! Seed data and timestamp helpers

use chrono::{DateTime, Duration, Utc};
use matchmaker::database::{Database, MemberRecord};

pub const ALICE: &str = "user-alice";
pub const BOB: &str = "user-bob";
pub const CAROL: &str = "user-carol";
pub const DAVE: &str = "user-dave";

pub fn video_url(user_id: &str) -> String {
    format!("https://cdn.example.test/videos/{}.mp4", user_id)
}

pub fn thumbnail_url(user_id: &str) -> String {
    format!("https://cdn.example.test/thumbs/{}.jpg", user_id)
}

/// A member with a profile video who was active just now
pub fn member(user_id: &str) -> MemberRecord {
    let name = user_id.trim_start_matches("user-");
    let mut chars = name.chars();
    let name = match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    };

    MemberRecord {
        id: user_id.to_string(),
        name,
        image_url: Some(format!("https://cdn.example.test/avatars/{}.png", user_id)),
        city: Some("Lisbon".to_string()),
        video_url: Some(video_url(user_id)),
        video_thumbnail_url: Some(thumbnail_url(user_id)),
        last_active_at: Some(Utc::now()),
        created_at: Utc::now() - Duration::days(90),
    }
}

pub async fn seed_member(db: &Database, user_id: &str) {
    db.upsert_member(&member(user_id))
        .await
        .expect("seed member");
}

pub async fn seed_members(db: &Database, user_ids: &[&str]) {
    for user_id in user_ids {
        seed_member(db, user_id).await;
    }
}

pub async fn seed_mutual_likes(db: &Database, a: &str, b: &str) {
    db.record_like(a, b).await.expect("like a -> b");
    db.record_like(b, a).await.expect("like b -> a");
}

/// Members plus mutual likes, ready for `create_match`
pub async fn seed_matchable_pair(db: &Database, a: &str, b: &str) {
    seed_members(db, &[a, b]).await;
    seed_mutual_likes(db, a, b).await;
}

pub async fn set_last_active(db: &Database, user_id: &str, at: Option<DateTime<Utc>>) {
    sqlx::query("UPDATE members SET last_active_at = ? WHERE id = ?")
        .bind(at)
        .bind(user_id)
        .execute(db.pool())
        .await
        .expect("set last_active_at");
}

pub async fn set_last_shown(db: &Database, reveal_id: &str, at: Option<DateTime<Utc>>) {
    sqlx::query("UPDATE match_reveals SET last_shown_at = ? WHERE id = ?")
        .bind(at)
        .bind(reveal_id)
        .execute(db.pool())
        .await
        .expect("set last_shown_at");
}

pub async fn set_match_created_at(db: &Database, match_id: &str, at: DateTime<Utc>) {
    sqlx::query("UPDATE matches SET created_at = ? WHERE id = ?")
        .bind(at)
        .bind(match_id)
        .execute(db.pool())
        .await
        .expect("set matches.created_at");
}

pub async fn set_reveal_created_at(db: &Database, reveal_id: &str, at: DateTime<Utc>) {
    sqlx::query("UPDATE match_reveals SET created_at = ? WHERE id = ?")
        .bind(at)
        .bind(reveal_id)
        .execute(db.pool())
        .await
        .expect("set match_reveals.created_at");
}

pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    Utc::now() - Duration::minutes(minutes)
}

pub fn hours_ago(hours: i64) -> DateTime<Utc> {
    Utc::now() - Duration::hours(hours)
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}
