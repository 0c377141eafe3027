//! Unit tests for database operations
//!
//! Schema constraints are checked directly with SQL; directory helpers go
//! through the `Database` API. Single-connection cases use in-memory SQLite.

mod common;

use chrono::Utc;
use common::fixtures::*;
use matchmaker::database::Database;
use matchmaker::errors::EngineError;
use sqlx::Row;

async fn insert_raw_match(db: &Database, id: &str, u1: &str, u2: &str) -> Result<(), EngineError> {
    sqlx::query(
        r#"
        INSERT INTO matches (id, user_id_1, user_id_2, status, created_at)
        VALUES (?, ?, ?, 'ACTIVE', ?)
        "#,
    )
    .bind(id)
    .bind(u1)
    .bind(u2)
    .bind(Utc::now())
    .execute(db.pool())
    .await?;
    Ok(())
}

#[tokio::test]
async fn test_database_initialization() {
    let db = TestDatabase::in_memory()
        .await
        .expect("Failed to create test database");

    let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type='table'")
        .fetch_all(db.pool())
        .await
        .expect("Failed to query tables");
    let table_names: Vec<String> = rows.iter().map(|row| row.get::<String, _>("name")).collect();

    for table in ["members", "likes", "matches", "match_reveals"] {
        assert!(table_names.contains(&table.to_string()), "missing {}", table);
    }

    let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type='index'")
        .fetch_all(db.pool())
        .await
        .unwrap();
    let index_names: Vec<String> = rows.iter().map(|row| row.get::<String, _>("name")).collect();
    assert!(index_names.contains(&"idx_matches_pair".to_string()));
    assert!(index_names.contains(&"idx_match_reveals_user_status".to_string()));
}

#[tokio::test]
async fn test_reopening_existing_database_is_safe() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("reopen.db").to_string_lossy().to_string();

    let first = Database::new(&path).await.unwrap();
    seed_member(&first, ALICE).await;
    first.pool().close().await;

    let second = Database::new(&path).await.unwrap();
    assert!(second.get_member(ALICE).await.unwrap().is_some());
}

#[tokio::test]
async fn test_pair_index_rejects_duplicates() {
    let db = TestDatabase::in_memory().await.unwrap();
    let database = db.database();

    insert_raw_match(&database, "m-1", ALICE, BOB).await.unwrap();
    let err = insert_raw_match(&database, "m-2", ALICE, BOB)
        .await
        .unwrap_err();

    assert!(err.is_unique_violation(), "unexpected error: {:?}", err);
    assert_eq!(err.code(), "UNIQUE_VIOLATION");
    assert_eq!(db.count_matches().await, 1);
}

#[tokio::test]
async fn test_pair_must_be_stored_in_canonical_order() {
    let db = TestDatabase::in_memory().await.unwrap();

    let result = insert_raw_match(&db.database(), "m-1", BOB, ALICE).await;
    assert!(result.is_err(), "reversed pair must violate the CHECK");

    let result = insert_raw_match(&db.database(), "m-2", ALICE, ALICE).await;
    assert!(result.is_err(), "self pair must violate the CHECK");
}

#[tokio::test]
async fn test_one_reveal_per_participant() {
    let db = TestDatabase::in_memory().await.unwrap();
    let database = db.database();
    insert_raw_match(&database, "m-1", ALICE, BOB).await.unwrap();

    let insert_reveal = |id: &'static str| {
        sqlx::query(
            r#"
            INSERT INTO match_reveals (id, match_id, user_id, status, created_at)
            VALUES (?, 'm-1', ?, 'PENDING', ?)
            "#,
        )
        .bind(id)
        .bind(ALICE)
        .bind(Utc::now())
    };

    insert_reveal("r-1").execute(db.pool()).await.unwrap();
    assert!(insert_reveal("r-2").execute(db.pool()).await.is_err());
}

#[tokio::test]
async fn test_status_values_are_constrained() {
    let db = TestDatabase::in_memory().await.unwrap();

    let result = sqlx::query(
        r#"
        INSERT INTO matches (id, user_id_1, user_id_2, status, created_at)
        VALUES ('m-1', ?, ?, 'PAUSED', ?)
        "#,
    )
    .bind(ALICE)
    .bind(BOB)
    .bind(Utc::now())
    .execute(db.pool())
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_likes_are_directional_and_idempotent() {
    let db = TestDatabase::in_memory().await.unwrap();
    let database = db.database();

    assert!(database.record_like(ALICE, BOB).await.unwrap());
    assert!(!database.record_like(ALICE, BOB).await.unwrap());

    assert!(database.has_like(ALICE, BOB).await.unwrap());
    assert!(!database.has_like(BOB, ALICE).await.unwrap());

    let like = database.get_like(ALICE, BOB).await.unwrap().unwrap();
    assert_eq!(like.source_user_id, ALICE);
    assert_eq!(like.target_user_id, BOB);
    assert!(database.get_like(BOB, ALICE).await.unwrap().is_none());
}

#[tokio::test]
async fn test_member_upsert_and_activity() {
    let db = TestDatabase::in_memory().await.unwrap();
    let database = db.database();

    let mut alice = member(ALICE);
    database.upsert_member(&alice).await.unwrap();

    alice.city = Some("Porto".to_string());
    database.upsert_member(&alice).await.unwrap();

    let stored = database.get_member(ALICE).await.unwrap().unwrap();
    assert_eq!(stored.name, "Alice");
    assert_eq!(stored.city.as_deref(), Some("Porto"));

    let at = hours_ago(1);
    assert_eq!(database.touch_member_activity(ALICE, at).await.unwrap(), 1);
    assert_eq!(database.touch_member_activity(CAROL, at).await.unwrap(), 0);

    let stored = database.get_member(ALICE).await.unwrap().unwrap();
    assert_eq!(stored.last_active_at, Some(at));
    assert!(database.get_member(CAROL).await.unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_lookups_return_none() {
    let db = TestDatabase::in_memory().await.unwrap();
    let database = db.database();

    assert!(database.get_match("missing").await.unwrap().is_none());
    assert!(database.get_reveal("missing").await.unwrap().is_none());
    assert!(database.get_reveals_for_match("missing").await.unwrap().is_empty());
    assert!(database.find_match_between(ALICE, BOB).await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_match_between_rejects_self_pair() {
    let db = TestDatabase::in_memory().await.unwrap();

    let err = db
        .database()
        .find_match_between(ALICE, ALICE)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_PAIR");
}
