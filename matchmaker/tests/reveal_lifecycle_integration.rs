//! Integration tests for the per-participant reveal lifecycle
//!
//! PENDING -> REVEALED -> DISMISSED, or PENDING -> DISMISSED. Every transition
//! is owner-only and reports the number of rows it changed, so repeated or
//! out-of-order calls are no-ops rather than errors.

mod common;

use common::fixtures::*;
use matchmaker::database::{DissolutionReason, RevealStatus};
use matchmaker::services::{
    DissolutionService, MatchCreationService, MatchWithReveals, RevealQueryService,
};

async fn create_match(db: &TestDatabase, a: &str, b: &str) -> MatchWithReveals {
    seed_matchable_pair(&db.database(), a, b).await;
    MatchCreationService::new(db.database())
        .create_match(a, b)
        .await
        .expect("create match")
        .into_result()
}

fn reveal_service(db: &TestDatabase) -> RevealQueryService {
    RevealQueryService::new(test_config(), db.database())
}

#[tokio::test]
async fn test_pending_reveals_include_counterpart_profile() {
    let db = TestDatabase::new().await.unwrap();
    let created = create_match(&db, ALICE, BOB).await;

    let pending = reveal_service(&db).get_pending_reveals(ALICE).await.unwrap();

    assert_eq!(pending.len(), 1);
    let item = &pending[0];
    assert_eq!(item.reveal.id, created.reveal_for(ALICE).unwrap().id);
    assert_eq!(item.reveal.status, RevealStatus::Pending);
    assert_eq!(item.counterpart.user_id, BOB);
    assert_eq!(item.counterpart.name.as_deref(), Some("Bob"));
    assert_eq!(item.counterpart.city.as_deref(), Some("Lisbon"));
    assert!(item.counterpart.image_url.is_some());
    assert_eq!(
        item.reveal.video_snapshot.as_ref().unwrap().video_url,
        video_url(BOB)
    );
}

#[tokio::test]
async fn test_pending_reveals_are_newest_first_and_limited() {
    let db = TestDatabase::new().await.unwrap();
    let database = db.database();
    seed_member(&database, ALICE).await;

    let creation = MatchCreationService::new(database.clone());
    let mut alice_reveal_ids = Vec::new();
    for i in 0..12 {
        let other = format!("user-{:02}", i);
        seed_member(&database, &other).await;
        seed_mutual_likes(&database, ALICE, &other).await;
        let created = creation.create_match(ALICE, &other).await.unwrap().into_result();
        let reveal_id = created.reveal_for(ALICE).unwrap().id.clone();
        // Spread creation times one minute apart, oldest first
        set_reveal_created_at(&database, &reveal_id, minutes_ago(60 - i)).await;
        alice_reveal_ids.push(reveal_id);
    }

    let pending = reveal_service(&db).get_pending_reveals(ALICE).await.unwrap();

    assert_eq!(pending.len(), 10, "batch is capped at 10");
    let returned: Vec<&str> = pending.iter().map(|p| p.reveal.id.as_str()).collect();
    let expected: Vec<&str> = alice_reveal_ids
        .iter()
        .rev()
        .take(10)
        .map(String::as_str)
        .collect();
    assert_eq!(returned, expected);
}

#[tokio::test]
async fn test_pending_excludes_other_users_and_non_pending() {
    let db = TestDatabase::new().await.unwrap();
    let created = create_match(&db, ALICE, BOB).await;
    let service = reveal_service(&db);

    assert!(service.get_pending_reveals(CAROL).await.unwrap().is_empty());

    let alice_reveal = created.reveal_for(ALICE).unwrap();
    assert_eq!(service.mark_reveal_seen(&alice_reveal.id, ALICE).await.unwrap(), 1);

    assert!(service.get_pending_reveals(ALICE).await.unwrap().is_empty());
    // Bob's reveal is independent of Alice's
    assert_eq!(service.get_pending_reveals(BOB).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_pending_excludes_dissolved_matches() {
    let db = TestDatabase::new().await.unwrap();
    let created = create_match(&db, ALICE, BOB).await;

    let dissolved = DissolutionService::new(db.database())
        .dissolve_match(&created.match_record.id, ALICE, DissolutionReason::UserUnmatch)
        .await
        .unwrap();
    assert_eq!(dissolved, 1);

    let service = reveal_service(&db);
    assert!(service.get_pending_reveals(ALICE).await.unwrap().is_empty());
    assert!(service.get_pending_reveals(BOB).await.unwrap().is_empty());

    // Reveal rows survive dissolution untouched
    let reveals = db
        .database()
        .get_reveals_for_match(&created.match_record.id)
        .await
        .unwrap();
    assert!(reveals.iter().all(|r| r.status == RevealStatus::Pending));
}

#[tokio::test]
async fn test_mark_seen_transitions_once() {
    let db = TestDatabase::new().await.unwrap();
    let created = create_match(&db, ALICE, BOB).await;
    let service = reveal_service(&db);
    let reveal_id = created.reveal_for(ALICE).unwrap().id.clone();

    assert_eq!(service.mark_reveal_seen(&reveal_id, ALICE).await.unwrap(), 1);

    let stored = db.database().get_reveal(&reveal_id).await.unwrap().unwrap();
    assert_eq!(stored.status, RevealStatus::Revealed);
    let revealed_at = stored.revealed_at.expect("revealed_at set");
    assert_eq!(stored.last_shown_at, Some(revealed_at));
    assert!(stored.dismissed_at.is_none());

    assert_eq!(
        service.mark_reveal_seen(&reveal_id, ALICE).await.unwrap(),
        0,
        "second call is a no-op"
    );
    let again = db.database().get_reveal(&reveal_id).await.unwrap().unwrap();
    assert_eq!(again.revealed_at, Some(revealed_at));

    let bob_reveal = db
        .database()
        .get_reveal(&created.reveal_for(BOB).unwrap().id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bob_reveal.status, RevealStatus::Pending);
}

#[tokio::test]
async fn test_transitions_are_owner_only() {
    let db = TestDatabase::new().await.unwrap();
    let created = create_match(&db, ALICE, BOB).await;
    let service = reveal_service(&db);
    let alice_reveal_id = created.reveal_for(ALICE).unwrap().id.clone();

    assert_eq!(service.mark_reveal_seen(&alice_reveal_id, BOB).await.unwrap(), 0);
    assert_eq!(service.mark_reveal_dismissed(&alice_reveal_id, CAROL).await.unwrap(), 0);
    assert_eq!(service.mark_reveal_seen("no-such-reveal", ALICE).await.unwrap(), 0);

    let stored = db.database().get_reveal(&alice_reveal_id).await.unwrap().unwrap();
    assert_eq!(stored.status, RevealStatus::Pending);
}

#[tokio::test]
async fn test_dismiss_from_pending() {
    let db = TestDatabase::new().await.unwrap();
    let created = create_match(&db, ALICE, BOB).await;
    let service = reveal_service(&db);
    let reveal_id = created.reveal_for(BOB).unwrap().id.clone();

    assert_eq!(service.mark_reveal_dismissed(&reveal_id, BOB).await.unwrap(), 1);

    let stored = db.database().get_reveal(&reveal_id).await.unwrap().unwrap();
    assert_eq!(stored.status, RevealStatus::Dismissed);
    assert!(stored.dismissed_at.is_some());
    assert!(stored.revealed_at.is_none());

    assert_eq!(service.mark_reveal_dismissed(&reveal_id, BOB).await.unwrap(), 0);
}

#[tokio::test]
async fn test_dismiss_from_revealed() {
    let db = TestDatabase::new().await.unwrap();
    let created = create_match(&db, ALICE, BOB).await;
    let service = reveal_service(&db);
    let reveal_id = created.reveal_for(ALICE).unwrap().id.clone();

    assert_eq!(service.mark_reveal_seen(&reveal_id, ALICE).await.unwrap(), 1);
    assert_eq!(service.mark_reveal_dismissed(&reveal_id, ALICE).await.unwrap(), 1);

    let stored = db.database().get_reveal(&reveal_id).await.unwrap().unwrap();
    assert_eq!(stored.status, RevealStatus::Dismissed);
    assert!(stored.revealed_at.is_some());
    assert!(stored.dismissed_at.is_some());
}

#[tokio::test]
async fn test_seen_after_dismissed_changes_nothing() {
    let db = TestDatabase::new().await.unwrap();
    let created = create_match(&db, ALICE, BOB).await;
    let service = reveal_service(&db);
    let reveal_id = created.reveal_for(ALICE).unwrap().id.clone();

    assert_eq!(service.mark_reveal_dismissed(&reveal_id, ALICE).await.unwrap(), 1);
    let before = db.database().get_reveal(&reveal_id).await.unwrap().unwrap();

    assert_eq!(service.mark_reveal_seen(&reveal_id, ALICE).await.unwrap(), 0);

    let after = db.database().get_reveal(&reveal_id).await.unwrap().unwrap();
    assert_eq!(after, before);
    assert_eq!(after.status, RevealStatus::Dismissed);
    assert!(after.revealed_at.is_none());
    assert!(after.last_shown_at.is_none());
}
