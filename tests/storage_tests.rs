use remix_competition::storage::models::{NewSubmission, VoteKey};
use remix_competition::storage::{Database, Store, StoreError, UserRecord, VoteInsert};
use uuid::Uuid;

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

fn new_submission(user_id: Uuid, title: &str) -> NewSubmission {
    NewSubmission {
        user_id,
        title: title.to_string(),
        artist_name: "Artist".to_string(),
        audio_url: format!("http://localhost/media/{user_id}/{title}.mp3"),
        file_path: format!("{user_id}/{title}.mp3"),
    }
}

#[test]
fn test_create_submission_assigns_defaults() {
    let (_dir, db) = test_db();
    let user = Uuid::new_v4();

    let created = db.create_submission(&new_submission(user, "first")).unwrap();
    assert_eq!(created.vote_count, 0);
    assert_eq!(created.user_id, user);
    assert_eq!(created.created_at, created.updated_at);

    let fetched = db.get_submission(created.id).unwrap().expect("row should exist");
    assert_eq!(fetched, created);
}

#[test]
fn test_vote_updates_count_and_is_unique() {
    let (_dir, db) = test_db();
    let submission = db.create_submission(&new_submission(Uuid::new_v4(), "a")).unwrap();
    let key = VoteKey::new(Uuid::new_v4(), submission.id);

    assert_eq!(db.add_vote(key).unwrap(), VoteInsert::Inserted);
    assert_eq!(db.add_vote(key).unwrap(), VoteInsert::Duplicate);
    assert_eq!(db.get_submission(submission.id).unwrap().unwrap().vote_count, 1);

    assert!(db.remove_vote(key).unwrap());
    assert!(!db.remove_vote(key).unwrap());
    assert_eq!(db.get_submission(submission.id).unwrap().unwrap().vote_count, 0);
}

#[test]
fn test_vote_for_unknown_submission() {
    let (_dir, db) = test_db();
    let key = VoteKey::new(Uuid::new_v4(), Uuid::new_v4());
    assert_eq!(db.add_vote(key).unwrap(), VoteInsert::UnknownSubmission);
}

#[test]
fn test_votes_for_user_only_returns_that_user() {
    let (_dir, db) = test_db();
    let a = db.create_submission(&new_submission(Uuid::new_v4(), "a")).unwrap();
    let b = db.create_submission(&new_submission(Uuid::new_v4(), "b")).unwrap();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    db.add_vote(VoteKey::new(alice, a.id)).unwrap();
    db.add_vote(VoteKey::new(alice, b.id)).unwrap();
    db.add_vote(VoteKey::new(bob, b.id)).unwrap();

    let mut alice_votes: Vec<Uuid> = db
        .votes_for_user(alice)
        .unwrap()
        .into_iter()
        .map(|v| v.submission_id)
        .collect();
    alice_votes.sort();
    let mut expected = vec![a.id, b.id];
    expected.sort();
    assert_eq!(alice_votes, expected);

    let bob_votes = db.votes_for_user(bob).unwrap();
    assert_eq!(bob_votes.len(), 1);
    assert_eq!(bob_votes[0].submission_id, b.id);
    assert!(db.votes_for_user(Uuid::new_v4()).unwrap().is_empty());
}

#[tokio::test]
async fn test_listing_is_ordered_by_votes_desc() {
    let (_dir, db) = test_db();
    let low = db.create_submission(&new_submission(Uuid::new_v4(), "low")).unwrap();
    let high = db.create_submission(&new_submission(Uuid::new_v4(), "high")).unwrap();
    let mid = db.create_submission(&new_submission(Uuid::new_v4(), "mid")).unwrap();

    for _ in 0..3 {
        db.add_vote(VoteKey::new(Uuid::new_v4(), high.id)).unwrap();
    }
    db.add_vote(VoteKey::new(Uuid::new_v4(), mid.id)).unwrap();

    let listed = db.list_submissions().await.unwrap();
    let order: Vec<Uuid> = listed.iter().map(|s| s.id).collect();
    assert_eq!(order, vec![high.id, mid.id, low.id]);
    assert!(listed.windows(2).all(|w| w[0].vote_count >= w[1].vote_count));
}

#[tokio::test]
async fn test_store_reports_duplicate_vote_as_constraint() {
    let (_dir, db) = test_db();
    let submission = db.create_submission(&new_submission(Uuid::new_v4(), "a")).unwrap();
    let key = VoteKey::new(Uuid::new_v4(), submission.id);

    db.insert_vote(key).await.unwrap();
    let err = db.insert_vote(key).await.unwrap_err();
    assert!(matches!(err, StoreError::Constraint(_)));

    // Deleting twice is fine
    db.delete_vote(key).await.unwrap();
    db.delete_vote(key).await.unwrap();
    assert!(db.voted_submission_ids(key.user_id).await.unwrap().is_empty());
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let id = {
        let db = Database::open(dir.path()).unwrap();
        db.create_submission(&new_submission(Uuid::new_v4(), "kept")).unwrap().id
    };

    let db = Database::open(dir.path()).unwrap();
    assert_eq!(db.get_submission(id).unwrap().unwrap().title, "kept");
}

#[test]
fn test_user_emails_are_unique_ignoring_case() {
    let (_dir, db) = test_db();
    let record = UserRecord {
        id: Uuid::new_v4(),
        email: "A@Example.com".to_string(),
        password_hash: "hash".to_string(),
        salt: "salt".to_string(),
        created_at: chrono::Utc::now(),
    };

    assert!(db.insert_user(&record).unwrap());
    let again = UserRecord {
        id: Uuid::new_v4(),
        email: "a@example.com".to_string(),
        ..record.clone()
    };
    assert!(!db.insert_user(&again).unwrap());

    let found = db.get_user_by_email("a@EXAMPLE.com").unwrap().unwrap();
    assert_eq!(found.id, record.id);
    assert!(db.get_user_by_email("b@example.com").unwrap().is_none());
}
