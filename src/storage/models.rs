use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A competition entry, as stored in the `submissions` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub artist_name: String,
    pub audio_url: String,
    pub file_path: String,
    /// Maintained by the store, never written by this crate.
    pub vote_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert shape for `submissions`; every other column is assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubmission {
    pub user_id: Uuid,
    pub title: String,
    pub artist_name: String,
    pub audio_url: String,
    pub file_path: String,
}

/// A row of the `votes` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub submission_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// The (user, submission) pair a vote is inserted or deleted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoteKey {
    pub user_id: Uuid,
    pub submission_id: Uuid,
}

impl VoteKey {
    pub fn new(user_id: Uuid, submission_id: Uuid) -> Self {
        Self {
            user_id,
            submission_id,
        }
    }
}

/// Sort rows by descending vote count. Stable, so equal counts keep store order.
pub fn sort_by_votes(submissions: &mut [Submission]) {
    submissions.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));
}
