pub mod db;
mod postgrest;
pub mod models;
mod submissions;
mod tables;
mod users;

pub use db::{Database, DatabaseError};
pub use postgrest::PostgrestStore;
pub use submissions::VoteInsert;
pub use tables::*;
pub use users::UserRecord;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use models::{NewSubmission, Submission, VoteKey};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness or foreign-key constraint rejected the write.
    #[error("{0}")]
    Constraint(String),
    #[error("{0}")]
    Backend(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// The relational tables the competition reads and writes.
#[async_trait]
pub trait Store: Send + Sync {
    /// All submissions, highest `vote_count` first.
    async fn list_submissions(&self) -> Result<Vec<Submission>, StoreError>;
    async fn insert_submission(&self, new: &NewSubmission) -> Result<Submission, StoreError>;
    /// Ids of every submission the user has a vote row for.
    async fn voted_submission_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError>;
    async fn insert_vote(&self, key: VoteKey) -> Result<(), StoreError>;
    /// Deleting a vote that does not exist is not an error.
    async fn delete_vote(&self, key: VoteKey) -> Result<(), StoreError>;
}
