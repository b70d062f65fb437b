use async_trait::async_trait;
use chrono::Utc;
use redb::ReadableTable;
use uuid::Uuid;

use super::db::{Database, DatabaseError};
use super::models::{NewSubmission, Submission, Vote, VoteKey};
use super::tables::*;
use super::{Store, StoreError};

/// Outcome of inserting a vote row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteInsert {
    Inserted,
    /// A vote for this (user, submission) pair already exists.
    Duplicate,
    /// The submission does not exist.
    UnknownSubmission,
}

fn vote_key(key: &VoteKey) -> String {
    format!("{}:{}", key.user_id, key.submission_id)
}

impl Database {
    // ========================================================================
    // Submission operations
    // ========================================================================

    /// Insert a submission with a fresh id, zero votes and current timestamps
    pub fn create_submission(&self, new: &NewSubmission) -> Result<Submission, DatabaseError> {
        let now = Utc::now();
        let submission = Submission {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            title: new.title.clone(),
            artist_name: new.artist_name.clone(),
            audio_url: new.audio_url.clone(),
            file_path: new.file_path.clone(),
            vote_count: 0,
            created_at: now,
            updated_at: now,
        };

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(SUBMISSIONS)?;
            let data = rmp_serde::to_vec_named(&submission)?;
            table.insert(submission.id.to_string().as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(submission)
    }

    pub fn get_submission(&self, id: Uuid) -> Result<Option<Submission>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SUBMISSIONS)?;

        match table.get(id.to_string().as_str())? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }

    /// All submissions, most votes first, oldest first among equals
    pub fn all_submissions(&self) -> Result<Vec<Submission>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SUBMISSIONS)?;

        let mut submissions = Vec::new();
        for result in table.iter()? {
            let (_, value) = result?;
            let submission: Submission = rmp_serde::from_slice(value.value())?;
            submissions.push(submission);
        }

        submissions.sort_by(|a, b| {
            b.vote_count
                .cmp(&a.vote_count)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(submissions)
    }

    // ========================================================================
    // Vote operations
    // ========================================================================

    /// Insert a vote and bump the submission's vote count in one transaction
    pub fn add_vote(&self, key: VoteKey) -> Result<VoteInsert, DatabaseError> {
        let row_key = vote_key(&key);
        let submission_key = key.submission_id.to_string();

        let write_txn = self.begin_write()?;
        let outcome = {
            let mut votes = write_txn.open_table(VOTES)?;
            let mut submissions = write_txn.open_table(SUBMISSIONS)?;

            let exists = votes.get(row_key.as_str())?.is_some();
            let submission: Option<Submission> = {
                let result = match submissions.get(submission_key.as_str())? {
                    Some(data) => Some(rmp_serde::from_slice(data.value())?),
                    None => None,
                };
                result
            };

            match (exists, submission) {
                (true, _) => VoteInsert::Duplicate,
                (false, None) => VoteInsert::UnknownSubmission,
                (false, Some(mut submission)) => {
                    let vote = Vote {
                        id: Uuid::new_v4(),
                        user_id: key.user_id,
                        submission_id: key.submission_id,
                        created_at: Utc::now(),
                    };
                    let data = rmp_serde::to_vec_named(&vote)?;
                    votes.insert(row_key.as_str(), data.as_slice())?;

                    submission.vote_count += 1;
                    submission.updated_at = Utc::now();
                    let data = rmp_serde::to_vec_named(&submission)?;
                    submissions.insert(submission_key.as_str(), data.as_slice())?;
                    VoteInsert::Inserted
                }
            }
        };
        write_txn.commit()?;
        Ok(outcome)
    }

    /// Remove a vote and decrement the vote count. Returns whether a row was removed.
    pub fn remove_vote(&self, key: VoteKey) -> Result<bool, DatabaseError> {
        let row_key = vote_key(&key);
        let submission_key = key.submission_id.to_string();

        let write_txn = self.begin_write()?;
        let removed = {
            let mut votes = write_txn.open_table(VOTES)?;
            let removed = votes.remove(row_key.as_str())?.is_some();

            if removed {
                let mut submissions = write_txn.open_table(SUBMISSIONS)?;
                let submission: Option<Submission> = {
                    let result = match submissions.get(submission_key.as_str())? {
                        Some(data) => Some(rmp_serde::from_slice(data.value())?),
                        None => None,
                    };
                    result
                };
                if let Some(mut submission) = submission {
                    submission.vote_count = (submission.vote_count - 1).max(0);
                    submission.updated_at = Utc::now();
                    let data = rmp_serde::to_vec_named(&submission)?;
                    submissions.insert(submission_key.as_str(), data.as_slice())?;
                }
            }
            removed
        };
        write_txn.commit()?;
        Ok(removed)
    }

    /// All votes cast by a user
    pub fn votes_for_user(&self, user_id: Uuid) -> Result<Vec<Vote>, DatabaseError> {
        let prefix = format!("{user_id}:");
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(VOTES)?;

        let mut votes = Vec::new();
        for result in table.range(prefix.as_str()..)? {
            let (key, value) = result?;
            if !key.value().starts_with(&prefix) {
                break;
            }
            let vote: Vote = rmp_serde::from_slice(value.value())?;
            votes.push(vote);
        }

        Ok(votes)
    }
}

#[async_trait]
impl Store for Database {
    async fn list_submissions(&self) -> Result<Vec<Submission>, StoreError> {
        Ok(self.all_submissions()?)
    }

    async fn insert_submission(&self, new: &NewSubmission) -> Result<Submission, StoreError> {
        Ok(self.create_submission(new)?)
    }

    async fn voted_submission_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        Ok(self
            .votes_for_user(user_id)?
            .into_iter()
            .map(|vote| vote.submission_id)
            .collect())
    }

    async fn insert_vote(&self, key: VoteKey) -> Result<(), StoreError> {
        match self.add_vote(key)? {
            VoteInsert::Inserted => Ok(()),
            VoteInsert::Duplicate => Err(StoreError::Constraint(
                "duplicate key value violates unique constraint \"votes_user_id_submission_id_key\""
                    .to_string(),
            )),
            VoteInsert::UnknownSubmission => Err(StoreError::Constraint(
                "insert or update on table \"votes\" violates foreign key constraint \"votes_submission_id_fkey\""
                    .to_string(),
            )),
        }
    }

    async fn delete_vote(&self, key: VoteKey) -> Result<(), StoreError> {
        self.remove_vote(key)?;
        Ok(())
    }
}
