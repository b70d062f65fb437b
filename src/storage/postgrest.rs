use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use uuid::Uuid;

use super::models::{NewSubmission, Submission, VoteKey};
use super::{Store, StoreError};
use crate::supabase::{error_message, SupabaseClient};

/// Hosted tables, reached through Supabase's PostgREST endpoint.
pub struct PostgrestStore {
    client: Arc<SupabaseClient>,
}

#[derive(Deserialize)]
struct VotedSubmission {
    submission_id: Uuid,
}

impl PostgrestStore {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self { client }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let resp = request
            .send()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let message = error_message(resp).await;
        if status == reqwest::StatusCode::CONFLICT {
            Err(StoreError::Constraint(message))
        } else {
            Err(StoreError::Backend(message))
        }
    }
}

#[async_trait]
impl Store for PostgrestStore {
    async fn list_submissions(&self) -> Result<Vec<Submission>, StoreError> {
        let request = self
            .client
            .request(Method::GET, "/rest/v1/submissions")
            .await
            .query(&[("select", "*"), ("order", "vote_count.desc")]);

        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn insert_submission(&self, new: &NewSubmission) -> Result<Submission, StoreError> {
        let request = self
            .client
            .request(Method::POST, "/rest/v1/submissions")
            .await
            .header("Prefer", "return=representation")
            .json(new);

        let mut rows: Vec<Submission> = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        rows.pop()
            .ok_or_else(|| StoreError::Backend("insert returned no row".to_string()))
    }

    async fn voted_submission_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let request = self
            .client
            .request(Method::GET, "/rest/v1/votes")
            .await
            .query(&[
                ("select", "submission_id".to_string()),
                ("user_id", format!("eq.{user_id}")),
            ]);

        let rows: Vec<VotedSubmission> = self
            .send(request)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(rows.into_iter().map(|row| row.submission_id).collect())
    }

    async fn insert_vote(&self, key: VoteKey) -> Result<(), StoreError> {
        let request = self
            .client
            .request(Method::POST, "/rest/v1/votes")
            .await
            .header("Prefer", "return=minimal")
            .json(&key);

        self.send(request).await?;
        Ok(())
    }

    async fn delete_vote(&self, key: VoteKey) -> Result<(), StoreError> {
        let request = self
            .client
            .request(Method::DELETE, "/rest/v1/votes")
            .await
            .query(&[
                ("user_id", format!("eq.{}", key.user_id)),
                ("submission_id", format!("eq.{}", key.submission_id)),
            ]);

        self.send(request).await?;
        Ok(())
    }
}
