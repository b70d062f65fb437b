use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, StatusCode};

use super::{ObjectStore, ObjectStoreError};
use crate::supabase::{error_message, SupabaseClient};

/// Supabase Storage bucket backend.
pub struct SupabaseStorage {
    bucket: String,
    client: Arc<SupabaseClient>,
}

impl SupabaseStorage {
    pub fn new(client: Arc<SupabaseClient>, bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            client,
        }
    }

    fn object_path(&self, key: &str) -> String {
        format!("/storage/v1/object/{}/{}", self.bucket, key)
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), ObjectStoreError> {
        let resp = self
            .client
            .request(Method::POST, &self.object_path(key))
            .await
            .header("Content-Type", content_type)
            .header("Cache-Control", "max-age=3600")
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ObjectStoreError::Backend(error_message(resp).await));
        }

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        let resp = self
            .client
            .request(Method::GET, &self.object_path(key))
            .await
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ObjectStoreError::NotFound(key.to_string()));
        }

        if !resp.status().is_success() {
            return Err(ObjectStoreError::Backend(error_message(resp).await));
        }

        resp.bytes()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let resp = self
            .client
            .request(Method::DELETE, &self.object_path(key))
            .await
            .send()
            .await
            .map_err(|e| ObjectStoreError::Backend(e.to_string()))?;

        // 404 is fine -- object already gone
        if !resp.status().is_success() && resp.status() != StatusCode::NOT_FOUND {
            return Err(ObjectStoreError::Backend(error_message(resp).await));
        }

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        self.client.endpoint(&format!(
            "/storage/v1/object/public/{}/{}",
            self.bucket, key
        ))
    }
}
