mod local;
mod supabase;

pub use local::LocalStore;
pub use supabase::SupabaseStorage;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("The resource already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid object key: {0}")]
    InvalidKey(String),
    #[error("{0}")]
    Backend(String),
}

/// Abstraction over the audio bucket.
/// Keys are `{user_id}/{millis}.{ext}`; uploads never overwrite.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), ObjectStoreError>;
    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError>;
    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
    /// Publicly reachable URL for a key. Computed locally, no I/O.
    fn public_url(&self, key: &str) -> String;
}
