mod gotrue;
mod local;

pub use gotrue::GoTrueAuth;
pub use local::LocalAuth;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::storage::DatabaseError;

/// Buffered session-change events per provider
const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider refused the request (bad credentials, taken email, weak password).
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Backend(String),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// The signed-in identity. Only `id` and `email` are ever read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: User,
}

/// Login/logout notifications pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(User),
    SignedOut,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The current session, if one exists and is still valid.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;
    /// `None` when the account needs confirming before it can sign in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

fn event_channel() -> broadcast::Sender<AuthEvent> {
    broadcast::channel(EVENT_CAPACITY).0
}
