use std::num::NonZeroU32;

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use super::{event_channel, AuthError, AuthEvent, AuthProvider, Session, User};
use crate::storage::{Database, UserRecord};

static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const PBKDF2_ITERATIONS: u32 = 100_000;
const HASH_LEN: usize = 32;
const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 32;
const MIN_PASSWORD_LEN: usize = 6;

/// Password accounts kept in the embedded database.
/// Sign-up confirms immediately and starts a session.
pub struct LocalAuth {
    db: Database,
    rng: SystemRandom,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

fn iterations() -> NonZeroU32 {
    NonZeroU32::MIN.saturating_add(PBKDF2_ITERATIONS - 1)
}

fn encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn decode(text: &str) -> Result<Vec<u8>, AuthError> {
    base64::engine::general_purpose::STANDARD
        .decode(text)
        .map_err(|e| AuthError::Backend(format!("Corrupt credential record: {e}")))
}

impl LocalAuth {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            rng: SystemRandom::new(),
            session: RwLock::new(None),
            events: event_channel(),
        }
    }

    fn random_bytes<const N: usize>(&self) -> Result<[u8; N], AuthError> {
        let mut buf = [0u8; N];
        self.rng
            .fill(&mut buf)
            .map_err(|_| AuthError::Backend("System randomness unavailable".to_string()))?;
        Ok(buf)
    }

    /// PBKDF2 runs on the blocking pool.
    async fn hash_password(salt: [u8; SALT_LEN], password: String) -> Result<[u8; HASH_LEN], AuthError> {
        tokio::task::spawn_blocking(move || {
            let mut hash = [0u8; HASH_LEN];
            pbkdf2::derive(PBKDF2_ALG, iterations(), &salt, password.as_bytes(), &mut hash);
            hash
        })
        .await
        .map_err(|e| AuthError::Backend(format!("Password hashing failed: {e}")))
    }

    async fn verify_password(salt: Vec<u8>, hash: Vec<u8>, password: String) -> Result<bool, AuthError> {
        tokio::task::spawn_blocking(move || {
            pbkdf2::verify(PBKDF2_ALG, iterations(), &salt, password.as_bytes(), &hash).is_ok()
        })
        .await
        .map_err(|e| AuthError::Backend(format!("Password check failed: {e}")))
    }

    async fn start_session(&self, user: User) -> Result<Session, AuthError> {
        let token = self.random_bytes::<TOKEN_LEN>()?;
        let session = Session {
            access_token: base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(token),
            user: user.clone(),
        };
        *self.session.write().await = Some(session.clone());
        let _ = self.events.send(AuthEvent::SignedIn(user));
        Ok(session)
    }
}

#[async_trait]
impl AuthProvider for LocalAuth {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        Ok(self.session.read().await.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let invalid = || AuthError::Rejected("Invalid login credentials".to_string());

        let record = self.db.get_user_by_email(email.trim())?.ok_or_else(invalid)?;
        let salt = decode(&record.salt)?;
        let hash = decode(&record.password_hash)?;

        if !Self::verify_password(salt, hash, password.to_string()).await? {
            return Err(invalid());
        }

        tracing::debug!(user_id = %record.id, "Signed in");
        self.start_session(User {
            id: record.id,
            email: Some(record.email),
        })
        .await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(AuthError::Rejected(
                "Unable to validate email address: invalid format".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Rejected(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters."
            )));
        }

        let salt = self.random_bytes::<SALT_LEN>()?;
        let record = UserRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: encode(&Self::hash_password(salt, password.to_string()).await?),
            salt: encode(&salt),
            created_at: Utc::now(),
        };

        if !self.db.insert_user(&record)? {
            return Err(AuthError::Rejected("User already registered".to_string()));
        }

        tracing::debug!(user_id = %record.id, "Registered local user");
        let session = self
            .start_session(User {
                id: record.id,
                email: Some(record.email),
            })
            .await?;
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let had_session = self.session.write().await.take().is_some();
        if had_session {
            let _ = self.events.send(AuthEvent::SignedOut);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
