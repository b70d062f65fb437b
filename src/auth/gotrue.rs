use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};

use super::{event_channel, AuthError, AuthEvent, AuthProvider, Session, User};
use crate::supabase::{error_message, SupabaseClient};

/// Supabase Auth (GoTrue) password authentication.
pub struct GoTrueAuth {
    client: Arc<SupabaseClient>,
    user: RwLock<Option<User>>,
    events: broadcast::Sender<AuthEvent>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: User,
}

impl GoTrueAuth {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self {
            client,
            user: RwLock::new(None),
            events: event_channel(),
        }
    }

    async fn post_credentials(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> Result<serde_json::Value, AuthError> {
        let resp = self
            .client
            .request(Method::POST, path)
            .await
            .json(&Credentials { email, password })
            .send()
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        if resp.status().is_client_error() {
            return Err(AuthError::Rejected(error_message(resp).await));
        }
        if !resp.status().is_success() {
            return Err(AuthError::Backend(error_message(resp).await));
        }

        resp.json()
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))
    }

    async fn establish(&self, token: TokenResponse) -> Session {
        self.client
            .set_access_token(Some(token.access_token.clone()))
            .await;
        *self.user.write().await = Some(token.user.clone());
        let _ = self.events.send(AuthEvent::SignedIn(token.user.clone()));

        Session {
            access_token: token.access_token,
            user: token.user,
        }
    }

    async fn clear(&self) {
        self.client.set_access_token(None).await;
        let had_user = self.user.write().await.take().is_some();
        if had_user {
            let _ = self.events.send(AuthEvent::SignedOut);
        }
    }
}

#[async_trait]
impl AuthProvider for GoTrueAuth {
    async fn get_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(access_token) = self.client.access_token().await else {
            return Ok(None);
        };

        let resp = self
            .client
            .request(Method::GET, "/auth/v1/user")
            .await
            .send()
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        if matches!(resp.status(), StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            self.clear().await;
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(AuthError::Backend(error_message(resp).await));
        }

        let user: User = resp
            .json()
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;
        *self.user.write().await = Some(user.clone());

        Ok(Some(Session { access_token, user }))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let body = self
            .post_credentials("/auth/v1/token?grant_type=password", email, password)
            .await?;
        let token: TokenResponse =
            serde_json::from_value(body).map_err(|e| AuthError::Backend(e.to_string()))?;

        tracing::debug!(user_id = %token.user.id, "Signed in");
        Ok(self.establish(token).await)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError> {
        let body = self
            .post_credentials("/auth/v1/signup", email, password)
            .await?;

        // Without auto-confirm the response is a bare user and no session exists yet.
        if body.get("access_token").is_none() {
            tracing::debug!("Sign-up pending confirmation");
            return Ok(None);
        }

        let token: TokenResponse =
            serde_json::from_value(body).map_err(|e| AuthError::Backend(e.to_string()))?;
        Ok(Some(self.establish(token).await))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if self.client.access_token().await.is_none() {
            return Ok(());
        }

        let result = self
            .client
            .request(Method::POST, "/auth/v1/logout")
            .await
            .send()
            .await;

        // The local session is dropped whatever the server says.
        self.clear().await;

        let resp = result.map_err(|e| AuthError::Backend(e.to_string()))?;
        if !resp.status().is_success() && resp.status() != StatusCode::UNAUTHORIZED {
            return Err(AuthError::Backend(error_message(resp).await));
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
