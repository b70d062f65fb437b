//! Process-wide session context.
//!
//! Wraps the backend's auth provider and publishes the current user through a
//! `watch` channel. [`SessionContext::mount`] performs the initial session check
//! and keeps following login/logout events until the returned guard is dropped.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::auth::{AuthError, AuthEvent, AuthProvider, User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub user: Option<User>,
    /// True until the initial session check resolves.
    pub loading: bool,
}

pub struct SessionContext {
    auth: Arc<dyn AuthProvider>,
    state: watch::Sender<SessionState>,
}

/// Keeps the session listener alive. Dropping it unsubscribes.
pub struct SessionSubscription {
    handle: JoinHandle<()>,
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl SessionContext {
    pub fn new(auth: Arc<dyn AuthProvider>) -> Self {
        let (state, _) = watch::channel(SessionState {
            user: None,
            loading: true,
        });
        Self { auth, state }
    }

    /// Resolve the initial session, then track auth events.
    pub fn mount(self: &Arc<Self>) -> SessionSubscription {
        // Subscribe first so nothing emitted during the initial check is lost.
        let mut events = self.auth.subscribe();
        let context = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let user = match context.auth.get_session().await {
                Ok(session) => session.map(|s| s.user),
                Err(e) => {
                    tracing::warn!(error = %e, "Initial session check failed");
                    None
                }
            };
            context.state.send_modify(|state| {
                state.user = user;
                state.loading = false;
            });

            loop {
                match events.recv().await {
                    Ok(AuthEvent::SignedIn(user)) => context.set_user(Some(user)),
                    Ok(AuthEvent::SignedOut) => context.set_user(None),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Session listener lagged, resyncing");
                        let user = context
                            .auth
                            .get_session()
                            .await
                            .ok()
                            .flatten()
                            .map(|s| s.user);
                        context.set_user(user);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        SessionSubscription { handle }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Observe session changes.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let session = self.auth.sign_in(email, password).await?;
        self.set_user(Some(session.user));
        Ok(())
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        if let Some(session) = self.auth.sign_up(email, password).await? {
            self.set_user(Some(session.user));
        }
        Ok(())
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let result = self.auth.sign_out().await;
        self.set_user(None);
        result
    }

    fn set_user(&self, user: Option<User>) {
        self.state.send_if_modified(|state| {
            if state.user == user {
                return false;
            }
            state.user = user;
            true
        });
    }
}
