//! remix-competition - sign in, upload audio remixes, listen and vote
//!
//! This crate is a thin client over a hosted backend-as-a-service with:
//! - A backend facade over auth, relational tables and an audio bucket
//!   (Supabase over HTTP, or an embedded redb + filesystem equivalent)
//! - A session context following login/logout events
//! - View state for the listing, the submission form and the tab shell
//! - A JSON API exposing that view state to a front-end

pub mod api;
pub mod auth;
pub mod backend;
pub mod config;
pub mod object_store;
pub mod session;
pub mod storage;
pub mod supabase;
#[cfg(test)]
pub mod testutil;
pub mod views;

use std::sync::Arc;

use tokio::sync::Mutex;

use backend::Backend;
use config::Config;
use session::SessionContext;
use views::{ListingView, Shell, SubmissionForm};

/// Shared application state: one session and one instance of each view
pub struct AppState {
    pub config: Config,
    pub backend: Backend,
    pub session: Arc<SessionContext>,
    pub shell: Mutex<Shell>,
    pub listing: Mutex<ListingView>,
    pub form: Mutex<SubmissionForm>,
}

impl AppState {
    pub fn new(config: Config, backend: Backend) -> Self {
        Self {
            session: Arc::new(SessionContext::new(Arc::clone(&backend.auth))),
            shell: Mutex::new(Shell::default()),
            listing: Mutex::new(ListingView::new(backend.clone())),
            form: Mutex::new(SubmissionForm::new(backend.clone())),
            config,
            backend,
        }
    }
}
