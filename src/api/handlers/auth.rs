use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, JSend};
use crate::session::SessionState;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<JSend<SessionState>> {
    JSend::success(state.session.state())
}

pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CredentialsRequest>,
) -> Result<Json<JSend<SessionState>>, ApiError> {
    let result = state.session.sign_in(&req.email, &req.password).await;
    finish_auth(&state, result).await
}

pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CredentialsRequest>,
) -> Result<Json<JSend<SessionState>>, ApiError> {
    let result = state.session.sign_up(&req.email, &req.password).await;
    // Sign-up refusals are about the submitted input, not missing credentials
    finish_auth(&state, result).await.map_err(|e| match e {
        ApiError::Fail(StatusCode::UNAUTHORIZED, message) => ApiError::bad_request(message),
        other => other,
    })
}

pub async fn sign_out(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<SessionState>>, ApiError> {
    state.session.sign_out().await?;
    Ok(JSend::success(state.session.state()))
}

/// Close the modal on success; keep it open with the message on failure.
async fn finish_auth(
    state: &AppState,
    result: Result<(), crate::auth::AuthError>,
) -> Result<Json<JSend<SessionState>>, ApiError> {
    let mut shell = state.shell.lock().await;
    match result {
        Ok(()) => {
            shell.close_auth_modal();
            Ok(JSend::success(state.session.state()))
        }
        Err(e) => {
            tracing::debug!(error = %e, "Authentication failed");
            shell.auth_failed(e.to_string());
            Err(e.into())
        }
    }
}
