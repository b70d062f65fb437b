use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{AppJson, AppQuery, JSend};
use crate::views::shell::AuthModal;
use crate::views::{AuthMode, Tab};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ShellResponse {
    pub active_tab: Tab,
    pub auth_modal: AuthModal,
    pub refresh_counter: u64,
    pub loading: bool,
    pub user_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectTabRequest {
    pub tab: Tab,
}

#[derive(Debug, Deserialize)]
pub struct AuthModalParams {
    #[serde(default)]
    pub mode: Option<AuthMode>,
}

pub async fn get_shell(State(state): State<Arc<AppState>>) -> Json<JSend<ShellResponse>> {
    JSend::success(render(&state).await)
}

pub async fn select_tab(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SelectTabRequest>,
) -> Json<JSend<ShellResponse>> {
    state.shell.lock().await.select_tab(req.tab);
    JSend::success(render(&state).await)
}

pub async fn open_auth_modal(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<AuthModalParams>,
) -> Json<JSend<ShellResponse>> {
    state
        .shell
        .lock()
        .await
        .open_auth_modal(params.mode.unwrap_or_default());
    JSend::success(render(&state).await)
}

pub async fn close_auth_modal(State(state): State<Arc<AppState>>) -> Json<JSend<ShellResponse>> {
    state.shell.lock().await.close_auth_modal();
    JSend::success(render(&state).await)
}

async fn render(state: &AppState) -> ShellResponse {
    let session = state.session.state();
    let shell = state.shell.lock().await;
    ShellResponse {
        active_tab: shell.active_tab,
        auth_modal: shell.auth_modal.clone(),
        refresh_counter: shell.refresh_counter,
        loading: session.loading,
        user_email: session.user.and_then(|u| u.email),
    }
}
