use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::parse_id;
use crate::api::response::{ApiError, AppQuery, JSend};
use crate::views::listing::ListingSnapshot;
use crate::views::{ListingView, ShareAction, VoteOutcome};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub submission_id: Uuid,
    pub outcome: VoteOutcome,
    pub has_voted: bool,
    pub vote_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ShareParams {
    /// Whether the caller can open a native share sheet
    #[serde(default)]
    pub native: bool,
}

pub async fn list_submissions(
    State(state): State<Arc<AppState>>,
) -> Json<JSend<ListingSnapshot>> {
    let refresh_counter = state.shell.lock().await.refresh_counter;
    let user = state.session.user();

    let mut listing = state.listing.lock().await;
    listing.refresh(refresh_counter).await;
    listing.sync_user(user.as_ref()).await;

    JSend::success(listing.snapshot())
}

pub async fn toggle_vote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JSend<VoteResponse>>, ApiError> {
    let submission_id = parse_id(&id)?;
    let user = state.session.user();

    let response = {
        let mut listing = state.listing.lock().await;
        listing.sync_user(user.as_ref()).await;
        let outcome = listing.toggle_vote(user.as_ref(), submission_id).await;

        VoteResponse {
            submission_id,
            outcome,
            has_voted: listing.has_voted(submission_id),
            vote_count: listing.find(submission_id).map(|s| s.vote_count),
        }
    };

    if response.outcome == VoteOutcome::AuthRequired {
        state.shell.lock().await.request_auth();
        return Err(ApiError::unauthorized("Sign in to vote"));
    }

    Ok(JSend::success(response))
}

pub async fn share_submission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppQuery(params): AppQuery<ShareParams>,
) -> Result<Json<JSend<ShareAction>>, ApiError> {
    let submission_id = parse_id(&id)?;

    let mut listing = state.listing.lock().await;
    if listing.find(submission_id).is_none() {
        listing.load_submissions().await;
    }
    let submission = listing
        .find(submission_id)
        .ok_or_else(|| ApiError::not_found("Submission not found"))?;

    Ok(JSend::success(ListingView::share(
        submission,
        &state.config.site_url,
        params.native,
    )))
}
