use std::collections::HashSet;

use reqwest::Url;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::User;
use crate::backend::Backend;
use crate::storage::models::{sort_by_votes, Submission, VoteKey};

pub const EMPTY_PLACEHOLDER: &str = "No submissions yet. Be the first to submit!";
const TWEET_INTENT_URL: &str = "https://twitter.com/intent/tweet";

/// Result of a vote toggle, as seen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOutcome {
    /// No user: the caller must prompt for sign-in. Nothing was sent.
    AuthRequired,
    Voted,
    Unvoted,
    /// The mutation failed; local state is untouched.
    Unchanged,
}

/// What the front-end should do to share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShareAction {
    /// Hand off to the platform share sheet.
    Native {
        title: String,
        text: String,
        url: String,
    },
    /// Open a link in a new tab.
    OpenUrl { url: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingEntry {
    #[serde(flatten)]
    pub submission: Submission,
    pub has_voted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingSnapshot {
    pub loading: bool,
    pub entries: Vec<ListingEntry>,
    pub placeholder: Option<&'static str>,
}

/// The "listen & vote" tab.
pub struct ListingView {
    backend: Backend,
    submissions: Vec<Submission>,
    user_votes: HashSet<Uuid>,
    loading: bool,
    /// Refresh counter value of the last load, `None` before the first one.
    loaded_refresh: Option<u64>,
    /// Whose votes `user_votes` reflects, `None` before the first sync.
    votes_owner: Option<Option<Uuid>>,
}

impl ListingView {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            submissions: Vec::new(),
            user_votes: HashSet::new(),
            loading: true,
            loaded_refresh: None,
            votes_owner: None,
        }
    }

    /// Reload submissions when first shown or when the refresh counter moved.
    pub async fn refresh(&mut self, refresh_counter: u64) {
        if self.loaded_refresh != Some(refresh_counter) {
            self.loaded_refresh = Some(refresh_counter);
            self.load_submissions().await;
        }
    }

    /// Reload the vote set when the signed-in user changed.
    pub async fn sync_user(&mut self, user: Option<&User>) {
        let owner = user.map(|u| u.id);
        if self.votes_owner != Some(owner) {
            self.load_user_votes(user).await;
        }
    }

    /// Replace the listing with all submissions, most votes first.
    /// A failed query keeps the previous rows.
    pub async fn load_submissions(&mut self) {
        self.loading = true;
        match self.backend.store.list_submissions().await {
            Ok(mut rows) => {
                sort_by_votes(&mut rows);
                self.submissions = rows;
            }
            Err(e) => tracing::warn!(error = %e, "Failed to load submissions"),
        }
        self.loading = false;
    }

    pub async fn load_user_votes(&mut self, user: Option<&User>) {
        let Some(user) = user else {
            self.user_votes.clear();
            self.votes_owner = Some(None);
            return;
        };

        match self.backend.store.voted_submission_ids(user.id).await {
            Ok(ids) => {
                self.user_votes = ids.into_iter().collect();
                self.votes_owner = Some(Some(user.id));
            }
            Err(e) => {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to load votes");
                // Never act on another user's votes; retry on the next sync
                if self.votes_owner != Some(Some(user.id)) {
                    self.user_votes.clear();
                    self.votes_owner = None;
                }
            }
        }
    }

    /// Vote for a submission, or withdraw the vote if one exists.
    pub async fn toggle_vote(&mut self, user: Option<&User>, submission_id: Uuid) -> VoteOutcome {
        let Some(user) = user else {
            return VoteOutcome::AuthRequired;
        };

        let key = VoteKey::new(user.id, submission_id);
        let has_voted = self.user_votes.contains(&submission_id);

        let result = if has_voted {
            self.backend.store.delete_vote(key).await
        } else {
            self.backend.store.insert_vote(key).await
        };

        if let Err(e) = result {
            tracing::warn!(
                user_id = %user.id,
                submission_id = %submission_id,
                error = %e,
                "Vote toggle failed"
            );
            return VoteOutcome::Unchanged;
        }

        let outcome = if has_voted {
            self.user_votes.remove(&submission_id);
            VoteOutcome::Unvoted
        } else {
            self.user_votes.insert(submission_id);
            VoteOutcome::Voted
        };
        tracing::debug!(submission_id = %submission_id, ?outcome, "Toggled vote");

        self.load_submissions().await;
        outcome
    }

    pub fn share(submission: &Submission, page_url: &str, native_available: bool) -> ShareAction {
        let text = format!(
            "Check out \"{}\" by {} in the remix competition!",
            submission.title, submission.artist_name
        );

        if native_available {
            return ShareAction::Native {
                title: submission.title.clone(),
                text,
                url: page_url.to_string(),
            };
        }

        let url = Url::parse_with_params(TWEET_INTENT_URL, &[("text", text.as_str()), ("url", page_url)])
            .map(String::from)
            .unwrap_or_else(|_| TWEET_INTENT_URL.to_string());
        ShareAction::OpenUrl { url }
    }

    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    pub fn find(&self, submission_id: Uuid) -> Option<&Submission> {
        self.submissions.iter().find(|s| s.id == submission_id)
    }

    pub fn user_votes(&self) -> &HashSet<Uuid> {
        &self.user_votes
    }

    pub fn has_voted(&self, submission_id: Uuid) -> bool {
        self.user_votes.contains(&submission_id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn snapshot(&self) -> ListingSnapshot {
        if self.loading {
            return ListingSnapshot {
                loading: true,
                entries: Vec::new(),
                placeholder: None,
            };
        }

        let entries: Vec<ListingEntry> = self
            .submissions
            .iter()
            .map(|submission| ListingEntry {
                submission: submission.clone(),
                has_voted: self.user_votes.contains(&submission.id),
            })
            .collect();

        ListingSnapshot {
            loading: false,
            placeholder: entries.is_empty().then_some(EMPTY_PLACEHOLDER),
            entries,
        }
    }
}
