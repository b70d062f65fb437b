use axum::extract::{Multipart, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::response::{ApiError, AppJson, JSend};
use crate::storage::models::Submission;
use crate::views::submit_form::FormSnapshot;
use crate::views::{SelectedFile, SubmitError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateFormRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist_name: Option<String>,
}

pub async fn get_form(State(state): State<Arc<AppState>>) -> Json<JSend<FormSnapshot>> {
    JSend::success(state.form.lock().await.snapshot())
}

pub async fn update_form(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<UpdateFormRequest>,
) -> Json<JSend<FormSnapshot>> {
    let mut form = state.form.lock().await;
    if let Some(title) = req.title {
        form.set_title(title);
    }
    if let Some(artist_name) = req.artist_name {
        form.set_artist_name(artist_name);
    }
    JSend::success(form.snapshot())
}

/// Route: POST /api/form/file (multipart, one `file` part)
pub async fn select_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<JSend<FormSnapshot>>, ApiError> {
    let mut selected: Option<SelectedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or("upload").to_string();
        // Trust the part's Content-Type, else guess from the file name
        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .filter(|ct| ct != "application/octet-stream")
            .or_else(|| mime_guess::from_path(&name).first().map(|m| m.to_string()))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::payload_too_large(format!("Failed to read file: {e}")))?;

        selected = Some(SelectedFile {
            name,
            content_type,
            data,
        });
        break;
    }

    let file = selected.ok_or_else(|| ApiError::bad_request("file field is required"))?;

    let mut form = state.form.lock().await;
    form.select_file(file)?;
    Ok(JSend::success(form.snapshot()))
}

/// Releases the form if the request is dropped while the job is running.
struct InFlightGuard {
    state: Option<Arc<AppState>>,
}

impl InFlightGuard {
    fn new(state: Arc<AppState>) -> Self {
        Self { state: Some(state) }
    }

    fn disarm(mut self) {
        self.state = None;
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        tracing::warn!("Submission request dropped before completion");
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                state.form.lock().await.abandon();
            });
        }
    }
}

pub async fn submit_form(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<Submission>>, ApiError> {
    let user = state.session.user();

    // The form lock is released while the upload runs.
    let begun = state.form.lock().await.begin_submit(user.as_ref());
    let job = match begun {
        Ok(job) => job,
        Err(e) => {
            if matches!(e, SubmitError::AuthRequired) {
                state.shell.lock().await.request_auth();
            }
            return Err(e.into());
        }
    };

    let guard = InFlightGuard::new(Arc::clone(&state));
    let result = job.run().await;

    let mut succeeded = false;
    let outcome = state
        .form
        .lock()
        .await
        .finish(result, |_| succeeded = true);
    guard.disarm();

    if succeeded {
        state.shell.lock().await.submission_succeeded();
    }

    match outcome {
        Ok(submission) => {
            tracing::info!(submission_id = %submission.id, title = %submission.title, "Submission published");
            Ok(JSend::success(submission))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Submission failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;

    use super::*;
    use crate::auth::LocalAuth;
    use crate::backend::Backend;
    use crate::object_store::{LocalStore, ObjectStore, ObjectStoreError};
    use crate::storage::Database;
    use crate::testutil::test_state;
    use crate::views::FormPhase;

    /// Uploads that never complete.
    struct StalledObjects(LocalStore);

    #[async_trait]
    impl ObjectStore for StalledObjects {
        async fn put(&self, _key: &str, _data: Bytes, _content_type: &str) -> Result<(), ObjectStoreError> {
            std::future::pending().await
        }

        async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
            self.0.get(key).await
        }

        async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
            self.0.delete(key).await
        }

        fn public_url(&self, key: &str) -> String {
            self.0.public_url(key)
        }
    }

    #[tokio::test]
    async fn dropped_request_releases_the_form() {
        let dir = tempfile::tempdir().unwrap();
        let base = test_state(&dir);
        let db = Database::open(dir.path().join("stalled")).unwrap();
        let backend = Backend {
            auth: Arc::new(LocalAuth::new(db.clone())),
            store: Arc::new(db),
            objects: Arc::new(StalledObjects(
                LocalStore::new(dir.path().join("stalled-files"), "http://localhost").unwrap(),
            )),
        };
        let state = Arc::new(AppState::new(base.config.clone(), backend));

        state.session.sign_up("a@example.com", "hunter22").await.unwrap();
        {
            let mut form = state.form.lock().await;
            form.set_title("Song");
            form.set_artist_name("Artist");
            form.select_file(SelectedFile {
                name: "song.mp3".to_string(),
                content_type: "audio/mpeg".to_string(),
                data: Bytes::from_static(b"ID3"),
            })
            .unwrap();
        }

        let cancelled =
            tokio::time::timeout(Duration::from_millis(50), submit_form(State(Arc::clone(&state)))).await;
        assert!(cancelled.is_err());

        // Let the release task run
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut form = state.form.lock().await;
        assert_eq!(form.phase(), FormPhase::Failed);
        assert!(form.can_submit());
        assert_eq!(form.title(), "Song");
        let user = state.session.user();
        assert!(form.begin_submit(user.as_ref()).is_ok());
    }
}
