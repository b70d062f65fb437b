use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::User;
use crate::backend::Backend;
use crate::object_store::ObjectStoreError;
use crate::storage::models::{NewSubmission, Submission};
use crate::storage::StoreError;

/// Largest accepted audio file: 50 MiB
pub const MAX_AUDIO_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// A file picked for upload, held in memory until submitted.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl SelectedFile {
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Text after the last `.`; the whole name when there is none.
    pub fn extension(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FileRejection {
    #[error("Please select an audio file")]
    NotAudio,
    #[error("File size must be less than 50MB")]
    TooLarge,
}

/// Accept only `audio/*` content no larger than [`MAX_AUDIO_FILE_SIZE`].
pub fn validate_file(content_type: &str, size: u64) -> Result<(), FileRejection> {
    if !content_type.starts_with("audio/") {
        return Err(FileRejection::NotAudio);
    }
    if size > MAX_AUDIO_FILE_SIZE {
        return Err(FileRejection::TooLarge);
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Sign in to submit your remix")]
    AuthRequired,
    #[error("Please select an audio file")]
    MissingFile,
    #[error("{0}")]
    MissingField(&'static str),
    #[error("A submission is already in progress")]
    InFlight,
    #[error("{0}")]
    Upload(#[from] ObjectStoreError),
    #[error("{0}")]
    Insert(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormPhase {
    #[default]
    Idle,
    Rejected,
    Accepted,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectedFileInfo {
    pub name: String,
    pub content_type: String,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormSnapshot {
    pub title: String,
    pub artist_name: String,
    pub file: Option<SelectedFileInfo>,
    pub error: Option<String>,
    pub phase: FormPhase,
    pub uploading: bool,
    pub can_submit: bool,
}

/// The "submit entry" tab.
pub struct SubmissionForm {
    backend: Backend,
    title: String,
    artist_name: String,
    file: Option<SelectedFile>,
    error: Option<String>,
    phase: FormPhase,
}

/// Everything one submission attempt needs, detached from the form so the
/// upload can run without holding the form.
pub struct SubmitJob {
    backend: Backend,
    user_id: Uuid,
    title: String,
    artist_name: String,
    file: SelectedFile,
    timestamp_ms: i64,
}

impl SubmitJob {
    /// `{user_id}/{unix_millis}.{ext}`: unique per user and per upload.
    pub fn storage_path(&self) -> String {
        format!(
            "{}/{}.{}",
            self.user_id,
            self.timestamp_ms,
            self.file.extension()
        )
    }

    /// Upload, resolve the public URL, insert the row. Stops at the first failure.
    pub async fn run(self) -> Result<Submission, SubmitError> {
        let path = self.storage_path();
        let objects = &self.backend.objects;

        objects
            .put(&path, self.file.data.clone(), &self.file.content_type)
            .await?;

        let new = NewSubmission {
            user_id: self.user_id,
            title: self.title,
            artist_name: self.artist_name,
            audio_url: objects.public_url(&path),
            file_path: path.clone(),
        };

        match self.backend.store.insert_submission(&new).await {
            Ok(submission) => {
                tracing::debug!(submission_id = %submission.id, path = %path, "Created submission");
                Ok(submission)
            }
            Err(e) => {
                // Best-effort cleanup of the uploaded object
                if let Err(cleanup) = objects.delete(&path).await {
                    tracing::warn!(path = %path, error = %cleanup, "Failed to remove orphaned upload");
                }
                Err(e.into())
            }
        }
    }
}

impl SubmissionForm {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            title: String::new(),
            artist_name: String::new(),
            file: None,
            error: None,
            phase: FormPhase::Idle,
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_artist_name(&mut self, artist_name: impl Into<String>) {
        self.artist_name = artist_name.into();
    }

    /// Validate and keep a file. A rejected file is dropped and the error shown;
    /// an earlier accepted file stays selected.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), FileRejection> {
        match validate_file(&file.content_type, file.size()) {
            Ok(()) => {
                self.file = Some(file);
                self.error = None;
                self.phase = FormPhase::Accepted;
                Ok(())
            }
            Err(rejection) => {
                self.error = Some(rejection.to_string());
                self.phase = if self.file.is_some() {
                    FormPhase::Accepted
                } else {
                    FormPhase::Rejected
                };
                Err(rejection)
            }
        }
    }

    /// Give up on an attempt whose request went away before it finished.
    pub fn abandon(&mut self) {
        if self.phase == FormPhase::Submitting {
            self.error = Some("Submission was interrupted, please try again".to_string());
            self.phase = FormPhase::Failed;
        }
    }

    /// Check preconditions and move to `Submitting`.
    pub fn begin_submit(&mut self, user: Option<&User>) -> Result<SubmitJob, SubmitError> {
        if self.phase == FormPhase::Submitting {
            return Err(SubmitError::InFlight);
        }
        let Some(user) = user else {
            return Err(SubmitError::AuthRequired);
        };
        let Some(file) = self.file.clone() else {
            self.error = Some(SubmitError::MissingFile.to_string());
            return Err(SubmitError::MissingFile);
        };

        let missing = if self.title.trim().is_empty() {
            Some("Track title is required")
        } else if self.artist_name.trim().is_empty() {
            Some("Artist name is required")
        } else {
            None
        };
        if let Some(message) = missing {
            self.error = Some(message.to_string());
            return Err(SubmitError::MissingField(message));
        }

        self.error = None;
        self.phase = FormPhase::Submitting;

        Ok(SubmitJob {
            backend: self.backend.clone(),
            user_id: user.id,
            title: self.title.clone(),
            artist_name: self.artist_name.clone(),
            file,
            timestamp_ms: Utc::now().timestamp_millis(),
        })
    }

    /// Apply a finished attempt. On success the form is cleared and `on_success` runs once.
    pub fn finish<F>(
        &mut self,
        result: Result<Submission, SubmitError>,
        on_success: F,
    ) -> Result<Submission, SubmitError>
    where
        F: FnOnce(&Submission),
    {
        match result {
            Ok(submission) => {
                self.title.clear();
                self.artist_name.clear();
                self.file = None;
                self.error = None;
                self.phase = FormPhase::Succeeded;
                on_success(&submission);
                Ok(submission)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                self.phase = FormPhase::Failed;
                Err(e)
            }
        }
    }

    /// Whole attempt in one call: begin, run, finish.
    pub async fn submit<F>(&mut self, user: Option<&User>, on_success: F) -> Result<Submission, SubmitError>
    where
        F: FnOnce(&Submission),
    {
        let job = self.begin_submit(user)?;
        let result = job.run().await;
        self.finish(result, on_success)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist_name(&self) -> &str {
        &self.artist_name
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    /// The submit control is enabled only with a file and nothing in flight.
    pub fn can_submit(&self) -> bool {
        self.file.is_some() && self.phase != FormPhase::Submitting
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            title: self.title.clone(),
            artist_name: self.artist_name.clone(),
            file: self.file.as_ref().map(|f| SelectedFileInfo {
                name: f.name.clone(),
                content_type: f.content_type.clone(),
                size: f.size(),
            }),
            error: self.error.clone(),
            phase: self.phase,
            uploading: self.phase == FormPhase::Submitting,
            can_submit: self.can_submit(),
        }
    }
}
