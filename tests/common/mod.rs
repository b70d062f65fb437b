//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use remix_competition::auth::{AuthProvider, LocalAuth, User};
use remix_competition::backend::Backend;
use remix_competition::object_store::{LocalStore, ObjectStore, ObjectStoreError};
use remix_competition::storage::models::{NewSubmission, Submission, VoteKey};
use remix_competition::storage::{Database, Store, StoreError};
use remix_competition::views::SelectedFile;
use uuid::Uuid;

/// Wraps the embedded store, counting writes and failing them on request.
pub struct FlakyStore {
    inner: Database,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
    /// Return listing rows in reverse of the store's order.
    pub reverse_listing: AtomicBool,
    pub writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: Database) -> Self {
        Self {
            inner,
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            reverse_listing: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    fn write(&self) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        Ok(())
    }

    fn read(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn list_submissions(&self) -> Result<Vec<Submission>, StoreError> {
        self.read()?;
        let mut rows = self.inner.list_submissions().await?;
        if self.reverse_listing.load(Ordering::SeqCst) {
            rows.reverse();
        }
        Ok(rows)
    }

    async fn insert_submission(&self, new: &NewSubmission) -> Result<Submission, StoreError> {
        self.write()?;
        self.inner.insert_submission(new).await
    }

    async fn voted_submission_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        self.read()?;
        self.inner.voted_submission_ids(user_id).await
    }

    async fn insert_vote(&self, key: VoteKey) -> Result<(), StoreError> {
        self.write()?;
        self.inner.insert_vote(key).await
    }

    async fn delete_vote(&self, key: VoteKey) -> Result<(), StoreError> {
        self.write()?;
        self.inner.delete_vote(key).await
    }
}

/// Wraps the local object store, counting uploads and failing them on request.
pub struct FlakyObjects {
    pub inner: LocalStore,
    pub fail_puts: AtomicBool,
    pub puts: AtomicUsize,
}

#[async_trait]
impl ObjectStore for FlakyObjects {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), ObjectStoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Backend("Bucket not found".to_string()));
        }
        self.inner.put(key, data, content_type).await
    }

    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError> {
        self.inner.get(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        self.inner.delete(key).await
    }

    fn public_url(&self, key: &str) -> String {
        self.inner.public_url(key)
    }
}

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub db: Database,
    pub store: Arc<FlakyStore>,
    pub objects: Arc<FlakyObjects>,
    pub auth: Arc<LocalAuth>,
    pub backend: Backend,
}

impl Harness {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("data")).unwrap();
        let local = LocalStore::new(dir.path().join("files"), "http://localhost:8080").unwrap();

        let store = Arc::new(FlakyStore::new(db.clone()));
        let objects = Arc::new(FlakyObjects {
            inner: local,
            fail_puts: AtomicBool::new(false),
            puts: AtomicUsize::new(0),
        });
        let auth = Arc::new(LocalAuth::new(db.clone()));

        let backend = Backend {
            auth: auth.clone(),
            store: store.clone(),
            objects: objects.clone(),
        };

        Self {
            dir,
            db,
            store,
            objects,
            auth,
            backend,
        }
    }

    /// Register an account and return its user.
    pub async fn user(&self, email: &str) -> User {
        self.auth
            .sign_up(email, "correct horse")
            .await
            .unwrap()
            .expect("local sign-up returns a session")
            .user
    }

    pub fn uploaded_files(&self) -> usize {
        walk(&self.dir.path().join("files"))
    }
}

fn walk(path: &std::path::Path) -> usize {
    std::fs::read_dir(path)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| {
                    let p = e.path();
                    if p.is_dir() {
                        walk(&p)
                    } else {
                        1
                    }
                })
                .sum()
        })
        .unwrap_or(0)
}

pub fn audio_file(name: &str, size: usize) -> SelectedFile {
    SelectedFile {
        name: name.to_string(),
        content_type: "audio/mpeg".to_string(),
        data: Bytes::from(vec![0u8; size]),
    }
}
