//! The backend facade: one handle to auth, tables and the audio bucket.

use std::sync::Arc;

use crate::auth::{AuthProvider, GoTrueAuth, LocalAuth};
use crate::config::{BackendKind, Config};
use crate::object_store::{LocalStore, ObjectStore, SupabaseStorage};
use crate::storage::{Database, PostgrestStore, Store};
use crate::supabase::SupabaseClient;

#[derive(Clone)]
pub struct Backend {
    pub auth: Arc<dyn AuthProvider>,
    pub store: Arc<dyn Store>,
    pub objects: Arc<dyn ObjectStore>,
}

impl Backend {
    /// Build the configured backend. Called once at startup.
    pub fn connect(config: &Config) -> Result<Self, anyhow::Error> {
        match config.backend.kind {
            BackendKind::Supabase => {
                let supabase = config
                    .backend
                    .supabase
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("Missing Supabase environment variables"))?;
                let client = Arc::new(SupabaseClient::new(supabase)?);
                tracing::info!(url = %client.url(), bucket = %config.backend.bucket, "Using Supabase backend");

                Ok(Self {
                    auth: Arc::new(GoTrueAuth::new(Arc::clone(&client))),
                    store: Arc::new(PostgrestStore::new(Arc::clone(&client))),
                    objects: Arc::new(SupabaseStorage::new(client, &config.backend.bucket)),
                })
            }
            BackendKind::Local => {
                let db = Database::open(&config.backend.data_dir)?;
                let objects = LocalStore::new(
                    &config.backend.local_storage_path,
                    &config.server.public_url,
                )?;
                tracing::info!(
                    data_dir = %config.backend.data_dir,
                    storage = %config.backend.local_storage_path,
                    "Using local backend"
                );

                Ok(Self::local(db, objects))
            }
        }
    }

    /// Embedded backend over an already opened database and object directory.
    pub fn local(db: Database, objects: LocalStore) -> Self {
        Self {
            auth: Arc::new(LocalAuth::new(db.clone())),
            store: Arc::new(db),
            objects: Arc::new(objects),
        }
    }
}
