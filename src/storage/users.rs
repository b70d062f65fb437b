use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::db::{Database, DatabaseError};
use super::tables::*;

/// A local account. Only the embedded auth provider reads these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    /// base64 PBKDF2-HMAC-SHA256 digest
    pub password_hash: String,
    /// base64 salt
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

impl Database {
    /// Insert a user unless the email is taken. Returns false on conflict.
    pub fn insert_user(&self, user: &UserRecord) -> Result<bool, DatabaseError> {
        let email = user.email.to_lowercase();
        let write_txn = self.begin_write()?;
        let inserted = {
            let mut table = write_txn.open_table(USERS)?;
            if table.get(email.as_str())?.is_some() {
                false
            } else {
                let data = rmp_serde::to_vec_named(user)?;
                table.insert(email.as_str(), data.as_slice())?;
                true
            }
        };
        write_txn.commit()?;
        Ok(inserted)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        match table.get(email.to_lowercase().as_str())? {
            Some(data) => Ok(Some(rmp_serde::from_slice(data.value())?)),
            None => Ok(None),
        }
    }
}
