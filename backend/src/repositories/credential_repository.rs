//! Database repository for credential operations.
//!
//! Provides the SQLite-backed `CredentialStore`.

use crate::database::models::{Credential, NewCredential};
use crate::errors::StoreError;
use crate::repositories::CredentialStore;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Repository for credential database operations.
///
/// Uniqueness of usernames is enforced by the `UNIQUE` constraint on
/// `credentials.username`, so the check-then-insert in registration stays
/// atomic across connections and processes.
#[derive(Clone)]
pub struct SqliteCredentialStore {
    /// Shared SQLite connection pool
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    /// Creates a new SqliteCredentialStore instance.
    ///
    /// # Arguments
    /// * `pool` - SQLite connection pool (cheap to clone)
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    /// Checks if a username already exists.
    ///
    /// # Arguments
    /// * `username` - Username to check
    ///
    /// # Returns
    /// `true` if a credential with this username exists
    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credentials WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Creates a new credential in the database.
    ///
    /// # Arguments
    /// * `credential` - username and password hash to store
    ///
    /// # Returns
    /// The newly created Credential with its assigned ID
    async fn save(&self, credential: NewCredential) -> Result<Credential, StoreError> {
        let id = Uuid::now_v7().to_string();

        let result = sqlx::query_as::<_, Credential>(
            r#"
            INSERT INTO credentials (id, username, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(&id)
        .bind(&credential.username)
        .bind(&credential.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(saved) => Ok(saved),
            Err(sqlx::Error::Database(db_error)) if db_error.is_unique_violation() => {
                Err(StoreError::Duplicate(credential.username))
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Retrieves a credential by its username.
    ///
    /// # Arguments
    /// * `username` - Username to search for (exact, case-sensitive)
    ///
    /// # Returns
    /// `Some(Credential)` if found, `None` otherwise
    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        let credential = sqlx::query_as::<_, Credential>(
            r#"
            SELECT id, username, password_hash, created_at
            FROM credentials WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(credential)
    }
}
