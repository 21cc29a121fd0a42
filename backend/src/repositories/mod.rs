//! Persistence layer for credentials.
//!
//! Services depend on the `CredentialStore` trait only. Implementations must make
//! `save` fail with `StoreError::Duplicate` when the username is already taken,
//! even when two saves for the same username race.

use crate::database::models::{Credential, NewCredential};
use crate::errors::StoreError;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

pub mod credential_repository;
pub mod memory_repository;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// `true` if a credential with this exact username exists.
    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError>;

    /// Persists a new credential, assigning its ID.
    async fn save(&self, credential: NewCredential) -> Result<Credential, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, StoreError>;
}

/// Bounds a store call by `deadline`; running out of time counts as unavailability.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Unavailable(format!(
            "store call exceeded {}ms",
            deadline.as_millis()
        ))),
    }
}
