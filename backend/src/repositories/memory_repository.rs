//! In-memory `CredentialStore`.
//!
//! Suitable for single-instance or ephemeral deployments and for tests. All
//! state lives behind one lock, so the uniqueness check and the insert in
//! `save` happen atomically.

use crate::database::models::{Credential, NewCredential};
use crate::errors::StoreError;
use crate::repositories::CredentialStore;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryCredentialStore {
    /// Keyed by username
    credentials: RwLock<HashMap<String, Credential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.credentials.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.credentials.read().await.contains_key(username))
    }

    async fn save(&self, credential: NewCredential) -> Result<Credential, StoreError> {
        let mut credentials = self.credentials.write().await;
        if credentials.contains_key(&credential.username) {
            return Err(StoreError::Duplicate(credential.username));
        }

        let saved = Credential {
            id: Uuid::now_v7().to_string(),
            username: credential.username,
            password_hash: credential.password_hash,
            created_at: Utc::now(),
        };
        credentials.insert(saved.username.clone(), saved.clone());

        Ok(saved)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self.credentials.read().await.get(username).cloned())
    }
}
