//! Credential registration service.
//!
//! Handles sign-up: input and policy validation, the username uniqueness check,
//! password hashing and persistence of the new credential.

use crate::auth::models::AuthRequest;
use crate::config::Config;
use crate::database::models::{NewCredential, PublicIdentity};
use crate::errors::{ServiceError, ServiceResult, StoreError};
use crate::repositories::{CredentialStore, with_deadline};
use crate::services::password_service::{MAX_PASSWORD_BYTES, PasswordHasher, hash_password};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use validator::Validate;

/// Optional format rules applied at registration.
#[derive(Debug, Clone, Default)]
pub struct CredentialPolicy {
    /// Minimum password length in characters
    pub min_password_length: Option<usize>,
    /// Must match the whole username
    pub username_pattern: Option<Regex>,
}

impl CredentialPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_password_length: config.min_password_length,
            username_pattern: config.username_pattern.clone(),
        }
    }

    /// Business validation rules. The bcrypt byte limit applies even when no
    /// other rule is configured.
    pub fn check(&self, username: &str, password: &str) -> ServiceResult<()> {
        if let Some(pattern) = &self.username_pattern {
            if !pattern.is_match(username) {
                return Err(ServiceError::validation(
                    "username: Username contains characters that are not allowed",
                ));
            }
        }

        if password.len() > MAX_PASSWORD_BYTES {
            return Err(ServiceError::validation(format!(
                "password: Password must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        if let Some(min_length) = self.min_password_length {
            if password.chars().count() < min_length {
                return Err(ServiceError::validation(format!(
                    "password: Password must be at least {} characters",
                    min_length
                )));
            }
        }

        Ok(())
    }
}

/// Service layer for credential registration.
pub struct CredentialRegistry {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    policy: CredentialPolicy,
    /// Upper bound for every store call
    store_timeout: Duration,
}

impl CredentialRegistry {
    /// Creates a new CredentialRegistry instance.
    ///
    /// # Arguments
    /// * `store` - where credentials are persisted
    /// * `hasher` - one-way password hasher
    /// * `policy` - optional username/password format rules
    /// * `store_timeout` - deadline applied to each store call
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        policy: CredentialPolicy,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            hasher,
            policy,
            store_timeout,
        }
    }

    /// Registers a new client credential.
    ///
    /// # Arguments
    /// * `request` - desired username and password
    ///
    /// # Returns
    /// The public identity (`id`, `username`) of the new credential
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - Validation or policy failures
    /// - `DuplicateIdentifier` when the username is taken
    /// - `StorageUnavailable` when the store cannot be reached in time
    /// - `InternalError` for anything else
    ///
    /// Nothing is retried here: retrying a save that may have landed could
    /// create the credential twice.
    pub async fn register(&self, request: AuthRequest) -> ServiceResult<PublicIdentity> {
        request.validate()?;
        self.policy.check(&request.username, &request.password)?;

        let username = request.username;

        let exists = with_deadline(self.store_timeout, self.store.exists_by_username(&username))
            .await
            .map_err(|e| registration_error(&username, e))?;
        if exists {
            warn!("Sign-up rejected: username already exists");
            return Err(ServiceError::duplicate_identifier(username));
        }

        let password_hash = hash_password(self.hasher.clone(), request.password).await?;

        // The store's uniqueness guarantee covers a concurrent sign-up that
        // slipped in after the existence check.
        let credential = with_deadline(
            self.store_timeout,
            self.store.save(NewCredential {
                username: username.clone(),
                password_hash,
            }),
        )
        .await
        .map_err(|e| registration_error(&username, e))?;

        info!(client_id = %credential.id, "Registered new client");
        Ok(credential.into())
    }
}

fn registration_error(username: &str, error: StoreError) -> ServiceError {
    match error {
        StoreError::Duplicate(_) => {
            warn!("Sign-up rejected: username already exists");
            ServiceError::duplicate_identifier(username)
        }
        StoreError::Unavailable(message) => ServiceError::storage_unavailable(message),
        StoreError::Failure(source) => ServiceError::internal_error(format!("{:#}", source)),
    }
}
