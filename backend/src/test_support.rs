//! Shared fixtures for unit tests.

use crate::auth::service::SessionIssuer;
use crate::database::models::{Credential, NewCredential};
use crate::errors::StoreError;
use crate::repositories::CredentialStore;
use crate::services::credential_service::{CredentialPolicy, CredentialRegistry};
use crate::services::password_service::{BcryptHasher, PasswordHasher};
use crate::utils::jwt::{JwtUtils, KeyMaterial, SessionClaims, SigningAlgorithm, TokenSigner};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const TEST_SECRET: &[u8] = b"test-secret-test-secret-test-sec";

/// Lowest bcrypt cost, to keep tests fast.
pub fn test_hasher() -> Arc<dyn PasswordHasher> {
    Arc::new(BcryptHasher::new(4))
}

pub fn test_jwt() -> JwtUtils {
    JwtUtils::new(SigningAlgorithm::Hs256, KeyMaterial::Secret(TEST_SECRET.to_vec())).unwrap()
}

pub fn test_registry(store: Arc<dyn CredentialStore>) -> CredentialRegistry {
    CredentialRegistry::new(
        store,
        test_hasher(),
        CredentialPolicy::default(),
        Duration::from_secs(5),
    )
}

/// Issuer with a one hour TTL signing with `test_jwt()`.
pub async fn test_issuer(store: Arc<dyn CredentialStore>) -> SessionIssuer {
    SessionIssuer::new(
        store,
        test_hasher(),
        Arc::new(test_jwt()),
        chrono::Duration::hours(1),
        Duration::from_secs(5),
    )
    .await
    .unwrap()
}

/// Store whose backend cannot be reached.
pub struct UnavailableStore;

#[async_trait]
impl CredentialStore for UnavailableStore {
    async fn exists_by_username(&self, _username: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn save(&self, _credential: NewCredential) -> Result<Credential, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn find_by_username(&self, _username: &str) -> Result<Option<Credential>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Store that fails with an unexpected error.
pub struct BrokenStore;

#[async_trait]
impl CredentialStore for BrokenStore {
    async fn exists_by_username(&self, _username: &str) -> Result<bool, StoreError> {
        Err(StoreError::Failure(anyhow::anyhow!("disk image is malformed")))
    }

    async fn save(&self, _credential: NewCredential) -> Result<Credential, StoreError> {
        Err(StoreError::Failure(anyhow::anyhow!("disk image is malformed")))
    }

    async fn find_by_username(&self, _username: &str) -> Result<Option<Credential>, StoreError> {
        Err(StoreError::Failure(anyhow::anyhow!("disk image is malformed")))
    }
}

/// bcrypt hasher that counts verifications.
pub struct CountingHasher {
    inner: BcryptHasher,
    pub verifications: AtomicUsize,
}

impl CountingHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            inner: BcryptHasher::new(cost),
            verifications: AtomicUsize::new(0),
        }
    }
}

impl PasswordHasher for CountingHasher {
    fn hash(&self, password: &str) -> anyhow::Result<String> {
        self.inner.hash(password)
    }

    fn verify(&self, password: &str, hash: &str) -> anyhow::Result<bool> {
        self.verifications.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(password, hash)
    }
}

pub struct FailingSigner;

impl TokenSigner for FailingSigner {
    fn sign(&self, _claims: &SessionClaims) -> anyhow::Result<String> {
        Err(anyhow::anyhow!("signing key unavailable"))
    }
}
