//! One-way password hashing.
//!
//! Hashes are bcrypt strings (`$2b$<cost>$<salt><digest>`), so the salt and cost
//! needed for verification travel with the hash itself.

use crate::errors::{ServiceError, ServiceResult};
use anyhow::{Context, Result, bail};
use std::sync::Arc;

/// bcrypt reads at most this many bytes of a password and ignores the rest.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Slow, salted one-way hashing of secrets.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;

    /// Recomputes the hash of `password` with the salt and cost stored in
    /// `hash` and compares in constant time.
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// bcrypt with a configurable cost factor.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String> {
        if password.len() > MAX_PASSWORD_BYTES {
            bail!("Password exceeds {} bytes", MAX_PASSWORD_BYTES);
        }
        bcrypt::hash(password, self.cost).context("Password hashing failed")
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        // A longer password would be truncated and could match a stored
        // hash of its prefix
        if password.len() > MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        // bcrypt::verify compares digests with subtle::ConstantTimeEq
        bcrypt::verify(password, hash).context("Password verification failed")
    }
}

/// Hashes `password` on the blocking pool.
pub async fn hash_password(
    hasher: Arc<dyn PasswordHasher>,
    password: String,
) -> ServiceResult<String> {
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| ServiceError::internal_error(format!("Hashing task failed: {}", e)))?
        .map_err(|e| ServiceError::internal_error(format!("{:#}", e)))
}

/// Verifies `password` against `hash` on the blocking pool.
pub async fn verify_password(
    hasher: Arc<dyn PasswordHasher>,
    password: String,
    hash: String,
) -> ServiceResult<bool> {
    tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|e| ServiceError::internal_error(format!("Verification task failed: {}", e)))?
        .map_err(|e| ServiceError::internal_error(format!("{:#}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salted_and_carries_cost() {
        let hasher = BcryptHasher::new(4);

        let first = hasher.hash("Secr3t!23").unwrap();
        let second = hasher.hash("Secr3t!23").unwrap();

        assert!(first.starts_with("$2b$04$"));
        assert_ne!(first, second);
        assert!(!first.contains("Secr3t!23"));
    }

    #[test]
    fn test_verify() {
        let hasher = BcryptHasher::new(4);
        let hash = hasher.hash("Secr3t!23").unwrap();

        assert!(hasher.verify("Secr3t!23", &hash).unwrap());
        assert!(!hasher.verify("Secr3t!24", &hash).unwrap());
        assert!(!hasher.verify("", &hash).unwrap());
    }

    #[test]
    fn test_verify_uses_cost_from_hash() {
        let hash = BcryptHasher::new(5).hash("Secr3t!23").unwrap();

        // A hasher configured with another cost still verifies older hashes
        assert!(BcryptHasher::new(4).verify("Secr3t!23", &hash).unwrap());
    }

    #[test]
    fn test_passwords_past_bcrypt_limit() {
        let hasher = BcryptHasher::new(4);
        let stored = "a".repeat(MAX_PASSWORD_BYTES);
        let hash = hasher.hash(&stored).unwrap();

        assert!(hasher.verify(&stored, &hash).unwrap());
        // Same 72-byte prefix, different secret
        assert!(!hasher.verify(&format!("{}extra", stored), &hash).unwrap());
        assert!(hasher.hash(&format!("{}b", stored)).is_err());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(BcryptHasher::new(4).verify("Secr3t!23", "not-a-hash").is_err());
    }

    #[tokio::test]
    async fn test_blocking_helpers() {
        let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(4));

        let hash = hash_password(hasher.clone(), "Secr3t!23".to_string())
            .await
            .unwrap();
        assert!(
            verify_password(hasher.clone(), "Secr3t!23".to_string(), hash.clone())
                .await
                .unwrap()
        );

        let error = verify_password(hasher, "Secr3t!23".to_string(), "garbage".to_string())
            .await
            .unwrap_err();
        assert!(matches!(error, ServiceError::InternalError { .. }));
    }
}
