//! Core business logic for sign-in.
//!
//! Verifies a username/password pair against the credential store and mints a
//! signed, time-bounded session token. Nothing is written on sign-in; the
//! token alone carries the session.

use crate::auth::models::{AuthRequest, SignedIn};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::{CredentialStore, with_deadline};
use crate::services::password_service::{PasswordHasher, hash_password, verify_password};
use crate::utils::generate_random_string::generate_random_string;
use crate::utils::jwt::{SessionClaims, SessionToken, TokenSigner};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Issues session tokens for verified credentials.
pub struct SessionIssuer {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    signer: Arc<dyn TokenSigner>,
    token_ttl: Duration,
    store_timeout: std::time::Duration,
    /// Verified against when the username is unknown, so that path costs
    /// the same as a wrong password.
    dummy_hash: String,
}

impl SessionIssuer {
    /// Create a new SessionIssuer instance.
    ///
    /// Hashes a throwaway password with `hasher` up front; this takes as long
    /// as one registration.
    pub async fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        signer: Arc<dyn TokenSigner>,
        token_ttl: Duration,
        store_timeout: std::time::Duration,
    ) -> ServiceResult<Self> {
        if token_ttl <= Duration::zero() {
            return Err(ServiceError::validation("Token TTL must be positive"));
        }

        let dummy_hash = hash_password(hasher.clone(), generate_random_string(32)).await?;

        Ok(SessionIssuer {
            store,
            hasher,
            signer,
            token_ttl,
            store_timeout,
            dummy_hash,
        })
    }

    /// Authenticate a client and issue a session token.
    ///
    /// Unknown usernames, wrong passwords and empty fields all end in
    /// `ServiceError::InvalidCredentials` after one full hash verification.
    /// Store, hashing and signing failures surface as `InternalError`.
    pub async fn authenticate(&self, request: AuthRequest) -> ServiceResult<SignedIn> {
        let credential = with_deadline(
            self.store_timeout,
            self.store.find_by_username(&request.username),
        )
        .await
        .map_err(|e| ServiceError::internal_error(format!("Credential lookup failed: {}", e)))?;

        let stored_hash = match &credential {
            Some(credential) => credential.password_hash.clone(),
            None => self.dummy_hash.clone(),
        };
        let password_matches =
            verify_password(self.hasher.clone(), request.password, stored_hash).await?;

        let credential = match credential {
            Some(credential) if password_matches => credential,
            _ => {
                warn!("Sign-in rejected: invalid credentials");
                return Err(ServiceError::InvalidCredentials);
            }
        };

        let session = self.issue(&credential.id)?;

        info!(client_id = %credential.id, "Issued session token");
        Ok(SignedIn {
            session,
            identity: credential.into(),
        })
    }

    /// Sign claims for `subject_id` valid from now until now + TTL.
    fn issue(&self, subject_id: &str) -> ServiceResult<SessionToken> {
        // JWT timestamps have whole-second resolution
        let now = Utc::now().timestamp();
        let issued_at = DateTime::<Utc>::from_timestamp(now, 0)
            .ok_or_else(|| ServiceError::internal_error("Clock out of range"))?;
        let expires_at = issued_at
            .checked_add_signed(self.token_ttl)
            .ok_or_else(|| ServiceError::internal_error("Token expiry out of range"))?;

        let claims = SessionClaims {
            sub: subject_id.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = self
            .signer
            .sign(&claims)
            .map_err(|e| ServiceError::internal_error(format!("{:#}", e)))?;

        Ok(SessionToken {
            token,
            subject_id: claims.sub,
            issued_at,
            expires_at,
        })
    }
}
