//! Data structures for authentication requests and responses.

use crate::database::models::PublicIdentity;
use crate::utils::jwt::SessionToken;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Sign-up and sign-in request payload
#[derive(Clone, Deserialize, Validate)]
pub struct AuthRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl AuthRequest {
    #[cfg(test)]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Outcome of a successful sign-in
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub session: SessionToken,
    pub identity: PublicIdentity,
}

/// Sign-in response containing the session token and public identity
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub id: String,
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<SignedIn> for AuthResponse {
    fn from(signed_in: SignedIn) -> Self {
        AuthResponse {
            access_token: signed_in.session.token,
            token_type: "Bearer".to_string(),
            id: signed_in.identity.id,
            username: signed_in.identity.username,
            issued_at: signed_in.session.issued_at,
            expires_at: signed_in.session.expires_at,
        }
    }
}
