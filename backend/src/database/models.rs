//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. The password hash never leaves the service layer; API
//! responses use `PublicIdentity` instead.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One registered client: login name plus a one-way password hash.
///
/// Usernames are compared case-sensitively and byte for byte.
#[derive(Clone, FromRow)]
pub struct Credential {
    pub id: String,
    pub username: String,
    /// bcrypt string; embeds algorithm version, cost and salt
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Data required to persist a new credential; the store assigns the ID.
#[derive(Clone)]
pub struct NewCredential {
    pub username: String,
    pub password_hash: String,
}

/// The parts of a credential that are safe to show to the caller.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PublicIdentity {
    pub id: String,
    pub username: String,
}

impl From<Credential> for PublicIdentity {
    fn from(credential: Credential) -> Self {
        PublicIdentity {
            id: credential.id,
            username: credential.username,
        }
    }
}
