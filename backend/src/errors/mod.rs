//! Global application error types.
//!
//! `ServiceError` is what the service layer hands back to handlers; it carries
//! the error kinds a caller may act on. `StoreError` is the contract between the
//! services and any `CredentialStore` implementation.

use thiserror::Error;

/// Service-level error taxonomy shared by registration and sign-in.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Username already exists: {username}")]
    DuplicateIdentifier { username: String },

    /// Deliberately carries no detail about which factor was wrong.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Credential store unavailable: {message}")]
    StorageUnavailable { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    // Helper constructors for common patterns

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn duplicate_identifier(username: impl Into<String>) -> Self {
        Self::DuplicateIdentifier {
            username: username.into(),
        }
    }

    pub fn storage_unavailable(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(validation_errors: validator::ValidationErrors) -> Self {
        let mut error_messages: Vec<String> = validation_errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    format!(
                        "{}: {}",
                        field,
                        error.message.as_ref().unwrap_or(&"Invalid value".into())
                    )
                })
            })
            .collect();
        // field_errors() is backed by a HashMap
        error_messages.sort();

        ServiceError::validation(error_messages.join(", "))
    }
}

/// Errors a credential store may report.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The username is already taken (uniqueness constraint hit).
    #[error("Username already taken: {0}")]
    Duplicate(String),

    /// The store could not be reached or did not answer in time.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store failure: {0}")]
    Failure(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        let unavailable = match &error {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_) => true,
            // SQLITE_BUSY (5) and SQLITE_LOCKED (6)
            sqlx::Error::Database(db_error) => {
                matches!(db_error.code().as_deref(), Some("5") | Some("6"))
            }
            _ => false,
        };

        if unavailable {
            StoreError::Unavailable(error.to_string())
        } else {
            StoreError::Failure(anyhow::Error::new(error))
        }
    }
}
