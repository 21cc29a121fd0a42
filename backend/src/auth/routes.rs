//! Defines the HTTP routes for authentication.
//!
//! Neither route requires an existing session. The router expects
//! `Arc<CredentialRegistry>` and `Arc<SessionIssuer>` extensions to be layered
//! on by the caller.

use crate::auth::handlers::*;
use axum::{Router, routing::post};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
}
