//! Handler functions for authentication-related API endpoints.
//!
//! These functions parse request data and hand it to the credential registry
//! (sign-up) or the session issuer (sign-in).

use crate::api::common::{ApiResponse, service_error_to_http};
use crate::auth::models::*;
use crate::auth::service::SessionIssuer;
use crate::database::models::PublicIdentity;
use crate::services::credential_service::CredentialRegistry;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::Json as ResponseJson,
};
use std::sync::Arc;

/// Handle client sign-up request
#[axum::debug_handler]
pub async fn signup(
    Extension(registry): Extension<Arc<CredentialRegistry>>,
    Json(payload): Json<AuthRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<PublicIdentity>>), (StatusCode, String)> {
    match registry.register(payload).await {
        Ok(identity) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(identity, "Client registered successfully")),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle client sign-in request
#[axum::debug_handler]
pub async fn signin(
    Extension(issuer): Extension<Arc<SessionIssuer>>,
    Json(payload): Json<AuthRequest>,
) -> Result<ResponseJson<AuthResponse>, (StatusCode, String)> {
    match issuer.authenticate(payload).await {
        Ok(signed_in) => Ok(ResponseJson(signed_in.into())),
        Err(error) => Err(service_error_to_http(error)),
    }
}
