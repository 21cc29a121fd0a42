//! Main entry point for the eBanking authentication service.
//!
//! Loads configuration, opens the credential store, builds the credential
//! registry and session issuer once, and serves the sign-up/sign-in API.

mod api;
mod auth;
mod config;
mod database;
mod errors;
mod repositories;
mod services;
mod utils;

#[cfg(test)]
mod test_support;

use crate::api::common::ApiResponse;
use crate::auth::service::SessionIssuer;
use crate::config::{Config, StoreBackend};
use crate::database::Database;
use crate::repositories::CredentialStore;
use crate::repositories::credential_repository::SqliteCredentialStore;
use crate::repositories::memory_repository::InMemoryCredentialStore;
use crate::services::credential_service::{CredentialPolicy, CredentialRegistry};
use crate::services::password_service::{BcryptHasher, PasswordHasher};
use crate::utils::jwt::{JwtUtils, TokenSigner};
use anyhow::Context;
use axum::{Extension, Router, response::Json, routing::get};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::fmt::init;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();

    let config = Config::from_env()?;

    let (store, database): (Arc<dyn CredentialStore>, Option<Database>) =
        match config.credential_store {
            StoreBackend::Sqlite => {
                let db = Database::new(&config).await?;
                db.migrate().await?;
                (Arc::new(SqliteCredentialStore::new(db.pool().clone())), Some(db))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory credential store; registrations will not persist");
                (Arc::new(InMemoryCredentialStore::new()), None)
            }
        };

    let bcrypt = BcryptHasher::new(config.bcrypt_cost);
    info!("Hashing passwords with bcrypt cost {}", bcrypt.cost());
    let hasher: Arc<dyn PasswordHasher> = Arc::new(bcrypt);

    let jwt = JwtUtils::from_config(&config)?;
    info!("Signing session tokens with {}", jwt.algorithm());
    let signer: Arc<dyn TokenSigner> = Arc::new(jwt);

    let store_timeout = Duration::from_secs(config.store_timeout_seconds);
    let token_ttl = i64::try_from(config.jwt_expires_in_seconds)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .context("JWT_EXPIRES_IN_SECONDS is too large")?;

    let registry = Arc::new(CredentialRegistry::new(
        store.clone(),
        hasher.clone(),
        CredentialPolicy::from_config(&config),
        store_timeout,
    ));
    let issuer = Arc::new(
        SessionIssuer::new(store, hasher, signer, token_ttl, store_timeout)
            .await
            .context("Failed to initialise the session issuer")?,
    );

    let app = app(registry, issuer);

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    info!("Starting eBanking auth server on port {}", config.server_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = database {
        db.close().await;
    }

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

fn app(registry: Arc<CredentialRegistry>, issuer: Arc<SessionIssuer>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .nest("/api/auth", auth::routes::auth_router())
        .layer(Extension(registry))
        .layer(Extension(issuer))
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "eBanking Auth",
            "version": env!("CARGO_PKG_VERSION")
        }),
        "Welcome to the eBanking auth API",
    ))
}
