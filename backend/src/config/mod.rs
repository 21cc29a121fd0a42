//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, server port, token signing keys and the credential policy.

use anyhow::{Context, Result, anyhow, bail};
use regex::Regex;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::utils::jwt::SigningAlgorithm;

/// Longest accepted session token lifetime (one year).
pub const MAX_JWT_EXPIRES_IN_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Where credentials are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    /// Process-local; everything is lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(input: &str) -> std::result::Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid credential store: {}", input)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credential_store: StoreBackend,
    /// Required for the SQLite store
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub store_timeout_seconds: u64,
    pub jwt_algorithm: SigningAlgorithm,
    pub jwt_secret: Option<String>,
    pub jwt_private_key_path: Option<PathBuf>,
    pub jwt_public_key_path: Option<PathBuf>,
    pub jwt_expires_in_seconds: u64,
    pub bcrypt_cost: u32,
    pub min_password_length: Option<usize>,
    /// Anchored: the whole username must match.
    pub username_pattern: Option<Regex>,
    pub server_port: u16,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential_store = match lookup("CREDENTIAL_STORE") {
            Some(value) => value
                .parse::<StoreBackend>()
                .map_err(|e| anyhow!(e))
                .context("CREDENTIAL_STORE must be either sqlite or memory")?,
            None => StoreBackend::Sqlite,
        };

        let database_url = lookup("DATABASE_URL");
        if credential_store == StoreBackend::Sqlite && database_url.is_none() {
            bail!("DATABASE_URL not set");
        }

        let max_connections = parse_or(&lookup, "DB_MAX_CONNECTIONS", 5u32)?;
        let acquire_timeout_seconds = parse_or(&lookup, "DB_ACQUIRE_TIMEOUT_SECONDS", 3u64)?;
        let store_timeout_seconds = parse_or(&lookup, "STORE_TIMEOUT_SECONDS", 5u64)?;

        let jwt_algorithm = match lookup("JWT_ALGORITHM") {
            Some(value) => value
                .parse::<SigningAlgorithm>()
                .map_err(|e| anyhow!(e))
                .context("JWT_ALGORITHM must be one of HS256, HS384, HS512, RS256, ES256, EdDSA")?,
            None => SigningAlgorithm::Hs256,
        };

        let jwt_secret = lookup("JWT_SECRET").filter(|secret| !secret.is_empty());
        let jwt_private_key_path = lookup("JWT_PRIVATE_KEY_PATH").map(PathBuf::from);
        let jwt_public_key_path = lookup("JWT_PUBLIC_KEY_PATH").map(PathBuf::from);

        if jwt_algorithm.is_symmetric() {
            if jwt_secret.is_none() {
                bail!("JWT_SECRET not set");
            }
        } else if jwt_private_key_path.is_none() || jwt_public_key_path.is_none() {
            bail!(
                "JWT_PRIVATE_KEY_PATH and JWT_PUBLIC_KEY_PATH must be set for {}",
                jwt_algorithm
            );
        }

        let jwt_expires_in_seconds = parse_or(&lookup, "JWT_EXPIRES_IN_SECONDS", 86400u64)?;
        if !(1..=MAX_JWT_EXPIRES_IN_SECONDS).contains(&jwt_expires_in_seconds) {
            bail!(
                "JWT_EXPIRES_IN_SECONDS must be between 1 and {}",
                MAX_JWT_EXPIRES_IN_SECONDS
            );
        }

        let bcrypt_cost = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            bail!("BCRYPT_COST must be between 4 and 31");
        }

        let min_password_length = match lookup("MIN_PASSWORD_LENGTH") {
            Some(value) => Some(
                value
                    .parse::<usize>()
                    .context("MIN_PASSWORD_LENGTH must be a valid number")?,
            ),
            None => None,
        };

        let username_pattern = match lookup("USERNAME_PATTERN") {
            Some(pattern) => Some(
                Regex::new(&format!("^(?:{})$", pattern))
                    .context("USERNAME_PATTERN must be a valid regular expression")?,
            ),
            None => None,
        };

        let server_port = parse_or(&lookup, "SERVER_PORT", 3000u16)?;

        Ok(Config {
            credential_store,
            database_url,
            max_connections,
            acquire_timeout_seconds,
            store_timeout_seconds,
            jwt_algorithm,
            jwt_secret,
            jwt_private_key_path,
            jwt_public_key_path,
            jwt_expires_in_seconds,
            bcrypt_cost,
            min_password_length,
            username_pattern,
            server_port,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .parse::<T>()
            .map_err(|_| anyhow!("{} must be a valid number", key)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("JWT_SECRET", "secret"),
        ])
        .unwrap();

        assert_eq!(config.credential_store, StoreBackend::Sqlite);
        assert_eq!(config.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.acquire_timeout_seconds, 3);
        assert_eq!(config.store_timeout_seconds, 5);
        assert_eq!(config.jwt_algorithm, SigningAlgorithm::Hs256);
        assert_eq!(config.jwt_expires_in_seconds, 86400);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.min_password_length, None);
        assert!(config.username_pattern.is_none());
        assert_eq!(config.server_port, 3000);
    }

    #[test]
    fn test_missing_required_values() {
        assert!(config_from(&[("JWT_SECRET", "secret")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "sqlite::memory:")]).is_err());
        assert!(
            config_from(&[("DATABASE_URL", "sqlite::memory:"), ("JWT_SECRET", "")]).is_err()
        );
    }

    #[test]
    fn test_memory_store_needs_no_database_url() {
        let config = config_from(&[("CREDENTIAL_STORE", "memory"), ("JWT_SECRET", "secret")])
            .unwrap();
        assert_eq!(config.credential_store, StoreBackend::Memory);
        assert!(config.database_url.is_none());

        assert!(config_from(&[("CREDENTIAL_STORE", "redis"), ("JWT_SECRET", "secret")]).is_err());
    }

    #[test]
    fn test_asymmetric_algorithm_needs_key_paths() {
        let result = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("JWT_ALGORITHM", "RS256"),
        ]);
        assert!(result.is_err());

        let config = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("JWT_ALGORITHM", "RS256"),
            ("JWT_PRIVATE_KEY_PATH", "/keys/private.pem"),
            ("JWT_PUBLIC_KEY_PATH", "/keys/public.pem"),
        ])
        .unwrap();
        assert_eq!(config.jwt_algorithm, SigningAlgorithm::Rs256);
        assert!(config.jwt_secret.is_none());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let base = [("DATABASE_URL", "sqlite::memory:"), ("JWT_SECRET", "secret")];

        let mut zero_ttl = base.to_vec();
        zero_ttl.push(("JWT_EXPIRES_IN_SECONDS", "0"));
        assert!(config_from(&zero_ttl).is_err());

        let mut huge_ttl = base.to_vec();
        huge_ttl.push(("JWT_EXPIRES_IN_SECONDS", "10000000000000"));
        assert!(config_from(&huge_ttl).is_err());

        let mut year_ttl = base.to_vec();
        year_ttl.push(("JWT_EXPIRES_IN_SECONDS", "31536000"));
        assert_eq!(
            config_from(&year_ttl).unwrap().jwt_expires_in_seconds,
            MAX_JWT_EXPIRES_IN_SECONDS
        );

        let mut low_cost = base.to_vec();
        low_cost.push(("BCRYPT_COST", "3"));
        assert!(config_from(&low_cost).is_err());

        let mut bad_port = base.to_vec();
        bad_port.push(("SERVER_PORT", "not-a-port"));
        assert!(config_from(&bad_port).is_err());

        let mut bad_pattern = base.to_vec();
        bad_pattern.push(("USERNAME_PATTERN", "[a-z"));
        assert!(config_from(&bad_pattern).is_err());
    }

    #[test]
    fn test_username_pattern_is_anchored() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("JWT_SECRET", "secret"),
            ("USERNAME_PATTERN", "[a-z]+"),
            ("MIN_PASSWORD_LENGTH", "8"),
        ])
        .unwrap();

        let pattern = config.username_pattern.unwrap();
        assert!(pattern.is_match("alice"));
        assert!(!pattern.is_match("alice!"));
        assert!(!pattern.is_match("Alice"));
        assert_eq!(config.min_password_length, Some(8));
    }
}
