//! JWT token utilities for session issuance.
//!
//! Tokens are self-contained: the server keeps no session table, so a token is
//! valid exactly when its signature checks out under the server key and `exp`
//! has not passed.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::Config;

/// Claims signed into every session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    /// Credential ID the token was issued for
    pub sub: String,
    /// Issued-at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
}

/// An issued, signed session token together with its decoded bounds.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub subject_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Signing algorithms accepted in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    Hs256,
    Hs384,
    Hs512,
    Rs256,
    Es256,
    EdDsa,
}

impl SigningAlgorithm {
    /// True for the shared-secret (HMAC) family.
    pub fn is_symmetric(&self) -> bool {
        matches!(self, Self::Hs256 | Self::Hs384 | Self::Hs512)
    }

    fn to_jwt(self) -> Algorithm {
        match self {
            Self::Hs256 => Algorithm::HS256,
            Self::Hs384 => Algorithm::HS384,
            Self::Hs512 => Algorithm::HS512,
            Self::Rs256 => Algorithm::RS256,
            Self::Es256 => Algorithm::ES256,
            Self::EdDsa => Algorithm::EdDSA,
        }
    }
}

impl FromStr for SigningAlgorithm {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_uppercase().as_str() {
            "HS256" => Ok(Self::Hs256),
            "HS384" => Ok(Self::Hs384),
            "HS512" => Ok(Self::Hs512),
            "RS256" => Ok(Self::Rs256),
            "ES256" => Ok(Self::Es256),
            "EDDSA" => Ok(Self::EdDsa),
            _ => Err(format!("Unsupported signing algorithm: {}", input)),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hs256 => "HS256",
            Self::Hs384 => "HS384",
            Self::Hs512 => "HS512",
            Self::Rs256 => "RS256",
            Self::Es256 => "ES256",
            Self::EdDsa => "EdDSA",
        };
        write!(f, "{}", name)
    }
}

/// Raw key material for building a `JwtUtils`.
pub enum KeyMaterial {
    /// Shared secret for HS* algorithms
    Secret(Vec<u8>),
    /// PEM-encoded key pair for RS256/ES256/EdDSA
    Pem {
        private_pem: Vec<u8>,
        public_pem: Vec<u8>,
    },
}

/// Produces the signed form of a set of session claims.
pub trait TokenSigner: Send + Sync {
    fn sign(&self, claims: &SessionClaims) -> Result<String>;
}

/// JWT token utility for creating and validating session tokens.
pub struct JwtUtils {
    algorithm: SigningAlgorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtUtils {
    /// Create a new JwtUtils instance for `algorithm` from the given keys.
    pub fn new(algorithm: SigningAlgorithm, keys: KeyMaterial) -> Result<Self> {
        let (encoding_key, decoding_key) = match keys {
            KeyMaterial::Secret(secret) => {
                if !algorithm.is_symmetric() {
                    bail!("{} requires a PEM key pair, not a shared secret", algorithm);
                }
                if secret.is_empty() {
                    bail!("JWT secret must not be empty");
                }
                (
                    EncodingKey::from_secret(&secret),
                    DecodingKey::from_secret(&secret),
                )
            }
            KeyMaterial::Pem {
                private_pem,
                public_pem,
            } => match algorithm {
                SigningAlgorithm::Rs256 => (
                    EncodingKey::from_rsa_pem(&private_pem).context("Invalid RSA private key")?,
                    DecodingKey::from_rsa_pem(&public_pem).context("Invalid RSA public key")?,
                ),
                SigningAlgorithm::Es256 => (
                    EncodingKey::from_ec_pem(&private_pem).context("Invalid EC private key")?,
                    DecodingKey::from_ec_pem(&public_pem).context("Invalid EC public key")?,
                ),
                SigningAlgorithm::EdDsa => (
                    EncodingKey::from_ed_pem(&private_pem)
                        .context("Invalid Ed25519 private key")?,
                    DecodingKey::from_ed_pem(&public_pem).context("Invalid Ed25519 public key")?,
                ),
                _ => bail!("{} requires a shared secret, not a PEM key pair", algorithm),
            },
        };

        let mut validation = Validation::new(algorithm.to_jwt());
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(JwtUtils {
            algorithm,
            encoding_key,
            decoding_key,
            validation,
        })
    }

    /// Build the signer described by the application configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let keys = if config.jwt_algorithm.is_symmetric() {
            let secret = config
                .jwt_secret
                .as_ref()
                .context("JWT_SECRET not set")?;
            if secret.len() < 32 {
                tracing::warn!("JWT_SECRET is shorter than 32 bytes");
            }
            KeyMaterial::Secret(secret.as_bytes().to_vec())
        } else {
            let private_path = config
                .jwt_private_key_path
                .as_ref()
                .context("JWT_PRIVATE_KEY_PATH not set")?;
            let public_path = config
                .jwt_public_key_path
                .as_ref()
                .context("JWT_PUBLIC_KEY_PATH not set")?;
            KeyMaterial::Pem {
                private_pem: std::fs::read(private_path)
                    .with_context(|| format!("Failed to read {}", private_path.display()))?,
                public_pem: std::fs::read(public_path)
                    .with_context(|| format!("Failed to read {}", public_path.display()))?,
            }
        };

        let jwt = Self::new(config.jwt_algorithm, keys)?;
        jwt.self_check()?;
        Ok(jwt)
    }

    /// Signs and validates a probe token, catching a public key that does
    /// not belong to the private key before any client sees a token.
    fn self_check(&self) -> Result<()> {
        let now = Utc::now().timestamp();
        let probe = SessionClaims {
            sub: "self-check".to_string(),
            iat: now,
            exp: now + 60,
        };
        let token = self.sign(&probe)?;
        self.validate_token(&token)
            .context("Signing key and verification key do not match")?;
        Ok(())
    }

    pub fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Validate and decode a session token (signature and expiry).
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map(|token_data| token_data.claims)
            .context("Token validation failed")
    }
}

impl TokenSigner for JwtUtils {
    fn sign(&self, claims: &SessionClaims) -> Result<String> {
        encode(
            &Header::new(self.algorithm.to_jwt()),
            claims,
            &self.encoding_key,
        )
        .context("Token generation failed")
    }
}
