//! Bearer token service
//!
//! Issues and verifies HS256 JSON Web Tokens. The signing key, issuer, and
//! lifetime come from [`AuthConfig`], so every component that needs to mint or
//! check tokens shares the same explicitly constructed service instead of
//! reaching for process-wide state.

use crate::config::AuthConfig;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims carried by every issued token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject, the user ID as a decimal string
    pub sub: String,
    /// Issued-at, seconds since the epoch
    pub iat: i64,
    /// Expiration, seconds since the epoch
    pub exp: i64,
}

/// Token service for issuing and verifying bearer tokens
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service from the auth configuration
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.token_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.token_secret.as_bytes()),
            issuer: config.token_issuer.clone(),
            ttl: Duration::hours(config.token_ttl_hours),
        }
    }

    /// Issue a signed token for the given user ID
    pub fn issue(&self, user_id: i64) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to sign token")
    }

    /// Verify a token's signature, issuer, and expiry, returning the user ID
    pub fn verify(&self, token: &str) -> Result<i64> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .context("Invalid or expired token")?;

        data.claims
            .sub
            .parse::<i64>()
            .context("Token subject is not a valid user ID")
    }
}
