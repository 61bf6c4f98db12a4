use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

pub mod gate;
pub mod membership;

pub use gate::{require_group_admin, require_logged_in, require_site_admin, AuthError};
pub use membership::{Membership, MembershipAuthority};

/// Verified caller context attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub is_admin: bool,
}

impl Identity {
    pub fn new(username: impl Into<String>, is_admin: bool) -> Self {
        Self {
            username: username.into(),
            is_admin,
        }
    }
}

/// Signed token payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    fn new(identity: &Identity, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            username: identity.username.clone(),
            is_admin: identity.is_admin,
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
        }
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.username,
            is_admin: claims.is_admin,
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token generation error: {0}")]
    Generation(String),

    #[error("Signing secret not configured")]
    MissingSecret,
}

/// Signs and verifies identity tokens with a single process-wide secret.
///
/// Stateless apart from the keys; built once at startup and shared.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenCodec {
    pub fn new(secret: &str, lifetime: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let mut validation = Validation::default();
        // Expiry is exact; no grace window past `exp`.
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
        })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, TokenError> {
        Self::new(
            &security.secret_key,
            Duration::hours(security.token_expiry_hours as i64),
        )
    }

    /// Sign a token that expires after the configured lifetime.
    pub fn sign(&self, identity: &Identity) -> Result<String, TokenError> {
        self.sign_until(identity, Utc::now() + self.lifetime)
    }

    /// Sign a token with an explicit expiry.
    pub fn sign_until(
        &self,
        identity: &Identity,
        expires_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims::new(identity, Utc::now(), expires_at);
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }

    /// Check signature, shape and expiry, returning the embedded identity.
    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| TokenError::InvalidToken(e.to_string()))?;

        Ok(token_data.claims.into())
    }
}
