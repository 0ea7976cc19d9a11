//! Authentication service - Verifies bearer tokens.
//!
//! Tokens are issued elsewhere; this service only checks signature, issuer,
//! audience and expiry, and reads the caller's name.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::AppResult;

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Caller name recorded in audit stamps
    #[serde(default)]
    pub name: Option<String>,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

/// Authentication service trait for dependency injection.
pub trait AuthService: Send + Sync {
    /// Verify JWT token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

/// HS256 verifier bound to the configured issuer and audience.
pub struct Authenticator {
    key: DecodingKey,
    validation: Validation,
}

impl Authenticator {
    pub fn new(config: &Config) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.jwt_issuer.as_str()]);
        validation.set_audience(&[config.jwt_audience.as_str()]);

        Self {
            key: DecodingKey::from_secret(config.jwt_secret_bytes()),
            validation,
        }
    }
}

impl AuthService for Authenticator {
    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(token_data.claims)
    }
}
