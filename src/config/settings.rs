//! Application settings loaded from environment variables.

use std::env;
use std::time::Duration;

use super::constants::{
    DEFAULT_CORS_ORIGIN, DEFAULT_DATABASE_URL, DEFAULT_DB_MAX_RETRY_COUNT,
    DEFAULT_DB_MAX_RETRY_DELAY_SECS, DEFAULT_JWT_AUDIENCE, DEFAULT_JWT_ISSUER,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, MIN_JWT_SECRET_LENGTH, PRODUCTION_ENVIRONMENT,
};
use crate::errors::{AppError, AppResult};

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Deployment environment name (`APP_ENV`)
    pub environment: String,
    pub db_max_retry_count: u32,
    pub db_max_retry_delay: Duration,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    jwt_secret: String,
    pub cors_allowed_origin: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("environment", &self.environment)
            .field("db_max_retry_count", &self.db_max_retry_count)
            .field("db_max_retry_delay", &self.db_max_retry_delay)
            .field("jwt_issuer", &self.jwt_issuer)
            .field("jwt_audience", &self.jwt_audience)
            .field("jwt_secret", &"[REDACTED]")
            .field("cors_allowed_origin", &self.cors_allowed_origin)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Fails when `JWT_SECRET` is missing in a release build or shorter than
    /// the minimum length.
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                "dev-secret-key-minimum-32-chars!!".to_string()
            }
            Err(_) => {
                return Err(AppError::internal(
                    "JWT_SECRET environment variable must be set in production",
                ))
            }
        };

        Self::builder()
            .database_url(env_or("DATABASE_URL", DEFAULT_DATABASE_URL))
            .server(
                env_or("SERVER_HOST", DEFAULT_SERVER_HOST),
                env_parsed("SERVER_PORT", DEFAULT_SERVER_PORT),
            )
            .environment(env_or("APP_ENV", PRODUCTION_ENVIRONMENT))
            .retry(
                env_parsed("DB_MAX_RETRY_COUNT", DEFAULT_DB_MAX_RETRY_COUNT),
                Duration::from_secs(env_parsed(
                    "DB_MAX_RETRY_DELAY_SECS",
                    DEFAULT_DB_MAX_RETRY_DELAY_SECS,
                )),
            )
            .jwt(
                env_or("JWT_ISSUER", DEFAULT_JWT_ISSUER),
                env_or("JWT_AUDIENCE", DEFAULT_JWT_AUDIENCE),
                jwt_secret,
            )
            .cors_allowed_origin(env_or("CORS_ALLOWED_ORIGIN", DEFAULT_CORS_ORIGIN))
            .build()
    }

    /// Start from the built-in defaults. Used by tests and embedders.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Get JWT secret bytes for token verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Whether error responses may carry messages and error chains.
    pub fn diagnostics_enabled(&self) -> bool {
        !self.environment.eq_ignore_ascii_case(PRODUCTION_ENVIRONMENT)
    }
}

/// Incremental [`Config`] construction with validation on `build`.
#[derive(Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            config: Config {
                database_url: DEFAULT_DATABASE_URL.to_string(),
                server_host: DEFAULT_SERVER_HOST.to_string(),
                server_port: DEFAULT_SERVER_PORT,
                environment: PRODUCTION_ENVIRONMENT.to_string(),
                db_max_retry_count: DEFAULT_DB_MAX_RETRY_COUNT,
                db_max_retry_delay: Duration::from_secs(DEFAULT_DB_MAX_RETRY_DELAY_SECS),
                jwt_issuer: DEFAULT_JWT_ISSUER.to_string(),
                jwt_audience: DEFAULT_JWT_AUDIENCE.to_string(),
                jwt_secret: String::new(),
                cors_allowed_origin: DEFAULT_CORS_ORIGIN.to_string(),
            },
        }
    }
}

impl ConfigBuilder {
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = url.into();
        self
    }

    pub fn server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.config.server_host = host.into();
        self.config.server_port = port;
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.config.environment = environment.into();
        self
    }

    pub fn retry(mut self, max_retry_count: u32, delay: Duration) -> Self {
        self.config.db_max_retry_count = max_retry_count;
        self.config.db_max_retry_delay = delay;
        self
    }

    pub fn jwt(
        mut self,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.config.jwt_issuer = issuer.into();
        self.config.jwt_audience = audience.into();
        self.config.jwt_secret = secret.into();
        self
    }

    pub fn cors_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.config.cors_allowed_origin = origin.into();
        self
    }

    pub fn build(self) -> AppResult<Config> {
        if self.config.jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(AppError::internal(format!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            )));
        }
        Ok(self.config)
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
