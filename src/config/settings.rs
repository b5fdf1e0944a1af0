//! Server and authentication settings read from environment variables.
//!
//! `.env` is loaded by `main` before [`Settings::from_env`] runs, so values may
//! come from either the process environment or the file.

use crate::config::database::get_database_url;
use crate::errors::{Error, Result};
use chrono::Duration;
use std::path::PathBuf;
use std::str::FromStr;

/// Runtime settings for the HTTP server and the identity layer.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Interface the server binds to
    pub server_host: String,
    /// Port the server binds to
    pub server_port: u16,
    /// `SeaORM` connection URL
    pub database_url: String,
    /// HMAC secret for signing JWTs
    pub jwt_secret: String,
    /// Lifetime of access tokens
    pub access_token_ttl: Duration,
    /// Lifetime of refresh tokens
    pub refresh_token_ttl: Duration,
    /// Lifetime of cookie sessions
    pub session_ttl: Duration,
    /// Optional TOML file used to seed the catalog at startup
    pub catalog_path: Option<PathBuf>,
}

impl Settings {
    /// Reads settings from the environment, applying defaults where sensible.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if `JWT_SECRET` is missing or any numeric
    /// variable fails to parse.
    pub fn from_env() -> Result<Self> {
        let server_host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = parse_var("SERVER_PORT", 8000_u16)?;
        let jwt_secret = std::env::var("JWT_SECRET").map_err(|e| Error::Config {
            message: format!("JWT_SECRET must be set: {e}"),
        })?;
        if jwt_secret.trim().is_empty() {
            return Err(Error::Config {
                message: "JWT_SECRET cannot be empty".to_string(),
            });
        }

        let settings = Self {
            server_host,
            server_port,
            database_url: get_database_url(),
            jwt_secret,
            access_token_ttl: Duration::minutes(parse_var("ACCESS_TOKEN_MINUTES", 5_i64)?),
            refresh_token_ttl: Duration::days(parse_var("REFRESH_TOKEN_DAYS", 1_i64)?),
            session_ttl: Duration::days(parse_var("SESSION_DAYS", 14_i64)?),
            catalog_path: std::env::var("CATALOG_PATH").ok().map(PathBuf::from),
        };

        tracing::info!(
            host = %settings.server_host,
            port = settings.server_port,
            "Settings loaded"
        );
        Ok(settings)
    }

    /// Settings suitable for tests: in-memory database and short fixed secret.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            access_token_ttl: Duration::minutes(5),
            refresh_token_ttl: Duration::days(1),
            session_ttl: Duration::days(14),
            catalog_path: None,
        }
    }

    /// `host:port` string the listener binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| Error::Config {
            message: format!("Invalid {name}: {e}"),
        }),
        Err(_) => Ok(default),
    }
}
