// src/config.rs

use std::{env, fmt, net::SocketAddr};

use dotenvy::dotenv;

/// Default location of the SQLite database file.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://civic_learn.db";

/// Default token lifetime: one day.
pub const DEFAULT_JWT_EXPIRATION: u64 = 60 * 60 * 24;

/// How many times a quiz submission retries when SQLite still reports the
/// database busy after its own busy timeout.
pub const SUBMIT_MAX_RETRIES: u32 = 5;

/// Base delay between submission retries. Grows linearly with the attempt.
pub const SUBMIT_RETRY_BACKOFF_MS: u64 = 50;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub cors_origins: Vec<String>,
    pub admin_name: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: '{}'", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }

        let jwt_expiration = match env::var("JWT_EXPIRATION") {
            Ok(value) => value.parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "JWT_EXPIRATION",
                value,
            })?,
            Err(_) => DEFAULT_JWT_EXPIRATION,
        };

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = match env::var("BIND_ADDR") {
            Ok(value) => value.parse::<SocketAddr>().map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value,
            })?,
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 5000)),
        };

        let cors_origins = parse_origins(
            &env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string()),
        );

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            cors_origins,
            admin_name: non_empty_var("ADMIN_NAME"),
            admin_email: non_empty_var("ADMIN_EMAIL"),
            admin_password: non_empty_var("ADMIN_PASSWORD"),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Splits a comma separated origin list, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
