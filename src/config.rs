use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::auth::token::{DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS};

pub const DEFAULT_PORT: u16 = 6001;
pub const DEFAULT_MAX_BODY_BYTES: usize = 30 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub host: String,
    pub port: u16,
    pub assets_dir: PathBuf,
    pub max_body_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let token_ttl_secs = match lookup("TOKEN_TTL_SECS") {
            Some(raw) => raw
                .parse::<i64>()
                .context("TOKEN_TTL_SECS must be a whole number of seconds")?,
            None => DEFAULT_TOKEN_TTL_SECS,
        };
        if !(0..=MAX_TOKEN_TTL_SECS).contains(&token_ttl_secs) {
            anyhow::bail!(
                "TOKEN_TTL_SECS must be between 0 and {}, got {}",
                MAX_TOKEN_TTL_SECS,
                token_ttl_secs
            );
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret,
            token_ttl_secs,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: match lookup("PORT") {
                Some(raw) => raw.parse().context("PORT must be a valid number")?,
                None => DEFAULT_PORT,
            },
            assets_dir: lookup("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("public/assets")),
            max_body_bytes: match lookup("MAX_BODY_BYTES") {
                Some(raw) => raw.parse().context("MAX_BODY_BYTES must be a valid number")?,
                None => DEFAULT_MAX_BODY_BYTES,
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
