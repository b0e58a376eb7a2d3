use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::db::{DEFAULT_MAX_POOL_SIZE, DEFAULT_STATEMENT_TIMEOUT_MS};

pub const DEFAULT_DOCUMENT_VERSION: &str = "v2025-10-28";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_pool_size: u32,
    pub database_statement_timeout_ms: u64,
    pub server_host: String,
    pub server_port: u16,
    /// Credential required in `X-API-Key` for snapshot writes and stats.
    pub admin_key: Option<String>,
    /// CORS allow-list; empty means any origin.
    pub allowed_origins: Vec<String>,
    /// Version tag of the documents currently served to clients.
    pub document_version: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_pool_size = env::var("DATABASE_MAX_POOL_SIZE")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_MAX_POOL_SIZE);
        let database_statement_timeout_ms = env::var("DATABASE_STATEMENT_TIMEOUT_MS")
            .unwrap_or_else(|_| DEFAULT_STATEMENT_TIMEOUT_MS.to_string())
            .parse()
            .context("DATABASE_STATEMENT_TIMEOUT_MS must be an integer")?;
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .context("SERVER_PORT must be a valid u16")?;
        let admin_key = env::var("ADMIN_API_KEY")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();
        let document_version = env::var("DOCUMENT_VERSION")
            .unwrap_or_else(|_| DEFAULT_DOCUMENT_VERSION.to_string());

        Ok(Self {
            database_url,
            database_max_pool_size,
            database_statement_timeout_ms,
            server_host,
            server_port,
            admin_key,
            allowed_origins,
            document_version,
        })
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.database_statement_timeout_ms)
    }

    pub fn redacted_database_url(&self) -> String {
        redact_database_url(&self.database_url)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn redact_database_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("*****"));
            }
            parsed.to_string()
        }
        Err(_) => "***".to_string(),
    }
}
