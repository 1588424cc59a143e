// ABOUTME: Runtime configuration for the Keel settings service
// ABOUTME: Reads environment variables and validates them into a typed Config

pub mod constants;

use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use constants::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
    #[error("Admin token hash must be 64 hex characters (SHA-256)")]
    InvalidTokenHash,
    #[error("Unsupported database URL: {0}")]
    UnsupportedDatabase(String),
}

/// Which options backend the service persists into
#[derive(Debug, Clone, PartialEq)]
pub enum BackendKind {
    Memory,
    Sqlite(String),
}

impl BackendKind {
    pub fn parse(url: &str) -> Result<Self, ConfigError> {
        let url = url.trim();
        if url.eq_ignore_ascii_case(MEMORY_DATABASE_URL) {
            Ok(BackendKind::Memory)
        } else if url.starts_with("sqlite:") {
            Ok(BackendKind::Sqlite(url.to_string()))
        } else {
            Err(ConfigError::UnsupportedDatabase(url.to_string()))
        }
    }
}

/// Reject port 0, which would bind an ephemeral port
pub fn validate_port(port: u16) -> Result<u16, ConfigError> {
    if port == 0 {
        return Err(ConfigError::PortOutOfRange(port));
    }
    Ok(port)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: BackendKind,
    pub option_name: String,
    pub defaults_path: Option<PathBuf>,
    /// Hex-encoded SHA-256 of the admin bearer token. No admin access without it.
    pub admin_token_hash: Option<String>,
    /// Secret for integrity tokens. A random one is generated at startup when unset.
    pub nonce_secret: Option<String>,
    pub nonce_lifetime: Duration,
    pub menu_priority: i32,
}

impl Config {
    /// Apply command-line overrides with the same checks as the environment
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = validate_port(port)?;
        }
        Ok(self)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var(KEEL_HOST).unwrap_or_else(|_| DEFAULT_HOST.to_string());

        let port = match env::var(KEEL_PORT).or_else(|_| env::var(PORT)) {
            Ok(port_str) => port_str.trim().parse::<u16>()?,
            Err(_) => DEFAULT_PORT,
        };

        let port = validate_port(port)?;

        let backend = BackendKind::parse(
            &env::var(KEEL_DATABASE_URL).unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
        )?;

        let option_name = env::var(KEEL_OPTION_NAME)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_OPTION_NAME.to_string());

        if !option_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::InvalidValue {
                name: KEEL_OPTION_NAME,
                value: option_name,
            });
        }

        let defaults_path = non_empty_var(KEEL_DEFAULTS_PATH).map(PathBuf::from);

        let admin_token_hash = match non_empty_var(KEEL_ADMIN_TOKEN_HASH) {
            Some(hash) => Some(validate_token_hash(&hash)?),
            None => None,
        };

        let nonce_secret = non_empty_var(KEEL_NONCE_SECRET);

        let nonce_lifetime = match non_empty_var(KEEL_NONCE_LIFETIME_SECS) {
            Some(secs) => {
                let parsed = secs
                    .parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or(ConfigError::InvalidValue {
                        name: KEEL_NONCE_LIFETIME_SECS,
                        value: secs.clone(),
                    })?;
                Duration::from_secs(parsed)
            }
            None => Duration::from_secs(DEFAULT_NONCE_LIFETIME_SECS),
        };

        let menu_priority = match non_empty_var(KEEL_MENU_PRIORITY) {
            Some(value) => value
                .parse::<i32>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: KEEL_MENU_PRIORITY,
                    value: value.clone(),
                })?,
            None => DEFAULT_MENU_PRIORITY,
        };

        debug!(
            host = %host,
            port = port,
            option_name = %option_name,
            admin_configured = admin_token_hash.is_some(),
            "Loaded configuration from environment"
        );

        Ok(Config {
            host,
            port,
            backend,
            option_name,
            defaults_path,
            admin_token_hash,
            nonce_secret,
            nonce_lifetime,
            menu_priority,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_token_hash(hash: &str) -> Result<String, ConfigError> {
    if hash.len() == 64 && hash.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(hash.to_ascii_lowercase())
    } else {
        Err(ConfigError::InvalidTokenHash)
    }
}
