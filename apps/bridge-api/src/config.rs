//! Application configuration loaded from environment variables.
//!
//! Fail-fast loading with validation: required variables must be present
//! and valid, or the process exits with a clear error message.

use std::env;
use thiserror::Error;

/// Configuration errors that can occur during environment loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("Failed to parse port: {0}")]
    InvalidPort(#[from] std::num::ParseIntError),
}

/// Application configuration.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection string for the cache and audit tables.
    pub database_url: String,

    /// Service-level API key the identity provider authenticates with.
    pub api_key: String,

    /// Distinguished name of the OU new users are created under.
    pub base_ou: String,

    /// Initial password set on newly created directory accounts.
    pub default_password: String,

    /// Base URL for SCIM resource locations.
    pub base_url: String,

    /// Explicit domain controller hostname (optional).
    pub ad_server: Option<String>,

    /// PowerShell executable (resolved through PATH).
    pub powershell: String,

    /// Server bind address.
    pub host: String,

    /// Server listen port.
    pub port: u16,

    /// Tracing filter directive (e.g., "info,adbridge=debug").
    pub rust_log: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[redacted]")
            .field("api_key", &"[redacted]")
            .field("base_ou", &self.base_ou)
            .field("default_password", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("ad_server", &self.ad_server)
            .field("powershell", &self.powershell)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Required Variables
    ///
    /// - `DATABASE_URL` - PostgreSQL connection string
    /// - `SCIM_API_KEY` - bearer key for the identity provider
    /// - `AD_BASE_OU` - target OU distinguished name for new users
    /// - `AD_DEFAULT_PASSWORD` - initial password for created accounts
    ///
    /// # Optional Variables
    ///
    /// - `BASE_URL` - resource location base (default: "http://localhost:8080")
    /// - `AD_SERVER` - explicit domain controller hostname
    /// - `AD_POWERSHELL` - PowerShell executable (default: "powershell.exe")
    /// - `HOST` - bind address (default: "0.0.0.0")
    /// - `PORT` - listen port (default: 8080)
    /// - `RUST_LOG` - log filter (default: "info")
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (development only)
        let _ = dotenvy::dotenv();

        let database_url = require("DATABASE_URL")?;
        let api_key = require("SCIM_API_KEY")?;
        let base_ou = require("AD_BASE_OU")?;
        let default_password = require("AD_DEFAULT_PASSWORD")?;

        let base_url = env::var("BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let ad_server = env::var("AD_SERVER").ok().filter(|s| !s.is_empty());
        let powershell =
            env::var("AD_POWERSHELL").unwrap_or_else(|_| "powershell.exe".to_string());

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()?;
        if port == 0 {
            return Err(ConfigError::InvalidValue {
                var: "PORT".to_string(),
                message: "Port must be between 1 and 65535".to_string(),
            });
        }

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            database_url,
            api_key,
            base_ou,
            default_password,
            base_url,
            ad_server,
            powershell,
            host,
            port,
            rust_log,
        })
    }

    /// The server bind address as a socket address string.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn require(var: &str) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(var.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/adbridge".to_string(),
            api_key: "key".to_string(),
            base_ou: "OU=Staff,DC=example,DC=com".to_string(),
            default_password: "hunter2".to_string(),
            base_url: "https://bridge.example.com".to_string(),
            ad_server: None,
            powershell: "powershell.exe".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8443,
            rust_log: "info".to_string(),
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingVar("SCIM_API_KEY".to_string());
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: SCIM_API_KEY"
        );
    }

    #[test]
    fn test_bind_addr() {
        let config = test_config();
        assert_eq!(config.bind_addr(), "127.0.0.1:8443");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = test_config();
        let debug = format!("{config:?}");

        assert!(!debug.contains("postgres://localhost/adbridge"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[redacted]"));
        assert!(debug.contains("OU=Staff,DC=example,DC=com"));
    }
}
