//! Configuration module for Snapaja.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, SnapajaError};

/// Web server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty means permissive (development mode).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Metadata store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file holding the key-value metadata.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/snapaja.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BlobConfig {
    /// Directory where file blobs are stored.
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// Base URL under which stored blobs are publicly reachable.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

fn default_storage_path() -> String {
    "data/blobs".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            public_base_url: default_public_base_url(),
        }
    }
}

/// Upload limits and direct-upload token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum size of a single file in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Maximum number of files per multipart request.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Maximum number of non-file fields per multipart request.
    #[serde(default = "default_max_fields")]
    pub max_fields: usize,
    /// Secret used to sign direct-upload tokens.
    #[serde(default)]
    pub token_secret: String,
    /// Validity window of a direct-upload token in seconds.
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,
}

fn default_max_file_size() -> u64 {
    1024 * 1024 * 1024 // 1 GiB per file
}

fn default_max_files() -> usize {
    100
}

fn default_max_fields() -> usize {
    100
}

fn default_token_expiry() -> u64 {
    3600
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            max_files: default_max_files(),
            max_fields: default_max_fields(),
            token_secret: String::new(),
            token_expiry_secs: default_token_expiry(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/snapaja.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Web server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Metadata store configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Blob storage configuration.
    #[serde(default)]
    pub blob: BlobConfig,
    /// Upload limits and token settings.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(SnapajaError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| SnapajaError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `SNAPAJA_TOKEN_SECRET`: Override the direct-upload token secret
    pub fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("SNAPAJA_TOKEN_SECRET") {
            if !secret.is_empty() {
                self.upload.token_secret = secret;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the direct-upload token secret is not set.
    pub fn validate(&self) -> Result<()> {
        if self.upload.token_secret.is_empty() {
            return Err(SnapajaError::Config(
                "upload.token_secret is not set. \
                 Set it in config.toml or via SNAPAJA_TOKEN_SECRET environment variable."
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert!(config.server.cors_origins.is_empty());

        assert_eq!(config.database.path, "data/snapaja.db");

        assert_eq!(config.blob.storage_path, "data/blobs");
        assert_eq!(config.blob.public_base_url, "http://localhost:3000");

        assert_eq!(config.upload.max_file_size_bytes, 1024 * 1024 * 1024);
        assert_eq!(config.upload.max_files, 100);
        assert_eq!(config.upload.max_fields, 100);
        assert_eq!(config.upload.token_expiry_secs, 3600);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/snapaja.log");
    }

    #[test]
    fn test_parse_empty() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.upload.max_files, 100);
    }

    #[test]
    fn test_parse_partial() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8080

[upload]
max_file_size_bytes = 1048576
token_secret = "secret"
"#;
        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.upload.max_file_size_bytes, 1048576);
        assert_eq!(config.upload.token_secret, "secret");
        // Untouched sections fall back to defaults
        assert_eq!(config.database.path, "data/snapaja.db");
        assert_eq!(config.upload.max_files, 100);
    }

    #[test]
    fn test_parse_invalid() {
        let result = Config::parse("server = \"not a table\"");
        assert!(matches!(result, Err(SnapajaError::Config(_))));
    }

    #[test]
    fn test_validate_requires_token_secret() {
        let config = Config::default();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.upload.token_secret = "s3cret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_override_token_secret() {
        let mut config = Config::default();
        std::env::set_var("SNAPAJA_TOKEN_SECRET", "from-env");
        config.apply_env_overrides();
        std::env::remove_var("SNAPAJA_TOKEN_SECRET");

        assert_eq!(config.upload.token_secret, "from-env");
    }
}
