//! Runtime configuration
//!
//! Settings come from an optional `config.yml`, with `DEVFEED_*` environment
//! variables taking precedence. Anything left unset falls back to defaults
//! suitable for local development.
//!
//! The token signing key is part of this file's contract: it is read once at
//! startup, handed to the token service, and never consulted again.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origin allowed by CORS
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:4200".into()
}

/// Storage backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Connection URL, or a plain file path for SQLite
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/devfeed.db".into()
}

/// Supported storage backends; SQLite is the default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    #[default]
    Sqlite,
    Mysql,
}

/// Bearer token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Symmetric signing key
    #[serde(default = "default_token_secret")]
    pub token_secret: String,
    /// Validity window in hours
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Issuer label stamped into every token
    #[serde(default = "default_token_issuer")]
    pub token_issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: default_token_secret(),
            token_ttl_hours: default_token_ttl_hours(),
            token_issuer: default_token_issuer(),
        }
    }
}

fn default_token_secret() -> String {
    // Development fallback; production must set DEVFEED_AUTH_TOKEN_SECRET
    "devfeed-insecure-dev-secret".into()
}

fn default_token_ttl_hours() -> i64 {
    24
}

fn default_token_issuer() -> String {
    "self".into()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("config file '{path}' is not valid YAML: {message}")]
    Parse { path: String, message: String },
}

impl Config {
    /// Read settings from a YAML file.
    ///
    /// A missing or blank file yields the defaults; malformed YAML is an
    /// error rather than a silent fallback.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let parsed = serde_yaml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(parsed)
    }

    /// [`load`](Self::load), then apply `DEVFEED_*` environment overrides.
    ///
    /// Recognized: `DEVFEED_SERVER_HOST`, `DEVFEED_SERVER_PORT`,
    /// `DEVFEED_SERVER_CORS_ORIGIN`, `DEVFEED_DATABASE_DRIVER`,
    /// `DEVFEED_DATABASE_URL`, `DEVFEED_AUTH_TOKEN_SECRET`,
    /// `DEVFEED_AUTH_TOKEN_TTL_HOURS`, `DEVFEED_AUTH_TOKEN_ISSUER`.
    pub fn load_with_env(path: &Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.override_from_env();
        Ok(config)
    }

    fn override_from_env(&mut self) {
        let env = |name: &str| std::env::var(name).ok();

        if let Some(host) = env("DEVFEED_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env("DEVFEED_SERVER_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(origin) = env("DEVFEED_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = origin;
        }

        // Unrecognized driver names are ignored rather than fatal
        match env("DEVFEED_DATABASE_DRIVER").as_deref().map(str::to_lowercase) {
            Some(ref d) if d == "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
            Some(ref d) if d == "mysql" => self.database.driver = DatabaseDriver::Mysql,
            _ => {}
        }
        if let Some(url) = env("DEVFEED_DATABASE_URL") {
            self.database.url = url;
        }

        if let Some(secret) = env("DEVFEED_AUTH_TOKEN_SECRET") {
            self.auth.token_secret = secret;
        }
        if let Some(ttl) = env("DEVFEED_AUTH_TOKEN_TTL_HOURS").and_then(|v| v.parse().ok()) {
            self.auth.token_ttl_hours = ttl;
        }
        if let Some(issuer) = env("DEVFEED_AUTH_TOKEN_ISSUER") {
            self.auth.token_issuer = issuer;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.driver, DatabaseDriver::Sqlite);
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert_eq!(config.auth.token_issuer, "self");
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load(Path::new("/nonexistent/config.yml")).expect("load failed");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_blank_file_yields_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "   ").expect("write failed");

        let config = Config::load(file.path()).expect("load failed");
        assert_eq!(config.database.url, "data/devfeed.db");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "server:\n  port: 9090\nauth:\n  token_secret: testing-key"
        )
        .expect("write failed");

        let config = Config::load(file.path()).expect("load failed");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.token_secret, "testing-key");
        assert_eq!(config.auth.token_ttl_hours, 24);
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "server: [unclosed").expect("write failed");

        assert!(Config::load(file.path()).is_err());
    }
}
