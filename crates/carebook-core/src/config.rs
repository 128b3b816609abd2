//! Carebook Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Secret used when `JWT_SECRET` is not set. Never acceptable in production.
pub const DEVELOPMENT_JWT_SECRET: &str = "development-secret-key-change-in-production";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database connection
    pub database: DatabaseConfig,

    /// Token signing and password hashing
    pub auth: AuthConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from defaults plus environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load configuration from an optional TOML file, then the environment
    ///
    /// Validation runs once, on the merged result.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match config_file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_env_override()
    }

    /// Parse a TOML file; missing keys take their defaults
    ///
    /// The result is not validated on its own, since environment overrides
    /// may still apply.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply every variable `lookup` yields over the current values, then
    /// validate the merged configuration
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            self.server.port = parse_var("API_PORT", port)?;
        }
        if let Some(secs) = lookup("API_REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs = parse_var("API_REQUEST_TIMEOUT_SECS", secs)?;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // PostgreSQL
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(size) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_var("DATABASE_MAX_CONNECTIONS", size)?;
        }
        if let Some(run) = lookup("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = parse_var("DATABASE_RUN_MIGRATIONS", run)?;
        }

        // Auth
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(issuer) = lookup("JWT_ISSUER") {
            self.auth.jwt_issuer = issuer;
        }
        if let Some(secs) = lookup("JWT_ACCESS_EXPIRATION_SECS") {
            self.auth.access_token_ttl_secs = parse_var("JWT_ACCESS_EXPIRATION_SECS", secs)?;
        }
        if let Some(secs) = lookup("JWT_REFRESH_EXPIRATION_SECS") {
            self.auth.refresh_token_ttl_secs = parse_var("JWT_REFRESH_EXPIRATION_SECS", secs)?;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("LOG_JSON") {
            self.logging.json_format = parse_var("LOG_JSON", json)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject configurations that cannot work at runtime
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        if self.auth.access_token_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "JWT_ACCESS_EXPIRATION_SECS".to_string(),
                value: "0".to_string(),
            });
        }
        if self.auth.refresh_token_ttl_secs <= self.auth.access_token_ttl_secs {
            return Err(ConfigError::InvalidValue {
                key: "JWT_REFRESH_EXPIRATION_SECS".to_string(),
                value: self.auth.refresh_token_ttl_secs.to_string(),
            });
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Allowed origins for CORS
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            // Empty by default - set via CORS_ORIGINS env var
            cors_origins: vec![],
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; empty selects the in-memory stores
    pub url: String,

    /// Connection pool size
    pub max_connections: u32,

    /// Apply embedded migrations on startup
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Token signing and password hashing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens
    pub jwt_secret: String,

    /// Value of the `iss` claim
    pub jwt_issuer: String,

    /// Access token lifetime in seconds
    pub access_token_ttl_secs: u64,

    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_secs: u64,

    /// Argon2 memory cost in KiB
    pub password_memory_cost: u32,

    /// Argon2 iterations
    pub password_time_cost: u32,

    /// Argon2 lanes
    pub password_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
            jwt_issuer: "carebook-api".to_string(),
            access_token_ttl_secs: 3600,        // 1 hour
            refresh_token_ttl_secs: 7 * 86400, // 7 days
            password_memory_cost: 65536,        // 64 MB
            password_time_cost: 3,
            password_parallelism: 4,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
