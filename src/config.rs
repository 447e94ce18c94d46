//! Application configuration.
//!
//! Values are resolved in three layers: built-in defaults, then
//! `config.toml` (or the file named by `CONFIG_PATH`), then environment
//! variables (a `.env` file is loaded first if present).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Placeholder secret shipped in the defaults. Must be replaced in production.
pub const DEFAULT_SECRET: &str = "SECRET";

/// Upper bound for session and token lifetimes (ten years).
pub const MAX_LIFETIME_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("{key} must be between 1 and {max} seconds, got {value}")]
    LifetimeOutOfRange {
        key: &'static str,
        value: i128,
        max: u64,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub cookie: CookieConfig,
    pub secrets: SecretsConfig,
    pub users: UsersConfig,
}

// ==================== Server ====================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ==================== Database ====================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./test.db"),
        }
    }
}

// ==================== Session store ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Redis,
    Memory,
}

impl std::str::FromStr for SessionBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(SessionBackend::Redis),
            "memory" => Ok(SessionBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    pub redis_url: String,
    pub lifetime_seconds: u64,
    pub key_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Redis,
            redis_url: "redis://localhost:6379".to_string(),
            lifetime_seconds: 3600,
            key_prefix: "user_auth_token:".to_string(),
        }
    }
}

impl SessionConfig {
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_seconds)
    }
}

// ==================== Cookie transport ====================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    pub name: String,
    pub max_age_seconds: i64,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "auth_session".to_string(),
            max_age_seconds: 3600,
            path: "/".to_string(),
            secure: true,
            http_only: true,
        }
    }
}

// ==================== Token secrets ====================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub reset_password: String,
    pub verification: String,
    pub token_lifetime_seconds: i64,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            reset_password: DEFAULT_SECRET.to_string(),
            verification: DEFAULT_SECRET.to_string(),
            token_lifetime_seconds: 3600,
        }
    }
}

impl SecretsConfig {
    pub fn uses_placeholder(&self) -> bool {
        self.reset_password == DEFAULT_SECRET || self.verification == DEFAULT_SECRET
    }
}

// ==================== User policy ====================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UsersConfig {
    pub min_password_length: usize,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            min_password_length: 1,
        }
    }
}

/// Load configuration: defaults < config file < environment.
pub fn load() -> Result<AppConfig, ConfigError> {
    let _ = dotenvy::dotenv();

    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let mut config = load_file(Path::new(&path))?;
    apply_env(&mut config, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

impl AppConfig {
    /// Reject lifetimes that are zero, negative or too large to schedule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_lifetime("session.lifetime_seconds", i128::from(self.session.lifetime_seconds))?;
        check_lifetime(
            "secrets.token_lifetime_seconds",
            i128::from(self.secrets.token_lifetime_seconds),
        )
    }
}

fn check_lifetime(key: &'static str, value: i128) -> Result<(), ConfigError> {
    if value < 1 || value > i128::from(MAX_LIFETIME_SECONDS) {
        return Err(ConfigError::LifetimeOutOfRange {
            key,
            value,
            max: MAX_LIFETIME_SECONDS,
        });
    }
    Ok(())
}

/// Parse a config file, falling back to defaults when it does not exist.
pub fn load_file(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("HOST") {
        config.server.host = host;
    }
    if let Some(port) = lookup("PORT") {
        config.server.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
            key: "PORT",
            value: port,
        })?;
    }
    if let Some(path) = lookup("DATABASE_PATH") {
        config.database.path = PathBuf::from(path);
    }
    if let Some(url) = lookup("REDIS_URL") {
        config.session.redis_url = url;
    }
    if let Some(backend) = lookup("SESSION_BACKEND") {
        config.session.backend = backend.parse().map_err(|_| ConfigError::InvalidEnv {
            key: "SESSION_BACKEND",
            value: backend,
        })?;
    }
    if let Some(secret) = lookup("RESET_PASSWORD_SECRET") {
        config.secrets.reset_password = secret;
    }
    if let Some(secret) = lookup("VERIFICATION_SECRET") {
        config.secrets.verification = secret;
    }
    if let Some(secure) = lookup("COOKIE_SECURE") {
        config.cookie.secure = secure.parse().map_err(|_| ConfigError::InvalidEnv {
            key: "COOKIE_SECURE",
            value: secure,
        })?;
    }
    Ok(())
}
