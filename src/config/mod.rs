//! Configuration management
//!
//! This module handles loading and parsing configuration for quillpost.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Session lifetime and cleanup
    #[serde(default)]
    pub session: SessionConfig,
    /// Login page and post-login redirect
    #[serde(default)]
    pub auth: AuthConfig,
    /// News feed settings
    #[serde(default)]
    pub news: NewsConfig,
    /// Comment moderation
    #[serde(default)]
    pub moderation: ModerationConfig,
    /// Notebook settings
    #[serde(default)]
    pub notes: NotesConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
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
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
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
    "data/quillpost.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Days until a freshly issued session expires
    #[serde(default = "default_expiration_days")]
    pub expiration_days: i64,
    /// Interval of the background job that purges expired sessions
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiration_days: default_expiration_days(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

fn default_expiration_days() -> i64 {
    7
}

fn default_cleanup_interval_secs() -> u64 {
    300
}

/// Authentication page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Where anonymous callers are sent for protected pages
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Where a successful login lands when no `next` is given
    #[serde(default = "default_login_redirect_url")]
    pub login_redirect_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            login_redirect_url: default_login_redirect_url(),
        }
    }
}

fn default_login_url() -> String {
    "/auth/login/".to_string()
}

fn default_login_redirect_url() -> String {
    "/news/".to_string()
}

/// News feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    /// Maximum number of items shown on the home page
    #[serde(default = "default_home_page_size")]
    pub home_page_size: u32,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            home_page_size: default_home_page_size(),
        }
    }
}

fn default_home_page_size() -> u32 {
    10
}

/// Comment moderation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Substrings that reject a comment
    #[serde(default = "default_banned_words")]
    pub banned_words: Vec<String>,
    /// Message attached to the `text` field on rejection
    #[serde(default = "default_warning")]
    pub warning: String,
    /// Compare lowercased text against lowercased words
    #[serde(default)]
    pub case_insensitive: bool,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            banned_words: default_banned_words(),
            warning: default_warning(),
            case_insensitive: false,
        }
    }
}

fn default_banned_words() -> Vec<String> {
    vec!["редиска".to_string(), "негодяй".to_string()]
}

fn default_warning() -> String {
    "Не ругайтесь!".to_string()
}

/// Notebook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesConfig {
    /// Maximum slug length, derived slugs are truncated to it
    #[serde(default = "default_slug_max_length")]
    pub slug_max_length: usize,
    /// Suffix appended to a colliding slug in the field error
    #[serde(default = "default_duplicate_slug_warning")]
    pub duplicate_slug_warning: String,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            slug_max_length: default_slug_max_length(),
            duplicate_slug_warning: default_duplicate_slug_warning(),
        }
    }
}

fn default_slug_max_length() -> usize {
    100
}

fn default_duplicate_slug_warning() -> String {
    " - такой slug уже существует, придумайте уникальное значение!".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern `QUILLPOST_<SECTION>_<KEY>`:
    /// - QUILLPOST_SERVER_HOST, QUILLPOST_SERVER_PORT, QUILLPOST_SERVER_CORS_ORIGIN
    /// - QUILLPOST_DATABASE_DRIVER, QUILLPOST_DATABASE_URL
    /// - QUILLPOST_SESSION_EXPIRATION_DAYS, QUILLPOST_SESSION_CLEANUP_INTERVAL_SECS
    /// - QUILLPOST_AUTH_LOGIN_URL, QUILLPOST_AUTH_LOGIN_REDIRECT_URL
    /// - QUILLPOST_NEWS_HOME_PAGE_SIZE
    /// - QUILLPOST_MODERATION_BANNED_WORDS (comma separated)
    /// - QUILLPOST_MODERATION_WARNING, QUILLPOST_MODERATION_CASE_INSENSITIVE
    /// - QUILLPOST_NOTES_SLUG_MAX_LENGTH, QUILLPOST_NOTES_DUPLICATE_SLUG_WARNING
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values the services cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.news.home_page_size == 0 {
            return Err(ConfigError::ValidationError(
                "news.home_page_size must be at least 1".to_string(),
            ));
        }
        if self.notes.slug_max_length == 0 {
            return Err(ConfigError::ValidationError(
                "notes.slug_max_length must be at least 1".to_string(),
            ));
        }
        if self.session.expiration_days <= 0 {
            return Err(ConfigError::ValidationError(
                "session.expiration_days must be positive".to_string(),
            ));
        }
        if !self.auth.login_url.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "auth.login_url must be an absolute path".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("QUILLPOST_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("QUILLPOST_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("QUILLPOST_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }

        if let Ok(driver) = std::env::var("QUILLPOST_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("QUILLPOST_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(days) = std::env::var("QUILLPOST_SESSION_EXPIRATION_DAYS") {
            if let Ok(days) = days.parse::<i64>() {
                self.session.expiration_days = days;
            }
        }
        if let Ok(secs) = std::env::var("QUILLPOST_SESSION_CLEANUP_INTERVAL_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                self.session.cleanup_interval_secs = secs;
            }
        }

        if let Ok(login_url) = std::env::var("QUILLPOST_AUTH_LOGIN_URL") {
            self.auth.login_url = login_url;
        }
        if let Ok(url) = std::env::var("QUILLPOST_AUTH_LOGIN_REDIRECT_URL") {
            self.auth.login_redirect_url = url;
        }

        if let Ok(size) = std::env::var("QUILLPOST_NEWS_HOME_PAGE_SIZE") {
            if let Ok(size) = size.parse::<u32>() {
                self.news.home_page_size = size;
            }
        }

        if let Ok(words) = std::env::var("QUILLPOST_MODERATION_BANNED_WORDS") {
            self.moderation.banned_words = words
                .split(',')
                .map(|w| w.trim())
                .filter(|w| !w.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(warning) = std::env::var("QUILLPOST_MODERATION_WARNING") {
            self.moderation.warning = warning;
        }
        if let Ok(flag) = std::env::var("QUILLPOST_MODERATION_CASE_INSENSITIVE") {
            if let Ok(flag) = flag.parse::<bool>() {
                self.moderation.case_insensitive = flag;
            }
        }

        if let Ok(length) = std::env::var("QUILLPOST_NOTES_SLUG_MAX_LENGTH") {
            if let Ok(length) = length.parse::<usize>() {
                self.notes.slug_max_length = length;
            }
        }
        if let Ok(warning) = std::env::var("QUILLPOST_NOTES_DUPLICATE_SLUG_WARNING") {
            self.notes.duplicate_slug_warning = warning;
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared by every test that touches QUILLPOST_* variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "QUILLPOST_SERVER_HOST",
    "QUILLPOST_SERVER_PORT",
    "QUILLPOST_SERVER_CORS_ORIGIN",
    "QUILLPOST_DATABASE_DRIVER",
    "QUILLPOST_DATABASE_URL",
    "QUILLPOST_SESSION_EXPIRATION_DAYS",
    "QUILLPOST_SESSION_CLEANUP_INTERVAL_SECS",
    "QUILLPOST_AUTH_LOGIN_URL",
    "QUILLPOST_AUTH_LOGIN_REDIRECT_URL",
    "QUILLPOST_NEWS_HOME_PAGE_SIZE",
    "QUILLPOST_MODERATION_BANNED_WORDS",
    "QUILLPOST_MODERATION_WARNING",
    "QUILLPOST_MODERATION_CASE_INSENSITIVE",
    "QUILLPOST_NOTES_SLUG_MAX_LENGTH",
    "QUILLPOST_NOTES_DUPLICATE_SLUG_WARNING",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}
