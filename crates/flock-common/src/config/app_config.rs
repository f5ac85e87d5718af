//! Application configuration structs
//!
//! Loads configuration from environment variables (with .env support).

use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub database: DatabaseConfig,
    pub transport: TransportConfig,
    pub storage: StorageConfig,
    pub engine: EngineConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Outbound SMS provider configuration.
///
/// When `account_sid`/`auth_token` are absent the server runs in test mode
/// and logs outbound messages instead of sending them.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub account_sid: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub from_number: String,
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
}

impl TransportConfig {
    /// Credentials present and usable for real sends
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.account_sid.is_some() && self.auth_token.is_some() && !self.from_number.is_empty()
    }
}

/// Attachment media storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default = "default_max_file_size")]
    pub max_file_size_mb: u32,
}

/// Engine tuning knobs: fan-out pool, retries, resolver window, digest timing
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Concurrent outbound sends, independent of roster size
    #[serde(default = "default_fanout_workers")]
    pub fanout_workers: usize,
    /// Per-recipient overall timeout in seconds
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
    /// Attempts per recipient before recording `failed`
    #[serde(default = "default_max_send_attempts")]
    pub max_send_attempts: u32,
    /// Lookback window for reaction target resolution, hours
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: i64,
    /// Silence interval before a pause digest fires, minutes
    #[serde(default = "default_pause_digest_minutes")]
    pub pause_digest_minutes: u64,
    /// How far back a pause digest collects reactions, hours
    #[serde(default = "default_digest_window_hours")]
    pub digest_window_hours: i64,
    /// Local wall-clock hour (0-23) of the daily digest
    #[serde(default = "default_daily_digest_hour")]
    pub daily_digest_hour: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fanout_workers: default_fanout_workers(),
            send_timeout_secs: default_send_timeout_secs(),
            max_send_attempts: default_max_send_attempts(),
            lookback_hours: default_lookback_hours(),
            pause_digest_minutes: default_pause_digest_minutes(),
            digest_window_hours: default_digest_window_hours(),
            daily_digest_hour: default_daily_digest_hour(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "flock".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_provider_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_upload_dir() -> String {
    "./media".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080/media".to_string()
}

fn default_max_file_size() -> u32 {
    5
}

fn default_fanout_workers() -> usize {
    10
}

fn default_send_timeout_secs() -> u64 {
    30
}

fn default_max_send_attempts() -> u32 {
    3
}

fn default_lookback_hours() -> i64 {
    24
}

fn default_pause_digest_minutes() -> u64 {
    30
}

fn default_digest_window_hours() -> i64 {
    2
}

fn default_daily_digest_hour() -> u32 {
    20
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            api: ServerConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| default_host()),
                port: env::var("API_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_port),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_max_connections),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_min_connections),
            },
            transport: TransportConfig {
                account_sid: env::var("TWILIO_ACCOUNT_SID").ok().filter(|s| !s.is_empty()),
                auth_token: env::var("TWILIO_AUTH_TOKEN").ok().filter(|s| !s.is_empty()),
                from_number: env::var("TWILIO_PHONE_NUMBER").unwrap_or_default(),
                base_url: env::var("TWILIO_BASE_URL")
                    .unwrap_or_else(|_| default_provider_base_url()),
            },
            storage: StorageConfig {
                upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| default_upload_dir()),
                public_base_url: env::var("PUBLIC_MEDIA_URL")
                    .unwrap_or_else(|_| default_public_base_url()),
                max_file_size_mb: env::var("MAX_FILE_SIZE_MB")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_max_file_size),
            },
            engine: EngineConfig {
                fanout_workers: env::var("FANOUT_WORKERS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_fanout_workers),
                send_timeout_secs: env::var("SEND_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_send_timeout_secs),
                max_send_attempts: env::var("MAX_SEND_ATTEMPTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_max_send_attempts),
                lookback_hours: env::var("REACTION_LOOKBACK_HOURS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_lookback_hours),
                pause_digest_minutes: env::var("PAUSE_DIGEST_MINUTES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_pause_digest_minutes),
                digest_window_hours: env::var("DIGEST_WINDOW_HOURS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_digest_window_hours),
                daily_digest_hour: env::var("DAILY_DIGEST_HOUR")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|h| *h < 24)
                    .unwrap_or_else(default_daily_digest_hour),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
