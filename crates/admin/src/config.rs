//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `ADMIN_BASE_URL` - Public URL for the admin console
//!
//! ## Optional
//! - `ADMIN_HOST` - Bind address (default: 127.0.0.1)
//! - `ADMIN_PORT` - Listen port (default: 3001)
//! - `ADMIN_BACKEND` - `postgres` (default) or `memory` for a throwaway local demo
//! - `ADMIN_SESSION_TTL_HOURS` - Admin session lifetime (default: 8)
//! - `ADMIN_SESSION_CLEANUP_INTERVAL_SECS` - Janitor interval (default: 900, 0 disables)
//! - `ADMIN_OPPORTUNISTIC_CLEANUP` - Sweep expired sessions after each authorized request (default: true)
//! - `TRIAL_SESSION_TTL_HOURS` - Trial session lifetime (default: 2)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (notifications)
//! - `NOTIFY_FUNCTIONS_URL` - Base URL of the notification functions
//! - `NOTIFY_FUNCTIONS_KEY` - Bearer key for the notification functions
//!
//! ## Optional (TLS)
//! - `ADMIN_TLS_CERT` - PEM-encoded certificate chain
//! - `ADMIN_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Where admin, session and trial rows live
    pub backend: BackendConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the admin console
    pub base_url: Url,
    /// Session and janitor settings
    pub sessions: SessionConfig,
    /// Notification functions (optional - dispatch is a no-op without it)
    pub notify: Option<NotifyConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Storage backend selection.
#[derive(Clone)]
pub enum BackendConfig {
    /// `PostgreSQL` (contains password)
    Postgres { database_url: SecretString },
    /// Process-local memory; everything is lost on restart.
    Memory,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres { .. } => f
                .debug_struct("Postgres")
                .field("database_url", &"[REDACTED]")
                .finish(),
            Self::Memory => f.write_str("Memory"),
        }
    }
}

/// Session lifetimes and cleanup scheduling.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Admin session lifetime
    pub admin_ttl: chrono::Duration,
    /// Trial session lifetime (capped by the trial user's own expiry)
    pub trial_ttl: chrono::Duration,
    /// Janitor interval; `None` disables the janitor
    pub cleanup_interval: Option<Duration>,
    /// Spawn an expired-session sweep after each authorized request
    pub opportunistic_cleanup: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            admin_ttl: chrono::Duration::hours(8),
            trial_ttl: chrono::Duration::hours(2),
            cleanup_interval: Some(Duration::from_secs(900)),
            opportunistic_cleanup: true,
        }
    }
}

/// Notification functions configuration.
///
/// Implements `Debug` manually to redact the key.
#[derive(Clone)]
pub struct NotifyConfig {
    /// Base URL the `send-email` and `send-sms` functions live under
    pub functions_url: Url,
    /// Bearer key sent with every call
    pub functions_key: SecretString,
}

impl std::fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("functions_url", &self.functions_url.as_str())
            .field("functions_key", &"[REDACTED]")
            .finish()
    }
}

impl NotifyConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let url = get_optional_env("NOTIFY_FUNCTIONS_URL");
        let key = get_optional_env("NOTIFY_FUNCTIONS_KEY");

        match (url, key) {
            (Some(url), Some(key)) => {
                validate_secret_strength(&key, "NOTIFY_FUNCTIONS_KEY")?;
                Ok(Some(Self {
                    functions_url: parse_url("NOTIFY_FUNCTIONS_URL", &url)?,
                    functions_key: SecretString::from(key),
                }))
            }
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "NOTIFY_FUNCTIONS_*".to_string(),
                "Both NOTIFY_FUNCTIONS_URL and NOTIFY_FUNCTIONS_KEY must be set together"
                    .to_string(),
            )),
        }
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("ADMIN_TLS_CERT");
        let key_pem = get_optional_env("ADMIN_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "ADMIN_TLS_*".to_string(),
                "Both ADMIN_TLS_CERT and ADMIN_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl SessionConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let admin_ttl_hours: i64 = parse_env_or("ADMIN_SESSION_TTL_HOURS", 8)?;
        let trial_ttl_hours: i64 = parse_env_or("TRIAL_SESSION_TTL_HOURS", 2)?;
        let cleanup_secs: u64 = parse_env_or("ADMIN_SESSION_CLEANUP_INTERVAL_SECS", 900)?;
        let opportunistic_cleanup = parse_env_or("ADMIN_OPPORTUNISTIC_CLEANUP", true)?;

        Ok(Self {
            admin_ttl: positive_hours("ADMIN_SESSION_TTL_HOURS", admin_ttl_hours)?,
            trial_ttl: positive_hours("TRIAL_SESSION_TTL_HOURS", trial_ttl_hours)?,
            cleanup_interval: (cleanup_secs > 0).then(|| Duration::from_secs(cleanup_secs)),
            opportunistic_cleanup,
        })
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let backend = match get_env_or_default("ADMIN_BACKEND", "postgres").as_str() {
            "postgres" => BackendConfig::Postgres {
                database_url: get_database_url("ADMIN_DATABASE_URL")?,
            },
            "memory" => BackendConfig::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "ADMIN_BACKEND".to_string(),
                    format!("expected 'postgres' or 'memory', got '{other}'"),
                ));
            }
        };
        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("ADMIN_HOST".to_string(), e.to_string()))?;
        let port = parse_env_or("ADMIN_PORT", 3001_u16)?;
        let base_url = parse_url("ADMIN_BASE_URL", &get_required_env("ADMIN_BASE_URL")?)?;
        let sessions = SessionConfig::from_env()?;
        let notify = NotifyConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            backend,
            host,
            port,
            base_url,
            sessions,
            notify,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Local configuration over the in-memory backend, with defaults for everything else.
    #[must_use]
    pub fn in_memory(base_url: Url) -> Self {
        Self {
            backend: BackendConfig::Memory,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3001,
            base_url,
            sessions: SessionConfig::default(),
            notify: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            tls: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns true if cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional environment variable, falling back to `default` when unset.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| parse_value(key, &raw))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn positive_hours(key: &str, hours: i64) -> Result<chrono::Duration, ConfigError> {
    if hours <= 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be a positive number of hours (got {hours})"),
        ));
    }
    chrono::Duration::try_hours(hours).ok_or_else(|| {
        ConfigError::InvalidEnvVar(key.to_string(), format!("{hours} hours is out of range"))
    })
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
