//! Application configuration loaded from environment variables.
//!
//! The loaded [`Config`] is handed to the store and the run engine at
//! construction; nothing in the crate reads settings from ambient state.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

/// Development default values.
pub mod defaults {
    pub const DEV_HOST: &str = "127.0.0.1";
    pub const DEV_PORT: u16 = 8080;
    pub const DEV_DATA_DIR: &str = "./data";
    pub const DEV_OWNER_ID: &str = "user-1";
    pub const REMOTE_TIMEOUT_SECS: u64 = 10;
    pub const COMPLETION_RETRIES: u32 = 3;
    pub const COMPLETION_BACKOFF_MS: u64 = 200;
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse environment from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    /// Check if this is a development environment.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Check if this is a production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Remote table store (PostgREST / Supabase) settings.
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Anon/service key sent as `apikey` and bearer token
    pub key: SecretString,
    /// Per-request timeout
    pub timeout: Duration,
}

/// Credentials for the failure-analysis capability.
///
/// Only presence matters; the keys are never validated.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSettings {
    pub gemini_key: Option<SecretString>,
    pub openai_key: Option<SecretString>,
}

impl AnalysisSettings {
    /// Whether any analysis credential is present.
    pub fn is_configured(&self) -> bool {
        [&self.gemini_key, &self.openai_key]
            .iter()
            .any(|key| key.as_ref().is_some_and(|k| !k.expose_secret().trim().is_empty()))
    }
}

/// Retry policy for the run completion write.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one (minimum 1)
    pub attempts: u32,
    /// Delay before the second attempt; doubles afterwards
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Backoff to sleep after the given failed attempt (1-based).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: defaults::COMPLETION_RETRIES,
            initial_backoff: Duration::from_millis(defaults::COMPLETION_BACKOFF_MS),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Runtime environment
    pub environment: Environment,
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Directory holding the local collection files
    pub data_dir: PathBuf,
    /// User id stamped on newly created projects
    pub owner_id: String,
    /// Remote table store, when configured
    pub remote: Option<RemoteSettings>,
    /// Failure-analysis credentials
    pub analysis: AnalysisSettings,
    /// Completion write retry policy
    pub completion_retry: RetryPolicy,
    /// Directory for static dashboard assets
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RUST_ENV`: Environment (development/production) - REQUIRED
    /// - `DECK_HOST`: Server host (default: 127.0.0.1)
    /// - `DECK_PORT`: Server port (default: 8080)
    /// - `DECK_DATA_DIR`: Local collection directory (default: ./data)
    /// - `DECK_OWNER_ID`: Owner stamped on new projects (default: user-1)
    /// - `DECK_REMOTE_URL` / `DECK_REMOTE_KEY`: Remote table store (both or neither)
    /// - `DECK_REMOTE_TIMEOUT_SECS`: Remote request timeout (default: 10)
    /// - `DECK_GEMINI_API_KEY` / `DECK_OPENAI_API_KEY`: Failure analysis credentials
    /// - `DECK_COMPLETION_RETRIES`: Completion write attempts (default: 3)
    /// - `DECK_STATIC_DIR`: Static dashboard assets
    ///
    /// In production a remote store is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_str = env::var("RUST_ENV").map_err(|_| ConfigError::MissingEnvVar("RUST_ENV"))?;

        let environment = Environment::parse(&env_str).ok_or(ConfigError::InvalidValue(
            "RUST_ENV must be 'development' or 'production'",
        ))?;

        let host = env::var("DECK_HOST").unwrap_or_else(|_| defaults::DEV_HOST.to_string());

        let port = env::var("DECK_PORT")
            .unwrap_or_else(|_| defaults::DEV_PORT.to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidValue("DECK_PORT must be a valid port number"))?;

        let data_dir = PathBuf::from(
            env::var("DECK_DATA_DIR").unwrap_or_else(|_| defaults::DEV_DATA_DIR.to_string()),
        );

        let owner_id =
            non_empty_var("DECK_OWNER_ID").unwrap_or_else(|| defaults::DEV_OWNER_ID.to_string());

        let timeout_secs = env::var("DECK_REMOTE_TIMEOUT_SECS")
            .unwrap_or_else(|_| defaults::REMOTE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue("DECK_REMOTE_TIMEOUT_SECS must be a valid number")
            })?;

        let remote = remote_settings(
            non_empty_var("DECK_REMOTE_URL"),
            non_empty_var("DECK_REMOTE_KEY"),
            Duration::from_secs(timeout_secs),
        )?;

        let analysis = AnalysisSettings {
            gemini_key: non_empty_var("DECK_GEMINI_API_KEY").map(SecretString::from),
            openai_key: non_empty_var("DECK_OPENAI_API_KEY").map(SecretString::from),
        };

        let attempts = env::var("DECK_COMPLETION_RETRIES")
            .unwrap_or_else(|_| defaults::COMPLETION_RETRIES.to_string())
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidValue("DECK_COMPLETION_RETRIES must be a valid number"))?;

        let completion_retry = RetryPolicy {
            attempts: attempts.max(1),
            ..RetryPolicy::default()
        };

        let static_dir = env::var("DECK_STATIC_DIR").ok().map(PathBuf::from);

        let config = Config {
            environment,
            host,
            port,
            data_dir,
            owner_id,
            remote,
            analysis,
            completion_retry,
            static_dir,
        };

        if environment.is_production() {
            config.validate_production()?;
        }

        Ok(config)
    }

    /// A development configuration rooted at `data_dir`, with no remote store.
    pub fn local_only(data_dir: impl Into<PathBuf>) -> Self {
        Config {
            environment: Environment::Development,
            host: defaults::DEV_HOST.to_string(),
            port: defaults::DEV_PORT,
            data_dir: data_dir.into(),
            owner_id: defaults::DEV_OWNER_ID.to_string(),
            remote: None,
            analysis: AnalysisSettings::default(),
            completion_retry: RetryPolicy::default(),
            static_dir: None,
        }
    }

    /// Validate production-only requirements.
    fn validate_production(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.remote.is_none() {
            errors.push(
                "DECK_REMOTE_URL/DECK_REMOTE_KEY are not set. Production requires a remote store."
                    .to_string(),
            );
        }

        if self.data_dir.as_os_str().is_empty() {
            errors.push("DECK_DATA_DIR must not be empty.".to_string());
        }

        if !errors.is_empty() {
            return Err(ConfigError::ProductionValidation(errors));
        }

        Ok(())
    }

    /// Get the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        self.environment.is_development()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn remote_settings(
    url: Option<String>,
    key: Option<String>,
    timeout: Duration,
) -> Result<Option<RemoteSettings>, ConfigError> {
    match (url, key) {
        (Some(url), Some(key)) => Ok(Some(RemoteSettings {
            url,
            key: SecretString::from(key),
            timeout,
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::InvalidValue(
            "DECK_REMOTE_URL is set but DECK_REMOTE_KEY is missing",
        )),
        (None, Some(_)) => Err(ConfigError::InvalidValue(
            "DECK_REMOTE_KEY is set but DECK_REMOTE_URL is missing",
        )),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("Production configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    ProductionValidation(Vec<String>),
}
