//! Configuration types for rechat-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Largest accepted `retry.backoff_multiplier`
pub const MAX_BACKOFF_MULTIPLIER: f64 = 10.0;

/// Largest accepted `retry.max_delay`
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60 * 60);

/// Remote comments API settings
///
/// The endpoint speaks a GraphQL dialect with persisted queries: the request carries
/// an operation name and the hash of a query the server already knows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// GraphQL endpoint (default: "https://gql.twitch.tv/gql")
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Value of the `Client-ID` request header
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Persisted operation name (default: "VideoCommentsByOffsetOrCursor")
    #[serde(default = "default_operation_name")]
    pub operation_name: String,

    /// SHA-256 hash identifying the persisted comments query
    #[serde(default = "default_persisted_query_hash")]
    pub persisted_query_hash: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            client_id: default_client_id(),
            operation_name: default_operation_name(),
            persisted_query_hash: default_persisted_query_hash(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Retry configuration for page requests
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A policy that gives up on the first failure
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }
}

/// Transcript rendering defaults (overridable per call)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Prefix user names with role badges (default: false)
    #[serde(default)]
    pub show_badges: bool,

    /// Render the `.fff` millisecond suffix on timestamps (default: true)
    #[serde(default = "default_true")]
    pub include_milliseconds: bool,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            show_badges: false,
            include_milliseconds: true,
        }
    }
}

/// Main configuration
///
/// Every field has a default, so `{}` is a complete configuration file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Page request retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Transcript defaults
    #[serde(default)]
    pub transcript: TranscriptConfig,
}

impl Config {
    /// Load configuration from a JSON file and validate it
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| Error::Config {
            message: format!("cannot parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot produce a working client
    pub fn validate(&self) -> Result<()> {
        let endpoint = url::Url::parse(&self.api.endpoint).map_err(|e| Error::Config {
            message: format!("invalid endpoint URL '{}': {}", self.api.endpoint, e),
            key: Some("api.endpoint".into()),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::Config {
                message: format!("unsupported endpoint scheme '{}'", endpoint.scheme()),
                key: Some("api.endpoint".into()),
            });
        }
        if self.api.client_id.trim().is_empty() {
            return Err(Error::Config {
                message: "client id must not be empty".into(),
                key: Some("api.client_id".into()),
            });
        }
        if self.api.persisted_query_hash.trim().is_empty() {
            return Err(Error::Config {
                message: "persisted query hash must not be empty".into(),
                key: Some("api.persisted_query_hash".into()),
            });
        }
        if self.api.timeout.is_zero() {
            return Err(Error::Config {
                message: "timeout must be at least one second".into(),
                key: Some("api.timeout".into()),
            });
        }
        let multiplier = self.retry.backoff_multiplier;
        if !(1.0..=MAX_BACKOFF_MULTIPLIER).contains(&multiplier) {
            return Err(Error::Config {
                message: format!(
                    "backoff multiplier must be between 1.0 and {}, got {}",
                    MAX_BACKOFF_MULTIPLIER, multiplier
                ),
                key: Some("retry.backoff_multiplier".into()),
            });
        }
        if self.retry.max_delay > MAX_RETRY_DELAY {
            return Err(Error::Config {
                message: format!(
                    "max delay must not exceed {} seconds",
                    MAX_RETRY_DELAY.as_secs()
                ),
                key: Some("retry.max_delay".into()),
            });
        }
        if self.retry.initial_delay > self.retry.max_delay {
            return Err(Error::Config {
                message: "initial delay must not exceed max delay".into(),
                key: Some("retry.initial_delay".into()),
            });
        }
        Ok(())
    }
}

fn default_endpoint() -> String {
    "https://gql.twitch.tv/gql".into()
}

fn default_client_id() -> String {
    "kd1unb4b3q4t58fwlpcbzcbnm76a8fp".into()
}

fn default_operation_name() -> String {
    "VideoCommentsByOffsetOrCursor".into()
}

fn default_persisted_query_hash() -> String {
    "b70a3591ff0f4e0313d126c6a1502d79a1c02baebb288227c582044aa76adf6a".into()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("rechat-dl/", env!("CARGO_PKG_VERSION")).into()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
