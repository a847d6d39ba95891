//! Client configuration
//!
//! Everything a [`crate::Client`] needs besides its session: where to send
//! requests, how hard to retry, how to pace multi-page walks and which
//! GraphQL query hashes to use. Loadable from YAML; every field has a
//! default.

use crate::endpoints::{QueryHashes, DEFAULT_BASE_URL};
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::pacing::{PagingDelay, WalkBudget};
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

// ============================================================================
// Top-Level Client Config
// ============================================================================

/// Complete client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Site root for all requests
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User agent sent with every request
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Multi-page walk pacing
    #[serde(default)]
    pub paging: PagingConfig,

    /// GraphQL query hashes
    #[serde(default)]
    pub query_hashes: QueryHashes,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: None,
            http: HttpConfig::default(),
            paging: PagingConfig::default(),
            query_hashes: QueryHashes::default(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

// ============================================================================
// HTTP Config
// ============================================================================

/// Transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum number of retries on connect errors, timeouts, 429 and 5xx
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff
    #[serde(default)]
    pub retry_backoff: BackoffConfig,

    /// Token-bucket request ceiling; `null` disables it
    #[serde(default = "default_rate_limit")]
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            retry_backoff: BackoffConfig::default(),
            rate_limit: default_rate_limit(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

#[allow(clippy::unnecessary_wraps)]
fn default_rate_limit() -> Option<RateLimiterConfig> {
    Some(RateLimiterConfig::default())
}

/// Backoff configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    500
}

fn default_max_ms() -> u64 {
    30_000
}

// ============================================================================
// Paging Config
// ============================================================================

/// Pacing of multi-page walks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Minimum pause between pages in milliseconds
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Maximum pause between pages in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Time limit per walk in seconds; `null` removes the limit
    #[serde(default = "default_time_limit")]
    pub time_limit_seconds: Option<u64>,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            time_limit_seconds: default_time_limit(),
        }
    }
}

fn default_min_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    3_000
}

#[allow(clippy::unnecessary_wraps)]
fn default_time_limit() -> Option<u64> {
    Some(1_800)
}

// ============================================================================
// Loading, validation and conversion
// ============================================================================

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse client YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_config("base_url", e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::invalid_config(
                "base_url",
                format!("scheme '{}' is not http(s)", base.scheme()),
            ));
        }

        if self.http.timeout_seconds == 0 {
            return Err(Error::invalid_config(
                "http.timeout_seconds",
                "must be greater than zero",
            ));
        }

        if self.http.retry_backoff.initial_ms > self.http.retry_backoff.max_ms {
            return Err(Error::invalid_config(
                "http.retry_backoff",
                "initial_ms must not exceed max_ms",
            ));
        }

        if let Some(rate) = &self.http.rate_limit {
            if rate.requests_per_second == 0 {
                return Err(Error::invalid_config(
                    "http.rate_limit.requests_per_second",
                    "must be greater than zero",
                ));
            }
        }

        if self.paging.min_delay_ms > self.paging.max_delay_ms {
            return Err(Error::invalid_config(
                "paging",
                "min_delay_ms must not exceed max_delay_ms",
            ));
        }

        Ok(())
    }

    /// Transport settings for [`crate::http::HttpClient`]
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.http.timeout_seconds))
            .max_retries(self.http.max_retries)
            .backoff(
                self.http.retry_backoff.backoff_type,
                Duration::from_millis(self.http.retry_backoff.initial_ms),
                Duration::from_millis(self.http.retry_backoff.max_ms),
            );
        builder = match self.http.rate_limit {
            Some(rate) => builder.rate_limit(rate),
            None => builder.no_rate_limit(),
        };
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder.build()
    }

    /// Inter-page delay range
    pub fn paging_delay(&self) -> PagingDelay {
        PagingDelay::new(
            Duration::from_millis(self.paging.min_delay_ms),
            Duration::from_millis(self.paging.max_delay_ms),
        )
    }

    /// Walk budget bound to `cancel`
    pub fn walk_budget(&self, cancel: CancellationToken) -> WalkBudget {
        WalkBudget::new(
            self.paging.time_limit_seconds.map(Duration::from_secs),
            cancel,
        )
    }
}

/// Builder for client config
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the site root
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(agent.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.http.timeout_seconds = timeout.as_secs();
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.http.max_retries = retries;
        self
    }

    /// Set the retry backoff
    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.http.retry_backoff = BackoffConfig {
            backoff_type,
            initial_ms: duration_ms(initial),
            max_ms: duration_ms(max),
        };
        self
    }

    /// Set the request ceiling
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.http.rate_limit = Some(config);
        self
    }

    /// Disable the request ceiling
    pub fn no_rate_limit(mut self) -> Self {
        self.config.http.rate_limit = None;
        self
    }

    /// Set the inter-page delay range
    pub fn paging_delay(mut self, min: Duration, max: Duration) -> Self {
        self.config.paging.min_delay_ms = duration_ms(min);
        self.config.paging.max_delay_ms = duration_ms(max);
        self
    }

    /// Set or remove the per-walk time limit
    pub fn time_limit(mut self, limit: Option<Duration>) -> Self {
        self.config.paging.time_limit_seconds = limit.map(|d| d.as_secs());
        self
    }

    /// Override the GraphQL query hashes
    pub fn query_hashes(mut self, hashes: QueryHashes) -> Self {
        self.config.query_hashes = hashes;
        self
    }

    /// Validate and build the config
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://www.instagram.com");
        assert_eq!(config.http.timeout_seconds, 30);
        assert_eq!(config.paging.min_delay_ms, 1_000);
        assert_eq!(config.paging.max_delay_ms, 3_000);
        assert_eq!(config.paging.time_limit_seconds, Some(1_800));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
base_url: "http://localhost:9000"
user_agent: "Mozilla/5.0"
http:
  max_retries: 1
  rate_limit:
    requests_per_second: 5
paging:
  min_delay_ms: 0
  max_delay_ms: 0
  time_limit_seconds: null
query_hashes:
  followers: "abc"
"#;

        let config = ClientConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(config.http.max_retries, 1);
        assert_eq!(config.http.timeout_seconds, 30);
        assert_eq!(
            config.http.rate_limit,
            Some(RateLimiterConfig::new(5, RateLimiterConfig::default().burst_size))
        );
        assert_eq!(config.paging.time_limit_seconds, None);
        assert_eq!(config.query_hashes.followers, "abc");
        assert_eq!(
            config.query_hashes.following,
            QueryHashes::default().following
        );
        assert_eq!(config.paging_delay(), PagingDelay::none());
    }

    #[test]
    fn test_rate_limit_can_be_disabled() {
        let config = ClientConfig::from_yaml_str("http:\n  rate_limit: null\n").unwrap();
        assert!(config.http.rate_limit.is_none());
        assert!(config.http_client_config().rate_limit.is_none());
    }

    #[test]
    fn test_invalid_values() {
        let err = ClientConfig::from_yaml_str("base_url: \"ftp://example.com\"").unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { ref field, .. } if field == "base_url"));

        let err = ClientConfig::from_yaml_str("http:\n  timeout_seconds: 0\n").unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));

        let err = ClientConfig::from_yaml_str("paging:\n  min_delay_ms: 5000\n").unwrap_err();
        assert!(err.to_string().contains("min_delay_ms"));

        let err = ClientConfig::from_yaml_str("http: [1, 2]").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "user_agent: \"edgewalk-test\"").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.user_agent.as_deref(), Some("edgewalk-test"));

        let missing = ClientConfig::from_file("/definitely/not/here.yaml");
        assert!(matches!(missing, Err(Error::Config { .. })));
    }

    #[test]
    fn test_builder_and_conversions() {
        let config = ClientConfig::builder()
            .base_url("http://127.0.0.1:1234")
            .user_agent("agent/1.0")
            .timeout(Duration::from_secs(5))
            .max_retries(0)
            .backoff(
                BackoffType::Constant,
                Duration::from_millis(10),
                Duration::from_millis(10),
            )
            .no_rate_limit()
            .paging_delay(Duration::from_millis(5), Duration::from_millis(10))
            .time_limit(Some(Duration::from_secs(60)))
            .build()
            .unwrap();

        let http = config.http_client_config();
        assert_eq!(http.timeout, Duration::from_secs(5));
        assert_eq!(http.max_retries, 0);
        assert_eq!(http.backoff_type, BackoffType::Constant);
        assert_eq!(http.user_agent, "agent/1.0");
        assert!(http.rate_limit.is_none());

        let delay = config.paging_delay();
        assert_eq!(delay.min, Duration::from_millis(5));
        assert_eq!(delay.max, Duration::from_millis(10));

        let budget = config.walk_budget(CancellationToken::new());
        assert_eq!(budget.time_limit, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_builder_rejects_invalid() {
        let result = ClientConfig::builder().base_url("nope").build();
        assert!(result.is_err());
    }
}
