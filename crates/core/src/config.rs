//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable request tracing.
    #[serde(default)]
    pub enable_tracing: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            enable_tracing: false,
        }
    }
}

/// Gateway resolution configuration.
///
/// `endpoints` is an ordered list: earlier entries are preferred whenever
/// they succeed, and every resolution walks the list from the head. The
/// order is the whole tie-break policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Ordered gateway base URLs, each ending at the content-path root
    /// (e.g., "https://ipfs.io/ipfs/").
    #[serde(default = "default_gateway_endpoints")]
    pub endpoints: Vec<String>,
    /// Wall-clock budget per gateway attempt, in seconds.
    #[serde(default = "default_gateway_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Minimum spacing between outbound resolution calls, in milliseconds.
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,
    /// Maximum attempts per gateway before falling through.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// Base backoff delay, in milliseconds; attempt n waits base × 2^n.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

fn default_gateway_endpoints() -> Vec<String> {
    vec![
        "https://ipfs.io/ipfs/".to_string(),
        "https://cloudflare-ipfs.com/ipfs/".to_string(),
        "https://gateway.pinata.cloud/ipfs/".to_string(),
        "https://dweb.link/ipfs/".to_string(),
    ]
}

fn default_gateway_timeout_secs() -> u64 {
    8
}

fn default_min_request_interval_ms() -> u64 {
    200
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    250
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoints: default_gateway_endpoints(),
            request_timeout_secs: default_gateway_timeout_secs(),
            min_request_interval_ms: default_min_request_interval_ms(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

impl GatewayConfig {
    /// Per-attempt request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Minimum request spacing as a Duration.
    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    /// Base retry backoff as a Duration.
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Validate gateway configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoints.is_empty() {
            return Err("gateway.endpoints cannot be empty".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("gateway.request_timeout_secs cannot be 0".to_string());
        }
        if self.retry_max_attempts == 0 {
            return Err("gateway.retry_max_attempts cannot be 0".to_string());
        }
        Ok(())
    }
}

/// Fetch batching configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Token count of the first synchronous fill for a cold collection.
    #[serde(default = "default_initial_batch")]
    pub initial_batch: u64,
    /// Token count of one background round.
    #[serde(default = "default_background_batch")]
    pub background_batch: u64,
    /// Ids per chunk within a round.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
    /// Maximum chunks in flight at once.
    #[serde(default = "default_max_concurrent_chunks")]
    pub max_concurrent_chunks: usize,
    /// Default page size.
    #[serde(default = "default_display_limit")]
    pub display_limit: u64,
    /// Pause between background ranges, in milliseconds.
    #[serde(default = "default_range_delay_ms")]
    pub range_delay_ms: u64,
}

fn default_initial_batch() -> u64 {
    24
}

fn default_background_batch() -> u64 {
    48
}

fn default_chunk_size() -> u64 {
    20
}

fn default_max_concurrent_chunks() -> usize {
    5
}

fn default_display_limit() -> u64 {
    24
}

fn default_range_delay_ms() -> u64 {
    500
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            initial_batch: default_initial_batch(),
            background_batch: default_background_batch(),
            chunk_size: default_chunk_size(),
            max_concurrent_chunks: default_max_concurrent_chunks(),
            display_limit: default_display_limit(),
            range_delay_ms: default_range_delay_ms(),
        }
    }
}

impl FetchConfig {
    /// Inter-range pause as a Duration.
    pub fn range_delay(&self) -> Duration {
        Duration::from_millis(self.range_delay_ms)
    }

    /// Validate fetch configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_batch == 0 {
            return Err("fetch.initial_batch cannot be 0".to_string());
        }
        if self.background_batch == 0 {
            return Err("fetch.background_batch cannot be 0".to_string());
        }
        if self.chunk_size == 0 {
            return Err("fetch.chunk_size cannot be 0".to_string());
        }
        if self.max_concurrent_chunks == 0 {
            return Err("fetch.max_concurrent_chunks cannot be 0".to_string());
        }
        if self.display_limit == 0 {
            return Err("fetch.display_limit cannot be 0".to_string());
        }
        Ok(())
    }
}

/// Collection cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// SQLite database file path.
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    /// Retention window in seconds; entries older than this are treated as
    /// absent by readers (default ≈ 1 year).
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./data/vitrine.db")
}

fn default_retention_secs() -> u64 {
    31_536_000 // 365 days
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            retention_secs: default_retention_secs(),
        }
    }
}

impl CacheConfig {
    /// Retention window as a Duration.
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Validate cache configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        if self.retention_secs == 0 {
            return Err("cache.retention_secs cannot be 0".to_string());
        }
        Ok(())
    }
}

/// Upstream collection-service configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the collection-metadata service.
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_upstream_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_upstream_base_url() -> String {
    "http://127.0.0.1:9090".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    10
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            request_timeout_secs: default_upstream_timeout_secs(),
        }
    }
}

impl UpstreamConfig {
    /// Request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Gateway resolution configuration.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Fetch batching configuration.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Collection cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Upstream collection-service configuration.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl AppConfig {
    /// Validate the whole configuration, failing fast on the first error.
    pub fn validate(&self) -> Result<(), String> {
        self.gateway.validate()?;
        self.fetch.validate()?;
        self.cache.validate()?;
        Ok(())
    }

    /// Create a test configuration with sensible defaults.
    ///
    /// **For testing only.** Uses a relative SQLite path; tests normally
    /// override `cache.path` with a tempdir.
    pub fn for_testing() -> Self {
        Self::default()
    }
}
