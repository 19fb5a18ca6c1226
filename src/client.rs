use crate::error::{ClientError, Result};
use jsonwebtoken::Algorithm;
use reqwest::blocking::{Client, ClientBuilder};
use std::fmt;
use std::time::Duration;

/// Default lifetime of a signed request token
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60);
/// Default time-to-live of cached GET responses
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(120);
/// Default interval between cache sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Create the HTTP transport for device server requests
pub fn create_transport(config: &Config) -> Result<Client> {
    // reqwest's blocking client applies a 30s default unless given an explicit value
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(config.timeout)
        .danger_accept_invalid_certs(config.skip_tls_verify)
        .build()
        .map_err(|e| ClientError::Config(format!("failed to create HTTP transport: {}", e)))
}

/// Configuration for the device server client
#[derive(Clone)]
pub struct Config {
    /// Entry point URL of the device server
    pub base_url: String,
    /// Pre-shared key used to sign request tokens
    pub psk: String,
    /// Signing algorithm, must be an HMAC variant
    pub algorithm: Algorithm,
    /// Organization asserted in every request token
    pub org_id: i64,
    /// How long each request token stays valid
    pub token_lifetime: Duration,
    /// Accept invalid TLS certificates
    pub skip_tls_verify: bool,
    /// Time-to-live of cached GET responses
    pub cache_ttl: Duration,
    /// Interval between background cache sweeps
    pub sweep_interval: Duration,
    /// Serve fresh cached GET responses without hitting the network
    pub read_through_cache: bool,
    /// Default deadline for each request, `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl Config {
    /// Create a new configuration for the given entry point and key
    pub fn new(base_url: impl Into<String>, psk: impl Into<String>) -> Self {
        Config {
            base_url: base_url.into(),
            psk: psk.into(),
            algorithm: Algorithm::HS256,
            org_id: 0,
            token_lifetime: DEFAULT_TOKEN_LIFETIME,
            skip_tls_verify: false,
            cache_ttl: DEFAULT_CACHE_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            read_through_cache: false,
            timeout: None,
        }
    }

    /// Set the signing algorithm
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the organization id asserted in request tokens
    pub fn with_org_id(mut self, org_id: i64) -> Self {
        self.org_id = org_id;
        self
    }

    /// Set the request token lifetime
    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    /// Skip TLS certificate verification
    pub fn with_skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }

    /// Set the cache time-to-live and sweep interval
    pub fn with_cache(mut self, ttl: Duration, sweep_interval: Duration) -> Self {
        self.cache_ttl = ttl;
        self.sweep_interval = sweep_interval;
        self
    }

    /// Enable or disable read-through caching of GET responses
    pub fn with_read_through_cache(mut self, enabled: bool) -> Self {
        self.read_through_cache = enabled;
        self
    }

    /// Set the default per-request deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// The key never shows up in logs
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("psk", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("org_id", &self.org_id)
            .field("token_lifetime", &self.token_lifetime)
            .field("skip_tls_verify", &self.skip_tls_verify)
            .field("cache_ttl", &self.cache_ttl)
            .field("sweep_interval", &self.sweep_interval)
            .field("read_through_cache", &self.read_through_cache)
            .field("timeout", &self.timeout)
            .finish()
    }
}
