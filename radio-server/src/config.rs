//! Client configuration and the default mirror list.

use std::time::Duration;

use crate::providers::ProviderKind;

/// User-Agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "RadioApp/1.0";

/// Timeout for steady-state calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for health probes. Probes must fail fast so startup never stalls.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(2500);

/// How long a cached read stays valid.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Entry bound for each cache instance.
pub const DEFAULT_CACHE_CAPACITY: usize = 80;

/// Public radio-browser mirrors, in preference order.
pub const DEFAULT_MIRRORS: &[(&str, &str)] = &[
    ("Radio Browser US1", "https://us1.api.radio-browser.info"),
    ("Radio Browser DE1", "https://de1.api.radio-browser.info"),
    ("Radio Browser NL1", "https://nl1.api.radio-browser.info"),
    ("Radio Browser FR1", "https://fr1.api.radio-browser.info"),
    ("Radio Browser AT1", "https://at1.api.radio-browser.info"),
    ("Radio Browser ALL", "https://all.api.radio-browser.info"),
];

/// A single mirror entry as configured at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub name: String,
    pub base_url: String,
    pub kind: ProviderKind,
    /// Lower is preferred.
    pub priority: i32,
}

impl ProviderConfig {
    /// Create a radio-browser mirror entry with priority 1.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            kind: ProviderKind::RadioBrowser,
            priority: 1,
        }
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Configuration for [`RadioClient`](crate::client::RadioClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Mirrors, in list order. The first entry is the default provider.
    pub providers: Vec<ProviderConfig>,

    /// Client-identifying header value.
    pub user_agent: String,

    /// Timeout for normal operations.
    pub request_timeout: Duration,

    /// Timeout for health probes.
    pub probe_timeout: Duration,

    /// TTL for cached reads.
    pub cache_ttl: Duration,

    /// Maximum entries per cache instance before a full clear.
    pub cache_capacity: usize,
}

impl ClientConfig {
    /// Create a config for the given mirrors with default timings.
    pub fn new(providers: Vec<ProviderConfig>) -> Self {
        Self {
            providers,
            ..Self::default()
        }
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the steady-state request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the probe timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Set the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the per-instance cache bound.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            providers: DEFAULT_MIRRORS
                .iter()
                .map(|(name, url)| ProviderConfig::new(*name, *url))
                .collect(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Parse a `name=url,name=url` mirror list. List order gives priority.
///
/// Entries without `=` use the URL as the name. Blank entries are skipped.
pub fn parse_mirror_list(raw: &str) -> Vec<ProviderConfig> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .enumerate()
        .map(|(idx, entry)| {
            let (name, url) = match entry.split_once('=') {
                Some((name, url)) => (name.trim(), url.trim()),
                None => (entry, entry),
            };
            ProviderConfig::new(name, url).with_priority(idx as i32 + 1)
        })
        .collect()
}
