//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::cache::CacheOptions;
use crate::client::DEFAULT_LIMIT;
use crate::providers::Provider;
use crate::query::SearchParams;

/// Query key that skips the cache on read endpoints.
pub const NOCACHE_PARAM: &str = "nocache";

/// Raw query string of `/api/stations/search`.
///
/// Every pair except `nocache` is forwarded to the directory as a search
/// parameter.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct SearchRequest(pub Vec<(String, String)>);

impl SearchRequest {
    pub fn options(&self) -> CacheOptions {
        CacheOptions {
            bypass_cache: self
                .0
                .iter()
                .any(|(k, v)| k == NOCACHE_PARAM && is_truthy(v)),
        }
    }

    pub fn params(&self) -> SearchParams {
        self.0
            .iter()
            .filter(|(k, _)| k != NOCACHE_PARAM)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Query for list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LimitRequest {
    /// Maximum number of stations
    pub limit: Option<usize>,

    /// Skip the cache; `nocache`, `nocache=1` and `nocache=true` all count
    pub nocache: Option<String>,
}

impl LimitRequest {
    pub fn limit_or(&self, default: usize) -> usize {
        self.limit.unwrap_or(default)
    }

    pub fn options(&self) -> CacheOptions {
        CacheOptions {
            bypass_cache: self.nocache.as_deref().is_some_and(is_truthy),
        }
    }
}

/// Query for `/api/stations/top`.
#[derive(Debug, Default, Deserialize)]
pub struct TopRequest {
    pub limit: Option<usize>,

    /// BCP 47 style tag, e.g. "zh-CN"
    pub locale: Option<String>,

    pub nocache: Option<String>,
}

impl TopRequest {
    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn options(&self) -> CacheOptions {
        CacheOptions {
            bypass_cache: self.nocache.as_deref().is_some_and(is_truthy),
        }
    }
}

/// Outcome of a click or vote.
#[derive(Debug, Serialize)]
pub struct ActionResult {
    pub ok: bool,
}

/// Mirror status listing.
#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    /// Name of the current provider
    pub current: Option<String>,

    /// Whether the startup probe has completed
    pub initialized: bool,

    pub providers: Vec<Provider>,
}

/// Outcome of a manual provider switch.
#[derive(Debug, Serialize)]
pub struct SwitchResponse {
    pub provider: String,

    /// Whether the provider answered its probe
    pub healthy: bool,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn is_truthy(value: &str) -> bool {
    matches!(value, "" | "1" | "true")
}
