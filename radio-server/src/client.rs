//! Resilient radio directory client.
//!
//! [`RadioClient`] owns all process-wide state: the provider registry, the
//! dispatcher with its current-provider hint and startup gate, and one
//! cache per read family. Construct it once and share it behind an `Arc`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use radio_server::client::RadioClient;
//! use radio_server::config::ClientConfig;
//! use radio_server::query::SearchParams;
//!
//! # async fn run() -> Result<(), radio_server::error::ClientError> {
//! let client = Arc::new(RadioClient::new(ClientConfig::default())?);
//! client.start_initialization();
//!
//! let jazz = client
//!     .search_stations(&SearchParams::new().tag("jazz").limit(20))
//!     .await?;
//! println!("{} jazz stations", jazz.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::cache::{CacheOptions, TtlCache};
use crate::config::ClientConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{ClientError, Result};
use crate::models::{
    ActionResponse, ApiResponse, ApiStatus, Country, Language, ServerStats, Station, Tag,
};
use crate::providers::{Provider, ProviderRegistry};
use crate::query::{NormalizedQuery, Order, SearchParams};
use crate::recommend::{StationSearch, recommend};
use crate::transport::{HttpTransport, Request, Transport, encode_component};

/// Default number of stations for list operations.
pub const DEFAULT_LIMIT: usize = 50;

/// Default number of stations for [`RadioClient::random_local_stations`].
pub const DEFAULT_LOCAL_LIMIT: usize = 20;

/// Default number of stations for [`RadioClient::stations_by_tag`].
pub const DEFAULT_TAG_LIMIT: usize = 100;

/// Tags with this many stations or fewer are hidden from [`RadioClient::tags`].
pub const MIN_TAG_STATIONS: u64 = 10;

/// Maximum number of tags returned by [`RadioClient::tags`].
pub const MAX_TAGS: usize = 100;

const SEARCH_PATH: &str = "/json/stations/search";

/// Client for a set of mirrored radio directory servers.
pub struct RadioClient<T = HttpTransport> {
    config: ClientConfig,
    transport: Arc<T>,
    dispatcher: Dispatcher<T>,
    search_cache: TtlCache<Vec<Station>>,
    top_cache: TtlCache<ApiResponse<Vec<Station>>>,
    latest_cache: TtlCache<Vec<Station>>,
}

impl RadioClient<HttpTransport> {
    /// Create a client that talks HTTP to the configured mirrors.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.user_agent)?;
        Self::with_transport(config, Arc::new(transport))
    }
}

impl<T: Transport> RadioClient<T> {
    /// Create a client over an arbitrary transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<T>) -> Result<Self> {
        let registry = Arc::new(ProviderRegistry::new(&config.providers)?);
        let dispatcher = Dispatcher::new(Arc::clone(&transport), registry, config.probe_timeout);
        Ok(Self {
            search_cache: cache_for(&config),
            top_cache: cache_for(&config),
            latest_cache: cache_for(&config),
            config,
            transport,
            dispatcher,
        })
    }

    /// Kick off the startup probe in the background.
    pub fn start_initialization(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let client = Arc::clone(self);
        tokio::spawn(async move { client.wait_for_initialization().await })
    }

    /// Wait until the startup probe has completed.
    pub async fn wait_for_initialization(&self) {
        self.dispatcher.wait_for_initialization().await;
    }

    pub fn is_initialized(&self) -> bool {
        self.dispatcher.is_initialized()
    }

    /// Re-run the probe round and adopt the fastest healthy mirror.
    pub async fn refresh_connection(&self) {
        self.dispatcher.refresh().await;
    }

    pub fn current_provider(&self) -> Result<Provider> {
        self.dispatcher.current_provider()
    }

    /// Status of every mirror, in configuration order.
    pub fn providers(&self) -> Vec<Provider> {
        self.dispatcher.registry().all()
    }

    /// Switch to the named mirror and probe it.
    ///
    /// Returns whether the mirror answered. Unknown names are an error.
    pub async fn switch_to_provider(&self, name: &str) -> Result<bool> {
        self.dispatcher
            .switch_to(name, self.config.request_timeout)
            .await
    }

    // ========================================================================
    // Station search
    // ========================================================================

    /// Search stations.
    pub async fn search_stations(&self, params: &SearchParams) -> Result<Vec<Station>> {
        self.search_stations_with(params, CacheOptions::default())
            .await
    }

    /// Search stations with explicit cache control.
    pub async fn search_stations_with(
        &self,
        params: &SearchParams,
        options: CacheOptions,
    ) -> Result<Vec<Station>> {
        let query = params.normalize();
        let query = &query;
        self.dispatcher
            .execute(move |p| self.search_on(p, query, options))
            .await
    }

    /// Recommended stations for a user locale. See [`crate::recommend`].
    pub async fn top_stations(
        &self,
        limit: usize,
        locale: Option<&str>,
        options: CacheOptions,
    ) -> Result<ApiResponse<Vec<Station>>> {
        self.dispatcher.wait_for_initialization().await;

        let key = format!("{limit}:{}", locale.unwrap_or(""));
        if !options.bypass_cache {
            if let Some(hit) = self.top_cache.get(&key) {
                return Ok(hit);
            }
        }

        debug!(limit, locale = ?locale, "Getting top stations");
        let searcher = ClientSearch {
            client: self,
            options,
        };
        let recommendation = recommend(&searcher, limit, locale).await?;

        let response = ApiResponse::from_mirror(recommendation.stations);
        if !options.bypass_cache {
            self.top_cache.put(key, response.clone());
        }
        Ok(response)
    }

    /// Most recently checked stations. Degrades to an empty list when no
    /// mirror is reachable.
    pub async fn latest_stations(&self, limit: usize, options: CacheOptions) -> Vec<Station> {
        let key = limit.to_string();
        let query = SearchParams::new()
            .order(Order::LastCheckTime)
            .reverse(true)
            .limit(limit)
            .hidebroken(true)
            .normalize();
        let (key, query) = (&key, &query);

        self.dispatcher
            .execute_or(
                move |p| async move {
                    if !options.bypass_cache {
                        if let Some(hit) = self.latest_cache.get(key) {
                            return Ok(hit);
                        }
                    }
                    debug!(limit, "Getting latest stations");
                    let stations = self.search_on(p, query, options).await?;
                    if !options.bypass_cache {
                        self.latest_cache.put(key.clone(), stations.clone());
                    }
                    Ok(stations)
                },
                || {
                    debug!("No provider reachable, returning no latest stations");
                    Vec::new()
                },
            )
            .await
    }

    /// Randomly ordered stations. Degrades to an empty fallback envelope when
    /// no mirror is reachable.
    pub async fn random_stations(&self, limit: usize) -> ApiResponse<Vec<Station>> {
        let query = SearchParams::new()
            .order(Order::Random)
            .limit(limit)
            .hidebroken(true)
            .normalize();
        let query = &query;

        self.dispatcher
            .execute_or(
                move |p| async move {
                    let stations = self.search_on(p, query, CacheOptions::default()).await?;
                    Ok(ApiResponse::from_mirror(stations))
                },
                || {
                    debug!("No provider reachable, returning no random stations");
                    ApiResponse::fallback(Vec::new())
                },
            )
            .await
    }

    /// Random stations from one country.
    pub async fn random_local_stations(
        &self,
        country_code: &str,
        limit: usize,
    ) -> Result<Vec<Station>> {
        debug!(country_code, limit, "Getting random local stations");
        let params = SearchParams::new()
            .countrycode(country_code)
            .order(Order::Random)
            .limit(limit)
            .hidebroken(true);
        self.search_stations(&params).await
    }

    /// Most-clicked stations carrying a tag.
    pub async fn stations_by_tag(&self, tag: &str, limit: usize) -> Result<Vec<Station>> {
        let params = SearchParams::new()
            .tag(tag)
            .limit(limit)
            .hidebroken(true)
            .order(Order::ClickCount)
            .reverse(true);
        self.search_stations(&params).await
    }

    /// Stations with an exact country code.
    pub async fn stations_by_country(
        &self,
        country_code: &str,
        limit: usize,
    ) -> Result<Vec<Station>> {
        let path = format!(
            "/json/stations/bycountrycodeexact/{}",
            encode_component(country_code)
        );
        let path = &path;
        self.dispatcher
            .execute(move |p| self.fetch_json(p, path, vec![("limit".into(), limit.to_string())]))
            .await
    }

    /// Look up a single station.
    pub async fn station_by_uuid(&self, uuid: &str) -> Result<Option<Station>> {
        let path = format!("/json/stations/byuuid/{}", encode_component(uuid));
        let path = &path;
        let stations: Vec<Station> = self
            .dispatcher
            .execute(move |p| self.fetch_json(p, path, Vec::new()))
            .await?;
        Ok(stations.into_iter().next())
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    pub async fn countries(&self) -> Result<Vec<Country>> {
        self.dispatcher
            .execute(move |p| self.fetch_json(p, "/json/countries", Vec::new()))
            .await
    }

    /// Languages, most stations first.
    pub async fn languages(&self) -> Result<Vec<Language>> {
        let mut languages: Vec<Language> = self
            .dispatcher
            .execute(move |p| self.fetch_json(p, "/json/languages", Vec::new()))
            .await?;
        languages.sort_by(|a, b| b.stationcount.cmp(&a.stationcount));
        Ok(languages)
    }

    /// The most used tags, most stations first.
    pub async fn tags(&self) -> Result<Vec<Tag>> {
        let mut tags: Vec<Tag> = self
            .dispatcher
            .execute(move |p| self.fetch_json(p, "/json/tags", Vec::new()))
            .await?;
        tags.retain(|t| t.stationcount > MIN_TAG_STATIONS);
        tags.sort_by(|a, b| b.stationcount.cmp(&a.stationcount));
        tags.truncate(MAX_TAGS);
        Ok(tags)
    }

    // ========================================================================
    // Station actions
    // ========================================================================

    /// Register a play of a station.
    pub async fn record_click(&self, uuid: &str) -> Result<()> {
        let path = format!("/json/url/{}", encode_component(uuid));
        let path = &path;
        self.dispatcher
            .execute(move |p| async move {
                self.transport.get(&self.request(&p, path, Vec::new())).await?;
                Ok(())
            })
            .await
    }

    /// Vote for a station. Returns whether the mirror accepted the vote.
    pub async fn vote_for_station(&self, uuid: &str) -> Result<bool> {
        let path = format!("/json/vote/{}", encode_component(uuid));
        let path = &path;
        let response: ActionResponse = self
            .dispatcher
            .execute(move |p| self.fetch_json(p, path, Vec::new()))
            .await?;
        Ok(response.is_ok())
    }

    /// Statistics of the mirror that answers, tagged with its name.
    pub async fn api_status(&self) -> Result<ApiStatus> {
        self.dispatcher
            .execute(move |p| async move {
                let stats: ServerStats = self.fetch_json(p.clone(), "/json/stats", Vec::new()).await?;
                Ok(ApiStatus {
                    stats,
                    provider: p.name,
                    kind: p.kind,
                })
            })
            .await
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn request(&self, provider: &Provider, path: &str, query: Vec<(String, String)>) -> Request {
        Request::new(&provider.base_url, path, self.config.request_timeout).with_query(query)
    }

    async fn fetch_json<D: DeserializeOwned>(
        &self,
        provider: Provider,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<D> {
        let body = self
            .transport
            .get(&self.request(&provider, path, query))
            .await?;
        serde_json::from_str(&body).map_err(|e| ClientError::json(e, &body))
    }

    /// One search attempt against one provider, read-through cached.
    async fn search_on(
        &self,
        provider: Provider,
        query: &NormalizedQuery,
        options: CacheOptions,
    ) -> Result<Vec<Station>> {
        let key = query.cache_key();
        if !options.bypass_cache {
            if let Some(hit) = self.search_cache.get(&key) {
                return Ok(hit);
            }
        }

        debug!(provider = %provider.name, params = %key, "Searching stations");
        let stations: Vec<Station> = self.fetch_json(provider, SEARCH_PATH, query.pairs()).await?;
        debug!(count = stations.len(), "Search complete");

        if !options.bypass_cache {
            self.search_cache.put(key, stations.clone());
        }
        Ok(stations)
    }
}

fn cache_for<V: Clone>(config: &ClientConfig) -> TtlCache<V> {
    TtlCache::new(config.cache_ttl, config.cache_capacity)
}

/// Search adapter handed to the recommendation policy.
struct ClientSearch<'a, T> {
    client: &'a RadioClient<T>,
    options: CacheOptions,
}

impl<T: Transport> StationSearch for ClientSearch<'_, T> {
    async fn search(&self, params: SearchParams) -> Result<Vec<Station>> {
        self.client
            .search_stations_with(&params, self.options)
            .await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
