//! Scripted transport for testing without network access.
//!
//! Each mirror is registered by base URL and answers from a small route
//! table. Mirrors can be delayed, failed, and recovered while a test runs,
//! and every request is recorded for later assertions.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{ClientError, Result};

use super::Transport;
use super::request::Request;

/// A canned response for requests matching `path` and every pair in `query`.
#[derive(Debug, Clone)]
struct Route {
    path: String,
    query: Vec<(String, String)>,
    body: String,
}

#[derive(Debug, Clone, Default)]
struct MirrorScript {
    delay: Duration,
    failing: bool,
    routes: Vec<Route>,
}

/// Mock transport that serves scripted bodies per mirror.
///
/// Requests to a healthy mirror with no matching route get `[]`.
/// Requests to an unregistered base URL fail as unreachable.
#[derive(Debug, Default)]
pub struct MockTransport {
    mirrors: Mutex<HashMap<String, MirrorScript>>,
    requests: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a healthy mirror.
    pub fn mirror(&self, base_url: &str) -> &Self {
        self.mirrors
            .lock()
            .entry(base_url.to_string())
            .or_default();
        self
    }

    /// Answer `path` on `base_url` with `body`.
    pub fn respond(&self, base_url: &str, path: &str, body: impl Into<String>) -> &Self {
        self.respond_matching(base_url, path, &[], body)
    }

    /// Answer `path` on `base_url` with `body` when the request carries every
    /// pair in `query`. The route with the most matching pairs wins.
    pub fn respond_matching(
        &self,
        base_url: &str,
        path: &str,
        query: &[(&str, &str)],
        body: impl Into<String>,
    ) -> &Self {
        let route = Route {
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.into(),
        };
        self.mirrors
            .lock()
            .entry(base_url.to_string())
            .or_default()
            .routes
            .push(route);
        self
    }

    /// Make every request to `base_url` fail with a 503.
    pub fn fail(&self, base_url: &str) -> &Self {
        self.mirrors
            .lock()
            .entry(base_url.to_string())
            .or_default()
            .failing = true;
        self
    }

    /// Undo [`MockTransport::fail`].
    pub fn recover(&self, base_url: &str) -> &Self {
        if let Some(script) = self.mirrors.lock().get_mut(base_url) {
            script.failing = false;
        }
        self
    }

    /// Delay every response from `base_url`.
    pub fn delay(&self, base_url: &str, delay: Duration) -> &Self {
        self.mirrors
            .lock()
            .entry(base_url.to_string())
            .or_default()
            .delay = delay;
        self
    }

    /// Every request seen so far, in arrival order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    /// Requests for `path` on any mirror.
    pub fn requests_for(&self, path: &str) -> Vec<Request> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Number of requests sent to `base_url`.
    pub fn request_count(&self, base_url: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.base_url == base_url)
            .count()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }

    fn resolve(&self, request: &Request) -> Option<(Duration, Result<String>)> {
        let mirrors = self.mirrors.lock();
        let script = mirrors.get(&request.base_url)?;

        if script.failing {
            let err = ClientError::Api {
                status: 503,
                message: format!("{} is down", request.base_url),
            };
            return Some((script.delay, Err(err)));
        }

        let body = script
            .routes
            .iter()
            .filter(|route| {
                route.path == request.path
                    && route
                        .query
                        .iter()
                        .all(|(k, v)| request.query_value(k) == Some(v.as_str()))
            })
            .max_by_key(|route| route.query.len())
            .map(|route| route.body.clone())
            .unwrap_or_else(|| "[]".to_string());

        Some((script.delay, Ok(body)))
    }
}

impl Transport for MockTransport {
    async fn get(&self, request: &Request) -> Result<String> {
        self.requests.lock().push(request.clone());

        let Some((delay, outcome)) = self.resolve(request) else {
            return Err(ClientError::Unavailable(format!(
                "connection refused: {}",
                request.base_url
            )));
        };

        if delay > request.timeout {
            tokio::time::sleep(request.timeout).await;
            return Err(ClientError::timeout(request.timeout));
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        outcome
    }
}
