//! `reqwest`-backed transport.

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};

use crate::error::{ClientError, Result};

use super::Transport;
use super::request::Request;

/// HTTP transport sharing one connection pool across all mirrors.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport that sends `user_agent` with every request.
    pub fn new(user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();

        let agent = HeaderValue::from_str(user_agent).map_err(|_| ClientError::Api {
            status: 0,
            message: "Invalid User-Agent format".to_string(),
        })?;
        headers.insert(USER_AGENT, agent);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, request: &Request) -> Result<String> {
        let response = self
            .http
            .get(request.url())
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::timeout(request.timeout)
                } else {
                    ClientError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body.chars().take(500).collect(),
            });
        }

        Ok(response.text().await?)
    }
}
