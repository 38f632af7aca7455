//! Outbound request description and URL encoding.

use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left unescaped in a URI component: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single path segment or query component as UTF-8.
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

/// A GET against one mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Mirror base URL, without trailing slash.
    pub base_url: String,
    /// Absolute path, already encoded (e.g. `/json/stations/search`).
    pub path: String,
    /// Raw query pairs, encoded by [`Request::url`].
    pub query: Vec<(String, String)>,
    pub timeout: Duration,
}

impl Request {
    pub fn new(base_url: impl Into<String>, path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            path: path.into(),
            query: Vec::new(),
            timeout,
        }
    }

    /// Append query pairs.
    pub fn with_query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Look up a query value by key.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Full URL with an encoded query string.
    pub fn url(&self) -> String {
        let mut url = format!("{}{}", self.base_url, self.path);
        if !self.query.is_empty() {
            let query = self
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&query);
        }
        url
    }
}
