//! Directory entities and response envelopes.
//!
//! These types map the radio-browser JSON API. Stations are pass-through
//! data: fields the client does not know about are kept verbatim in
//! `extra` and survive re-serialization. Known fields absent from the
//! input come back with their defaults (`""` or `0`).

use serde::{Deserialize, Serialize};

use crate::providers::ProviderKind;

/// A streamable broadcast source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Stable unique identifier; the identity used for deduplication.
    pub stationuuid: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub url_resolved: String,

    #[serde(default)]
    pub homepage: String,

    #[serde(default)]
    pub favicon: String,

    /// Comma-separated tag list.
    #[serde(default)]
    pub tags: String,

    #[serde(default)]
    pub country: String,

    #[serde(default)]
    pub countrycode: String,

    #[serde(default)]
    pub state: String,

    /// Comma-separated language list.
    #[serde(default)]
    pub language: String,

    #[serde(default)]
    pub codec: String,

    #[serde(default)]
    pub bitrate: u32,

    #[serde(default)]
    pub votes: i64,

    #[serde(default)]
    pub clickcount: i64,

    /// Remaining fields, preserved as received.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A country with its station count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub name: String,

    #[serde(default)]
    pub iso_3166_1: String,

    #[serde(default)]
    pub stationcount: u64,
}

/// A broadcast language with its station count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,

    #[serde(default)]
    pub iso_639: Option<String>,

    #[serde(default)]
    pub stationcount: u64,
}

/// A tag with its station count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,

    #[serde(default)]
    pub stationcount: u64,
}

/// Response from `/json/url/{uuid}` and `/json/vote/{uuid}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionResponse {
    /// Some mirrors send a bool, older ones the string `"true"`.
    #[serde(default)]
    pub ok: serde_json::Value,

    #[serde(default)]
    pub message: Option<String>,
}

impl ActionResponse {
    pub fn is_ok(&self) -> bool {
        match &self.ok {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::String(s) => s == "true",
            _ => false,
        }
    }
}

/// Mirror statistics from `/json/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStats {
    #[serde(default)]
    pub supported_version: Option<u32>,

    #[serde(default)]
    pub software_version: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub stations: Option<u64>,

    #[serde(default)]
    pub stations_broken: Option<u64>,

    #[serde(default)]
    pub tags: Option<u64>,

    #[serde(default)]
    pub clicks_last_hour: Option<u64>,

    #[serde(default)]
    pub clicks_last_day: Option<u64>,

    #[serde(default)]
    pub languages: Option<u64>,

    #[serde(default)]
    pub countries: Option<u64>,
}

/// Mirror statistics annotated with the provider that served them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiStatus {
    #[serde(flatten)]
    pub stats: ServerStats,

    pub provider: String,

    #[serde(rename = "type")]
    pub kind: ProviderKind,
}

/// Where an enveloped result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Served by a radio-browser mirror.
    RadioBrowser,
    /// Produced locally because every mirror failed.
    Fallback,
}

/// Envelope used by the top and random station operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub source: Source,
}

impl<T> ApiResponse<T> {
    /// A normal result from a mirror.
    pub fn from_mirror(data: T) -> Self {
        Self {
            success: true,
            data,
            source: Source::RadioBrowser,
        }
    }

    /// A degraded result produced without any mirror.
    pub fn fallback(data: T) -> Self {
        Self {
            success: true,
            data,
            source: Source::Fallback,
        }
    }
}
