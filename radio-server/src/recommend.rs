//! Locale-based station recommendations.
//!
//! "Top stations" for a user is composed from several searches:
//!
//! 1. For the designated locale (`zh`), a language search and a country
//!    search run concurrently and are merged, language results first.
//! 2. For other locales in [`LOCALE_TABLE`], the language search runs
//!    first; if it comes back short, up to two of the locale's countries
//!    are searched concurrently to fill the gap.
//! 3. Anything else, or a locale whose searches found nothing, falls back
//!    to the globally most-clicked music stations.
//!
//! Results are deduplicated by station identity, shuffled with a uniform
//! Fisher-Yates shuffle, and truncated to the requested limit.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;

use futures::future::try_join_all;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::error::Result;
use crate::models::Station;
use crate::query::{Order, SearchParams};

/// Locale handled by the concurrent language + country merge.
pub const DESIGNATED_LOCALE: &str = "zh";

/// Locale assumed when the caller gives none.
pub const DEFAULT_LOCALE: &str = "en";

/// Maximum number of countries consulted to fill a short language search.
pub const MAX_FILL_COUNTRIES: usize = 2;

/// Search terms associated with a user locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleProfile {
    pub locale: &'static str,
    /// Directory language name (e.g. "spanish").
    pub language: &'static str,
    /// ISO 3166-1 country codes, most relevant first.
    pub countries: &'static [&'static str],
}

/// Profile for the designated locale.
pub const DESIGNATED_PROFILE: LocaleProfile = LocaleProfile {
    locale: DESIGNATED_LOCALE,
    language: "chinese",
    countries: &["CN"],
};

pub const LOCALE_TABLE: &[LocaleProfile] = &[
    LocaleProfile { locale: "es", language: "spanish", countries: &["ES", "MX", "AR", "CO"] },
    LocaleProfile { locale: "fr", language: "french", countries: &["FR"] },
    LocaleProfile { locale: "de", language: "german", countries: &["DE"] },
    LocaleProfile { locale: "ja", language: "japanese", countries: &["JP"] },
    LocaleProfile { locale: "ko", language: "korean", countries: &["KR"] },
    LocaleProfile { locale: "ru", language: "russian", countries: &["RU"] },
    LocaleProfile { locale: "ar", language: "arabic", countries: &["SA", "AE", "EG"] },
    LocaleProfile { locale: "pt", language: "portuguese", countries: &["BR", "PT"] },
    LocaleProfile { locale: "it", language: "italian", countries: &["IT"] },
    LocaleProfile { locale: "hi", language: "hindi", countries: &["IN"] },
    LocaleProfile { locale: "th", language: "thai", countries: &["TH"] },
    LocaleProfile { locale: "vi", language: "vietnamese", countries: &["VN"] },
];

/// Primary language subtag, lowercased: `"zh-CN"` becomes `"zh"`.
pub fn primary_subtag(locale: &str) -> String {
    locale
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Look up the table entry for a locale.
pub fn profile_for(locale: &str) -> Option<&'static LocaleProfile> {
    LOCALE_TABLE.iter().find(|p| p.locale == locale)
}

/// Which policy branch produced a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationPath {
    /// Concurrent language + country merge for the designated locale.
    Designated,
    /// Language search, topped up by country searches.
    Locale,
    /// Global most-clicked fallback.
    Global,
}

impl fmt::Display for RecommendationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecommendationPath::Designated => "designated",
            RecommendationPath::Locale => "locale",
            RecommendationPath::Global => "global",
        })
    }
}

/// Recommended stations and the branch that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub stations: Vec<Station>,
    pub path: RecommendationPath,
}

/// Station search used by the recommendation policy.
///
/// This abstraction allows the policy to be tested without a client.
pub trait StationSearch {
    fn search(&self, params: SearchParams) -> impl Future<Output = Result<Vec<Station>>> + Send;
}

/// Merge lists, keeping the first occurrence of each station identity.
pub fn merge_unique(lists: impl IntoIterator<Item = Vec<Station>>) -> Vec<Station> {
    let mut merged = Vec::new();
    let mut seen = HashSet::new();
    for station in lists.into_iter().flatten() {
        if seen.insert(station.stationuuid.clone()) {
            merged.push(station);
        }
    }
    merged
}

/// Append unseen stations from `lists` to `collected` until it holds `limit`.
pub fn fill_unique(
    collected: &mut Vec<Station>,
    lists: impl IntoIterator<Item = Vec<Station>>,
    limit: usize,
) {
    let mut seen: HashSet<String> = collected.iter().map(|s| s.stationuuid.clone()).collect();
    for station in lists.into_iter().flatten() {
        if collected.len() >= limit {
            break;
        }
        if seen.insert(station.stationuuid.clone()) {
            collected.push(station);
        }
    }
}

/// Shuffle uniformly, then keep at most `limit`.
pub fn shuffle_and_cap(mut stations: Vec<Station>, limit: usize) -> Vec<Station> {
    stations.shuffle(&mut rand::rng());
    stations.truncate(limit);
    stations
}

fn language_search(profile: &LocaleProfile, limit: usize) -> SearchParams {
    SearchParams::new()
        .language(profile.language)
        .order(Order::Random)
        .limit(limit)
        .hidebroken(true)
}

fn country_search(code: &str, limit: usize) -> SearchParams {
    SearchParams::new()
        .countrycode(code)
        .order(Order::Random)
        .limit(limit)
        .hidebroken(true)
}

fn global_search(limit: usize) -> SearchParams {
    SearchParams::new()
        .tag("music")
        .order(Order::ClickCount)
        .reverse(true)
        .limit(limit)
        .hidebroken(true)
}

/// Recommend up to `limit` stations for `locale`.
pub async fn recommend<S: StationSearch>(
    search: &S,
    limit: usize,
    locale: Option<&str>,
) -> Result<Recommendation> {
    let locale = locale
        .map(primary_subtag)
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string());

    if locale == DESIGNATED_LOCALE {
        let profile = DESIGNATED_PROFILE;
        let by_language = search.search(language_search(&profile, limit).tag("music"));
        let by_country = search.search(country_search(profile.countries[0], limit));
        let (by_language, by_country) = futures::try_join!(by_language, by_country)?;

        let merged = merge_unique([by_language, by_country]);
        if !merged.is_empty() {
            return Ok(finish(merged, limit, RecommendationPath::Designated, &locale));
        }
    } else if let Some(profile) = profile_for(&locale) {
        let mut stations = search.search(language_search(profile, limit)).await?;

        if stations.len() < limit {
            let needed = limit - stations.len();
            let fills = profile
                .countries
                .iter()
                .take(MAX_FILL_COUNTRIES)
                .map(|code| search.search(country_search(code, needed)));
            let results = try_join_all(fills).await?;
            fill_unique(&mut stations, results, limit);
        }

        if !stations.is_empty() {
            return Ok(finish(stations, limit, RecommendationPath::Locale, &locale));
        }
    }

    let stations = search.search(global_search(limit)).await?;
    Ok(finish(stations, limit, RecommendationPath::Global, &locale))
}

fn finish(
    stations: Vec<Station>,
    limit: usize,
    path: RecommendationPath,
    locale: &str,
) -> Recommendation {
    debug!(%path, locale, candidates = stations.len(), limit, "Recommendation ready");
    Recommendation {
        stations: shuffle_and_cap(stations, limit),
        path,
    }
}
