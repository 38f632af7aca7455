//! Integration tests for the client over a scripted transport.

use super::*;
use crate::config::ProviderConfig;
use crate::models::Source;
use crate::providers::{PROBE_PATH, ProviderKind};
use crate::transport::MockTransport;
use std::time::Duration;

const M1: &str = "http://m1.test";
const M2: &str = "http://m2.test";
const M3: &str = "http://m3.test";

fn stations_json(ids: &[&str]) -> String {
    let list: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| serde_json::json!({ "stationuuid": id, "name": format!("Station {id}") }))
        .collect();
    serde_json::Value::Array(list).to_string()
}

fn uuids(stations: &[Station]) -> Vec<&str> {
    stations.iter().map(|s| s.stationuuid.as_str()).collect()
}

/// Three healthy mirrors, m1 answering fastest.
fn setup() -> (Arc<MockTransport>, RadioClient<MockTransport>) {
    let mock = Arc::new(MockTransport::new());
    for (idx, base) in [M1, M2, M3].into_iter().enumerate() {
        mock.mirror(base)
            .delay(base, Duration::from_millis(10 * (idx as u64 + 1)));
    }
    let config = ClientConfig::new(vec![
        ProviderConfig::new("m1", M1),
        ProviderConfig::new("m2", M2),
        ProviderConfig::new("m3", M3),
    ]);
    let client = RadioClient::with_transport(config, mock.clone()).unwrap();
    (mock, client)
}

/// Initialize, let straggling probes land, and forget the probe traffic.
async fn ready(mock: &MockTransport, client: &RadioClient<MockTransport>) {
    client.wait_for_initialization().await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    mock.clear_requests();
}

fn fail_all(mock: &MockTransport) {
    for base in [M1, M2, M3] {
        mock.fail(base);
    }
}

#[tokio::test(start_paused = true)]
async fn search_is_cached_by_normalized_query() {
    let (mock, client) = setup();
    mock.respond(M1, SEARCH_PATH, stations_json(&["a", "b"]));
    ready(&mock, &client).await;

    let first = client
        .search_stations(&SearchParams::new().tag("jazz").limit(10))
        .await
        .unwrap();
    let second = client
        .search_stations(&SearchParams::new().limit(10).tag(" jazz "))
        .await
        .unwrap();

    assert_eq!(uuids(&first), vec!["a", "b"]);
    assert_eq!(first, second);
    assert_eq!(mock.requests_for(SEARCH_PATH).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn bypass_skips_cache_read_and_write() {
    let (mock, client) = setup();
    ready(&mock, &client).await;
    let params = SearchParams::new().tag("rock");

    client
        .search_stations_with(&params, CacheOptions::bypass())
        .await
        .unwrap();
    client
        .search_stations_with(&params, CacheOptions::bypass())
        .await
        .unwrap();
    client.search_stations(&params).await.unwrap();

    assert_eq!(mock.requests_for(SEARCH_PATH).len(), 3);
}

#[tokio::test(start_paused = true)]
async fn search_cache_clears_when_full() {
    let (mock, client) = setup();
    ready(&mock, &client).await;

    for limit in 0..81 {
        client
            .search_stations(&SearchParams::new().limit(limit))
            .await
            .unwrap();
    }
    assert_eq!(client.search_cache.len(), 1);

    client
        .search_stations(&SearchParams::new().limit(0))
        .await
        .unwrap();
    assert_eq!(mock.requests_for(SEARCH_PATH).len(), 82);
}

#[tokio::test(start_paused = true)]
async fn non_ascii_values_are_sent_composed() {
    let (mock, client) = setup();
    ready(&mock, &client).await;

    client
        .search_stations(&SearchParams::new().name("Cafe\u{301}").tag("   "))
        .await
        .unwrap();

    let sent = mock.requests_for(SEARCH_PATH);
    assert_eq!(sent[0].query_value("name"), Some("Caf\u{e9}"));
    assert_eq!(sent[0].query_value("tag"), None);
}

#[tokio::test(start_paused = true)]
async fn search_fails_over_to_next_mirror() {
    let (mock, client) = setup();
    mock.respond(M2, SEARCH_PATH, stations_json(&["from-m2"]));
    ready(&mock, &client).await;
    mock.fail(M1);

    let stations = client
        .search_stations(&SearchParams::new().tag("news"))
        .await
        .unwrap();

    assert_eq!(uuids(&stations), vec!["from-m2"]);
    assert_eq!(client.current_provider().unwrap().name, "m2");
    assert!(!client.providers()[0].is_available);
    assert_eq!(mock.request_count(M3), 0);
}

#[tokio::test(start_paused = true)]
async fn search_errors_when_every_mirror_fails() {
    let (mock, client) = setup();
    ready(&mock, &client).await;
    fail_all(&mock);

    let err = client
        .search_stations(&SearchParams::new().tag("news"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Api { status: 503, .. }));
}

#[tokio::test(start_paused = true)]
async fn latest_stations_query_and_cache() {
    let (mock, client) = setup();
    mock.respond(M1, SEARCH_PATH, stations_json(&["new"]));
    ready(&mock, &client).await;

    let first = client.latest_stations(5, CacheOptions::default()).await;
    let second = client.latest_stations(5, CacheOptions::default()).await;

    assert_eq!(uuids(&first), vec!["new"]);
    assert_eq!(first, second);

    let sent = mock.requests_for(SEARCH_PATH);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].query_value("order"), Some("lastchecktime"));
    assert_eq!(sent[0].query_value("reverse"), Some("true"));
    assert_eq!(sent[0].query_value("limit"), Some("5"));
    assert_eq!(sent[0].query_value("hidebroken"), Some("true"));
}

#[tokio::test(start_paused = true)]
async fn latest_stations_degrade_to_empty() {
    let (mock, client) = setup();
    ready(&mock, &client).await;
    fail_all(&mock);

    let stations = client.latest_stations(5, CacheOptions::default()).await;

    assert!(stations.is_empty());
}

#[tokio::test(start_paused = true)]
async fn random_stations_envelope() {
    let (mock, client) = setup();
    mock.respond(M1, SEARCH_PATH, stations_json(&["r1", "r2"]));
    ready(&mock, &client).await;

    let response = client.random_stations(2).await;
    assert!(response.success);
    assert_eq!(response.source, Source::RadioBrowser);
    assert_eq!(uuids(&response.data), vec!["r1", "r2"]);
    assert_eq!(
        mock.requests_for(SEARCH_PATH)[0].query_value("order"),
        Some("random")
    );

    // A different limit misses the search cache.
    fail_all(&mock);
    let response = client.random_stations(3).await;
    assert!(response.success);
    assert_eq!(response.source, Source::Fallback);
    assert!(response.data.is_empty());
}

#[tokio::test(start_paused = true)]
async fn repeated_random_query_is_served_from_search_cache() {
    let (mock, client) = setup();
    mock.respond(M1, SEARCH_PATH, stations_json(&["r1", "r2"]));
    ready(&mock, &client).await;

    let first = client.random_stations(2).await;
    fail_all(&mock);
    let second = client.random_stations(2).await;

    assert_eq!(second.source, Source::RadioBrowser);
    assert_eq!(first.data, second.data);
    assert_eq!(mock.requests_for(SEARCH_PATH).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn caches_honour_configured_capacity() {
    let mock = Arc::new(MockTransport::new());
    mock.mirror(M1);
    let config =
        ClientConfig::new(vec![ProviderConfig::new("m1", M1)]).with_cache_capacity(2);
    let client = RadioClient::with_transport(config, mock.clone()).unwrap();
    ready(&mock, &client).await;

    for limit in 1..=3 {
        client
            .search_stations(&SearchParams::new().limit(limit))
            .await
            .unwrap();
    }
    client.latest_stations(5, CacheOptions::default()).await;
    client
        .top_stations(5, None, CacheOptions::default())
        .await
        .unwrap();

    // The third search and the global top search each overflowed the bound.
    assert_eq!(client.search_cache.len(), 1);
    assert_eq!(client.latest_cache.len(), 1);
    assert_eq!(client.top_cache.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn top_stations_for_designated_locale() {
    let (mock, client) = setup();
    mock.respond_matching(
        M1,
        SEARCH_PATH,
        &[("language", "chinese")],
        stations_json(&["zh1", "zh2", "shared"]),
    )
    .respond_matching(
        M1,
        SEARCH_PATH,
        &[("countrycode", "CN")],
        stations_json(&["shared", "cn1"]),
    );
    ready(&mock, &client).await;

    let response = client
        .top_stations(10, Some("zh-CN"), CacheOptions::default())
        .await
        .unwrap();

    assert_eq!(response.source, Source::RadioBrowser);
    let mut got = uuids(&response.data);
    got.sort();
    assert_eq!(got, vec!["cn1", "shared", "zh1", "zh2"]);
    assert_eq!(mock.requests_for(SEARCH_PATH).len(), 2);

    // Served from the top-stations cache.
    client
        .top_stations(10, Some("zh-CN"), CacheOptions::default())
        .await
        .unwrap();
    assert_eq!(mock.requests_for(SEARCH_PATH).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn top_stations_unknown_locale_uses_global_ranking() {
    let (mock, client) = setup();
    mock.respond_matching(
        M1,
        SEARCH_PATH,
        &[("order", "clickcount")],
        stations_json(&["g1", "g2", "g3"]),
    );
    ready(&mock, &client).await;

    let response = client
        .top_stations(2, Some("xx"), CacheOptions::default())
        .await
        .unwrap();

    assert_eq!(response.data.len(), 2);
    let sent = mock.requests_for(SEARCH_PATH);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].query_value("tag"), Some("music"));
    assert_eq!(sent[0].query_value("reverse"), Some("true"));
}

#[tokio::test(start_paused = true)]
async fn stations_by_country_uses_exact_path() {
    let (mock, client) = setup();
    mock.respond(
        M1,
        "/json/stations/bycountrycodeexact/DE",
        stations_json(&["de1"]),
    );
    ready(&mock, &client).await;

    let stations = client.stations_by_country("DE", DEFAULT_LIMIT).await.unwrap();

    assert_eq!(uuids(&stations), vec!["de1"]);
    let sent = mock.requests_for("/json/stations/bycountrycodeexact/DE");
    assert_eq!(sent[0].query_value("limit"), Some("50"));
}

#[tokio::test(start_paused = true)]
async fn local_and_tag_searches_set_their_params() {
    let (mock, client) = setup();
    ready(&mock, &client).await;

    client
        .random_local_stations("FR", DEFAULT_LOCAL_LIMIT)
        .await
        .unwrap();
    client
        .stations_by_tag("ambient", DEFAULT_TAG_LIMIT)
        .await
        .unwrap();

    let sent = mock.requests_for(SEARCH_PATH);
    assert_eq!(sent[0].query_value("countrycode"), Some("FR"));
    assert_eq!(sent[0].query_value("order"), Some("random"));
    assert_eq!(sent[0].query_value("limit"), Some("20"));

    assert_eq!(sent[1].query_value("tag"), Some("ambient"));
    assert_eq!(sent[1].query_value("order"), Some("clickcount"));
    assert_eq!(sent[1].query_value("limit"), Some("100"));
}

#[tokio::test(start_paused = true)]
async fn station_by_uuid_returns_first_or_none() {
    let (mock, client) = setup();
    mock.respond(M1, "/json/stations/byuuid/abc", stations_json(&["abc"]));
    ready(&mock, &client).await;

    let found = client.station_by_uuid("abc").await.unwrap();
    assert_eq!(found.map(|s| s.stationuuid), Some("abc".to_string()));

    assert!(client.station_by_uuid("missing").await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn tags_are_filtered_and_sorted() {
    let (mock, client) = setup();
    mock.respond(
        M1,
        "/json/tags",
        r#"[
            {"name": "tiny", "stationcount": 5},
            {"name": "edge", "stationcount": 10},
            {"name": "pop", "stationcount": 11},
            {"name": "rock", "stationcount": 50}
        ]"#,
    );
    ready(&mock, &client).await;

    let tags = client.tags().await.unwrap();
    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();

    assert_eq!(names, vec!["rock", "pop"]);
}

#[tokio::test(start_paused = true)]
async fn tags_are_capped() {
    let (mock, client) = setup();
    let many: Vec<serde_json::Value> = (0..150)
        .map(|i| serde_json::json!({ "name": format!("t{i}"), "stationcount": 20 + i }))
        .collect();
    mock.respond(M1, "/json/tags", serde_json::Value::Array(many).to_string());
    ready(&mock, &client).await;

    let tags = client.tags().await.unwrap();

    assert_eq!(tags.len(), MAX_TAGS);
    assert_eq!(tags[0].stationcount, 169);
}

#[tokio::test(start_paused = true)]
async fn languages_sorted_by_station_count() {
    let (mock, client) = setup();
    mock.respond(
        M1,
        "/json/languages",
        r#"[
            {"name": "german", "iso_639": "de", "stationcount": 300},
            {"name": "english", "iso_639": "en", "stationcount": 900},
            {"name": "basque", "stationcount": 12}
        ]"#,
    );
    ready(&mock, &client).await;

    let languages = client.languages().await.unwrap();
    let names: Vec<&str> = languages.iter().map(|l| l.name.as_str()).collect();

    assert_eq!(names, vec!["english", "german", "basque"]);
}

#[tokio::test(start_paused = true)]
async fn countries_pass_through() {
    let (mock, client) = setup();
    mock.respond(
        M1,
        "/json/countries",
        r#"[{"name": "Germany", "iso_3166_1": "DE", "stationcount": 3000}]"#,
    );
    ready(&mock, &client).await;

    let countries = client.countries().await.unwrap();

    assert_eq!(countries.len(), 1);
    assert_eq!(countries[0].iso_3166_1, "DE");
}

#[tokio::test(start_paused = true)]
async fn vote_reports_acceptance() {
    let (mock, client) = setup();
    mock.respond(M1, "/json/vote/good", r#"{"ok": true, "message": "voted"}"#)
        .respond(M1, "/json/vote/again", r#"{"ok": false, "message": "too often"}"#);
    ready(&mock, &client).await;

    assert!(client.vote_for_station("good").await.unwrap());
    assert!(!client.vote_for_station("again").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn click_is_sent_to_current_mirror() {
    let (mock, client) = setup();
    ready(&mock, &client).await;

    client.record_click("abc").await.unwrap();

    let sent = mock.requests_for("/json/url/abc");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].base_url, M1);
}

#[tokio::test(start_paused = true)]
async fn api_status_names_the_serving_mirror() {
    let (mock, client) = setup();
    mock.respond(M2, "/json/stats", r#"{"status": "OK", "stations": 42}"#);
    ready(&mock, &client).await;
    mock.fail(M1);

    let status = client.api_status().await.unwrap();

    assert_eq!(status.provider, "m2");
    assert_eq!(status.kind, ProviderKind::RadioBrowser);
    assert_eq!(status.stats.stations, Some(42));
}

#[tokio::test(start_paused = true)]
async fn switch_and_refresh_move_the_current_mirror() {
    let (mock, client) = setup();
    ready(&mock, &client).await;

    assert!(client.switch_to_provider("m3").await.unwrap());
    assert_eq!(client.current_provider().unwrap().name, "m3");
    assert!(matches!(
        client.switch_to_provider("nowhere").await,
        Err(ClientError::ProviderNotFound(_))
    ));

    mock.fail(M1);
    client.refresh_connection().await;
    assert_eq!(client.current_provider().unwrap().name, "m2");
    assert!(
        mock.requests_for(PROBE_PATH)
            .iter()
            .any(|r| r.base_url == M1)
    );
}

#[tokio::test(start_paused = true)]
async fn background_initialization_completes() {
    let (_mock, client) = setup();
    let client = Arc::new(client);
    assert!(!client.is_initialized());

    client.start_initialization().await.unwrap();

    assert!(client.is_initialized());
    assert_eq!(client.current_provider().unwrap().name, "m1");
}
