//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::client::{DEFAULT_LIMIT, DEFAULT_LOCAL_LIMIT, DEFAULT_TAG_LIMIT};
use crate::error::ClientError;
use crate::models::{ApiResponse, ApiStatus, Country, Language, Station, Tag};
use crate::transport::Transport;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<T: Transport>(state: AppState<T>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/stations/search", get(search_stations::<T>))
        .route("/api/stations/top", get(top_stations::<T>))
        .route("/api/stations/latest", get(latest_stations::<T>))
        .route("/api/stations/random", get(random_stations::<T>))
        .route("/api/stations/local/:code", get(local_stations::<T>))
        .route("/api/stations/bycountry/:code", get(stations_by_country::<T>))
        .route("/api/stations/bytag/:tag", get(stations_by_tag::<T>))
        .route("/api/stations/:uuid", get(station_by_uuid::<T>))
        .route("/api/stations/:uuid/click", post(record_click::<T>))
        .route("/api/stations/:uuid/vote", post(vote_for_station::<T>))
        .route("/api/countries", get(countries::<T>))
        .route("/api/languages", get(languages::<T>))
        .route("/api/tags", get(tags::<T>))
        .route("/api/providers", get(providers::<T>))
        .route("/api/providers/refresh", post(refresh_providers::<T>))
        .route("/api/providers/:name/switch", post(switch_provider::<T>))
        .route("/api/status", get(api_status::<T>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

async fn search_stations<T: Transport>(
    State(state): State<AppState<T>>,
    Query(req): Query<SearchRequest>,
) -> Result<Json<Vec<Station>>, AppError> {
    let stations = state
        .client
        .search_stations_with(&req.params(), req.options())
        .await?;
    Ok(Json(stations))
}

/// Locale-aware recommendations.
async fn top_stations<T: Transport>(
    State(state): State<AppState<T>>,
    Query(req): Query<TopRequest>,
) -> Result<Json<ApiResponse<Vec<Station>>>, AppError> {
    let response = state
        .client
        .top_stations(req.limit(), req.locale.as_deref(), req.options())
        .await?;
    Ok(Json(response))
}

async fn latest_stations<T: Transport>(
    State(state): State<AppState<T>>,
    Query(req): Query<LimitRequest>,
) -> Json<Vec<Station>> {
    Json(
        state
            .client
            .latest_stations(req.limit_or(DEFAULT_LIMIT), req.options())
            .await,
    )
}

async fn random_stations<T: Transport>(
    State(state): State<AppState<T>>,
    Query(req): Query<LimitRequest>,
) -> Json<ApiResponse<Vec<Station>>> {
    Json(
        state
            .client
            .random_stations(req.limit_or(DEFAULT_LIMIT))
            .await,
    )
}

async fn local_stations<T: Transport>(
    State(state): State<AppState<T>>,
    Path(code): Path<String>,
    Query(req): Query<LimitRequest>,
) -> Result<Json<Vec<Station>>, AppError> {
    let code = required(&code, "country code")?;
    let stations = state
        .client
        .random_local_stations(code, req.limit_or(DEFAULT_LOCAL_LIMIT))
        .await?;
    Ok(Json(stations))
}

async fn stations_by_country<T: Transport>(
    State(state): State<AppState<T>>,
    Path(code): Path<String>,
    Query(req): Query<LimitRequest>,
) -> Result<Json<Vec<Station>>, AppError> {
    let code = required(&code, "country code")?;
    let stations = state
        .client
        .stations_by_country(code, req.limit_or(DEFAULT_LIMIT))
        .await?;
    Ok(Json(stations))
}

async fn stations_by_tag<T: Transport>(
    State(state): State<AppState<T>>,
    Path(tag): Path<String>,
    Query(req): Query<LimitRequest>,
) -> Result<Json<Vec<Station>>, AppError> {
    let tag = required(&tag, "tag")?;
    let stations = state
        .client
        .stations_by_tag(tag, req.limit_or(DEFAULT_TAG_LIMIT))
        .await?;
    Ok(Json(stations))
}

async fn station_by_uuid<T: Transport>(
    State(state): State<AppState<T>>,
    Path(uuid): Path<String>,
) -> Result<Json<Station>, AppError> {
    let uuid = required(&uuid, "station uuid")?;
    state
        .client
        .station_by_uuid(uuid)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound {
            message: format!("Station not found: {uuid}"),
        })
}

async fn record_click<T: Transport>(
    State(state): State<AppState<T>>,
    Path(uuid): Path<String>,
) -> Result<Json<ActionResult>, AppError> {
    let uuid = required(&uuid, "station uuid")?;
    state.client.record_click(uuid).await?;
    Ok(Json(ActionResult { ok: true }))
}

async fn vote_for_station<T: Transport>(
    State(state): State<AppState<T>>,
    Path(uuid): Path<String>,
) -> Result<Json<ActionResult>, AppError> {
    let uuid = required(&uuid, "station uuid")?;
    let ok = state.client.vote_for_station(uuid).await?;
    Ok(Json(ActionResult { ok }))
}

async fn countries<T: Transport>(
    State(state): State<AppState<T>>,
) -> Result<Json<Vec<Country>>, AppError> {
    Ok(Json(state.client.countries().await?))
}

async fn languages<T: Transport>(
    State(state): State<AppState<T>>,
) -> Result<Json<Vec<Language>>, AppError> {
    Ok(Json(state.client.languages().await?))
}

async fn tags<T: Transport>(State(state): State<AppState<T>>) -> Result<Json<Vec<Tag>>, AppError> {
    Ok(Json(state.client.tags().await?))
}

/// Mirror health as last observed.
async fn providers<T: Transport>(State(state): State<AppState<T>>) -> Json<ProvidersResponse> {
    Json(provider_status(&state))
}

/// Re-run the probe round, then report.
async fn refresh_providers<T: Transport>(
    State(state): State<AppState<T>>,
) -> Json<ProvidersResponse> {
    state.client.refresh_connection().await;
    Json(provider_status(&state))
}

async fn switch_provider<T: Transport>(
    State(state): State<AppState<T>>,
    Path(name): Path<String>,
) -> Result<Json<SwitchResponse>, AppError> {
    let healthy = state.client.switch_to_provider(&name).await?;
    Ok(Json(SwitchResponse {
        provider: name,
        healthy,
    }))
}

async fn api_status<T: Transport>(
    State(state): State<AppState<T>>,
) -> Result<Json<ApiStatus>, AppError> {
    Ok(Json(state.client.api_status().await?))
}

fn provider_status<T: Transport>(state: &AppState<T>) -> ProvidersResponse {
    ProvidersResponse {
        current: state.client.current_provider().ok().map(|p| p.name),
        initialized: state.client.is_initialized(),
        providers: state.client.providers(),
    }
}

/// Reject blank path segments.
fn required<'a>(value: &'a str, what: &str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest {
            message: format!("Missing {what}"),
        });
    }
    Ok(value)
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    BadGateway { message: String },
    Internal { message: String },
}

impl From<ClientError> for AppError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::ProviderNotFound(_) => AppError::NotFound {
                message: e.to_string(),
            },
            ClientError::NoProviders => AppError::Internal {
                message: e.to_string(),
            },
            _ => AppError::BadGateway {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::BadGateway { message } => (StatusCode::BAD_GATEWAY, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(status = %status, error = %message, "Request failed");
        } else {
            warn!(status = %status, error = %message, "Request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
