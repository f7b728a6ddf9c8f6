//! Weather HTTP endpoints.
//!
//! - POST /api/weather/search
//! - GET  /api/weather/city/:city?days=N
//! - GET  /api/weather/coordinates?latitude=..&longitude=..&days=N
//! - GET  /api/weather/current-location?days=N

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::LazyLock;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use regex::Regex;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::{AppError, ErrorResponse};
use crate::models::{WeatherData, WeatherSearchParams, WeatherSearchRequest};
use crate::routes::AppState;
use crate::services::client_ip::CallerSource;

const LATITUDE_MESSAGE: &str = "Latitude must be between -90 and 90 degrees";
const LONGITUDE_MESSAGE: &str = "Longitude must be between -180 and 180 degrees";

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DaysQuery {
    /// Number of forecast days (defaults to 5)
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CoordinatesQuery {
    /// Latitude in decimal degrees (e.g. "59.9139")
    pub latitude: String,
    /// Longitude in decimal degrees (e.g. "10.7522")
    pub longitude: String,
    /// Number of forecast days (defaults to 5)
    pub days: Option<u32>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

static LATITUDE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?([1-8]?[0-9]|90)(\.[0-9]+)?$").expect("latitude pattern is valid")
});

static LONGITUDE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?((1?[0-7]?|[0-9]?)[0-9]|180)(\.[0-9]+)?$").expect("longitude pattern is valid")
});

// ASCII digits only; `\d` would also accept other Unicode digits.

/// Only the integer part is range-checked; any fraction is accepted.
pub(crate) fn is_valid_latitude(value: &str) -> bool {
    LATITUDE_PATTERN.is_match(value)
}

pub(crate) fn is_valid_longitude(value: &str) -> bool {
    LONGITUDE_PATTERN.is_match(value)
}

/// Check the coordinate fields that are present. Absent fields are fine.
fn validate_coordinates(
    latitude: Option<&str>,
    longitude: Option<&str>,
) -> Result<(), AppError> {
    let mut errors = BTreeMap::new();
    if let Some(latitude) = latitude {
        if !is_valid_latitude(latitude) {
            errors.insert("latitude".to_string(), LATITUDE_MESSAGE.to_string());
        }
    }
    if let Some(longitude) = longitude {
        if !is_valid_longitude(longitude) {
            errors.insert("longitude".to_string(), LONGITUDE_MESSAGE.to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Search weather by any combination of location inputs.
///
/// Priority: `useUserLocation`, then a complete latitude/longitude pair,
/// then `city`. With none of them the caller's IP location is used.
#[utoipa::path(
    post,
    path = "/api/weather/search",
    tag = "Weather",
    request_body = WeatherSearchParams,
    responses(
        (status = 200, description = "Weather for the resolved location", body = WeatherData),
        (status = 400, description = "Invalid search parameters", body = ErrorResponse),
        (status = 503, description = "A provider could not be reached", body = ErrorResponse),
    )
)]
pub async fn search_weather(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<WeatherSearchParams>, JsonRejection>,
) -> Result<Json<WeatherData>, AppError> {
    let Json(params) = payload.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    tracing::info!("Received weather search request: {:?}", params);

    validate_coordinates(params.latitude.as_deref(), params.longitude.as_deref())?;

    let caller = CallerSource {
        headers: &headers,
        remote_addr: connect_info.map(|ConnectInfo(addr)| addr),
    };
    let weather = state
        .weather
        .get_weather_data(&params.into_request(), Some(&caller))
        .await?;

    Ok(Json(weather))
}

/// Weather and forecast for a city name.
#[utoipa::path(
    get,
    path = "/api/weather/city/{city}",
    tag = "Weather",
    params(
        ("city" = String, Path, description = "City name, e.g. \"Oslo\""),
        DaysQuery,
    ),
    responses(
        (status = 200, description = "Weather for the city", body = WeatherData),
        (status = 404, description = "Provider does not know the city", body = ErrorResponse),
    )
)]
pub async fn weather_by_city(
    State(state): State<AppState>,
    Path(city): Path<String>,
    query: Result<Query<DaysQuery>, QueryRejection>,
) -> Result<Json<WeatherData>, AppError> {
    let Query(query) = query.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    tracing::info!("Getting weather for city: {}, days: {:?}", city, query.days);

    let request = WeatherSearchRequest::city(city, query.days);
    let weather = state.weather.get_weather_data(&request, None).await?;
    Ok(Json(weather))
}

/// Weather and forecast at a coordinate pair.
#[utoipa::path(
    get,
    path = "/api/weather/coordinates",
    tag = "Weather",
    params(CoordinatesQuery),
    responses(
        (status = 200, description = "Weather at the coordinates", body = WeatherData),
        (status = 400, description = "Coordinates out of range", body = ErrorResponse),
    )
)]
pub async fn weather_by_coordinates(
    State(state): State<AppState>,
    query: Result<Query<CoordinatesQuery>, QueryRejection>,
) -> Result<Json<WeatherData>, AppError> {
    let Query(query) = query.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    tracing::info!(
        "Getting weather for coordinates: {}, {}, days: {:?}",
        query.latitude,
        query.longitude,
        query.days
    );

    validate_coordinates(Some(&query.latitude), Some(&query.longitude))?;

    let request = WeatherSearchRequest::coordinates(query.latitude, query.longitude, query.days);
    let weather = state.weather.get_weather_data(&request, None).await?;
    Ok(Json(weather))
}

/// Weather at the caller's location, resolved from its IP address.
///
/// Honors `X-Forwarded-For`, `Proxy-Client-IP` and `WL-Proxy-Client-IP`
/// before the connection's remote address.
#[utoipa::path(
    get,
    path = "/api/weather/current-location",
    tag = "Weather",
    params(DaysQuery),
    responses(
        (status = 200, description = "Weather at the caller's location", body = WeatherData),
        (status = 503, description = "A provider could not be reached", body = ErrorResponse),
    )
)]
pub async fn weather_for_current_location(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    query: Result<Query<DaysQuery>, QueryRejection>,
) -> Result<Json<WeatherData>, AppError> {
    let Query(query) = query.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    tracing::info!("Getting weather for current location, days: {:?}", query.days);

    let caller = CallerSource {
        headers: &headers,
        remote_addr: connect_info.map(|ConnectInfo(addr)| addr),
    };
    let request = WeatherSearchRequest::caller_location(query.days);
    let weather = state
        .weather
        .get_weather_data(&request, Some(&caller))
        .await?;
    Ok(Json(weather))
}
