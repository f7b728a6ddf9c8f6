//! OpenWeatherMap client.
//!
//! Current conditions come from `/weather` (by city or by coordinates), the
//! daily forecast from `/onecall` (coordinates only). Every operation is
//! cached independently; city and coordinate keys carry a prefix so the
//! two never share an entry within a region:
//!
//! | operation                        | region            | key                    |
//! |----------------------------------|-------------------|------------------------|
//! | `current_weather_by_city`        | `currentWeather`  | `city:{city}`          |
//! | `current_weather_by_coordinates` | `currentWeather`  | `coord:{lat}-{lon}`    |
//! | `forecast_by_city`               | `forecastWeather` | `city:{city}-{days}`   |
//! | `forecast_by_coordinates`        | `forecastWeather` | `coord:{lat}-{lon}-{days}` |
//!
//! Forecast operations are layered on the current-weather ones, and those
//! inner calls go through the cache as well.

use std::time::Duration;

use crate::config::ProviderConfig;
use crate::errors::AppError;
use crate::models::WeatherData;
use crate::services::cache::ResponseCache;
use crate::services::parser::{parse_current_weather, parse_daily_forecasts};
use crate::services::provider_get;

const PROVIDER: &str = "OpenWeatherMap";

/// Sub-daily granularity the forecast call never needs.
const FORECAST_EXCLUDE: &str = "minutely,hourly,alerts";

/// Client for the OpenWeatherMap API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    current_cache: ResponseCache<WeatherData>,
    forecast_cache: ResponseCache<WeatherData>,
}

impl OpenWeatherClient {
    pub fn new(
        config: &ProviderConfig,
        timeout: Duration,
        current_cache: ResponseCache<WeatherData>,
        forecast_cache: ResponseCache<WeatherData>,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            current_cache,
            forecast_cache,
        })
    }

    /// Current conditions for a city name.
    pub async fn current_weather_by_city(&self, city: &str) -> Result<WeatherData, AppError> {
        let key = city_key(city);
        if let Some(hit) = self.current_cache.get(&key).await {
            tracing::debug!("Cache hit for current weather, city '{}'", city);
            return Ok(hit);
        }

        tracing::debug!("Calling OpenWeatherMap API for city: {}", city);
        let body = self
            .get("weather", &[("q", city.to_string())])
            .await?;
        let weather = parse_current_weather(&body)?;

        self.current_cache.insert(key, weather.clone()).await;
        Ok(weather)
    }

    /// Current conditions at a coordinate pair.
    pub async fn current_weather_by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherData, AppError> {
        let key = coordinate_key(latitude, longitude);
        if let Some(hit) = self.current_cache.get(&key).await {
            tracing::debug!("Cache hit for current weather at {}", key);
            return Ok(hit);
        }

        tracing::debug!(
            "Calling OpenWeatherMap API for coordinates: {}, {}",
            latitude,
            longitude
        );
        let body = self
            .get(
                "weather",
                &[("lat", latitude.to_string()), ("lon", longitude.to_string())],
            )
            .await?;
        let weather = parse_current_weather(&body)?;

        self.current_cache.insert(key, weather.clone()).await;
        Ok(weather)
    }

    /// Current conditions plus up to `days` daily forecasts for a city.
    ///
    /// The forecast endpoint only takes coordinates, so the city is first
    /// resolved through the current-weather call.
    pub async fn forecast_by_city(&self, city: &str, days: u32) -> Result<WeatherData, AppError> {
        let key = format!("{}-{}", city_key(city), days);
        if let Some(hit) = self.forecast_cache.get(&key).await {
            tracing::debug!("Cache hit for forecast, city '{}' ({} days)", city, days);
            return Ok(hit);
        }

        let current = self.current_weather_by_city(city).await?;
        let weather = self
            .forecast_by_coordinates(
                current.coordinates.latitude,
                current.coordinates.longitude,
                days,
            )
            .await?;

        self.forecast_cache.insert(key, weather.clone()).await;
        Ok(weather)
    }

    /// Current conditions plus up to `days` daily forecasts at a
    /// coordinate pair.
    pub async fn forecast_by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
        days: u32,
    ) -> Result<WeatherData, AppError> {
        let key = format!("{}-{}", coordinate_key(latitude, longitude), days);
        if let Some(hit) = self.forecast_cache.get(&key).await {
            tracing::debug!("Cache hit for forecast at {}", key);
            return Ok(hit);
        }

        let mut weather = self
            .current_weather_by_coordinates(latitude, longitude)
            .await?;

        tracing::debug!(
            "Calling OpenWeatherMap OneCall API for forecast: {}, {}",
            latitude,
            longitude
        );
        let body = self
            .get(
                "onecall",
                &[
                    ("lat", latitude.to_string()),
                    ("lon", longitude.to_string()),
                    ("exclude", FORECAST_EXCLUDE.to_string()),
                ],
            )
            .await?;
        weather.daily_forecasts = parse_daily_forecasts(&body, days)?;

        self.forecast_cache.insert(key, weather.clone()).await;
        let entries = self.forecast_cache.len().await;
        tracing::debug!(
            cache = self.forecast_cache.name(),
            entries,
            "Stored {}-day forecast",
            days
        );
        Ok(weather)
    }

    /// GET `{base}/{endpoint}` with the given query plus the API key and
    /// metric units.
    async fn get(&self, endpoint: &str, query: &[(&str, String)]) -> Result<String, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let request = self
            .client
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str()), ("units", "metric")]);

        provider_get(PROVIDER, request).await
    }
}

fn city_key(city: &str) -> String {
    format!("city:{}", city)
}

fn coordinate_key(latitude: f64, longitude: f64) -> String {
    format!("coord:{}-{}", latitude, longitude)
}
