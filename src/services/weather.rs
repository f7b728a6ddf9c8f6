//! Weather request resolution.
//!
//! Decides which upstream calls a search needs and stitches the results
//! together:
//!
//! 1. caller location (explicit flag) → geolocation, then forecast by coordinates
//! 2. coordinates → forecast by coordinates
//! 3. city → forecast by city
//! 4. nothing specified → same as 1
//!
//! After a geolocation-driven fetch the city/country are backfilled from
//! the geolocation record when the weather provider returned no city name.
//! Nothing is cached here; caching lives in the provider clients.

use crate::errors::AppError;
use crate::models::{LocationQuery, WeatherData, WeatherSearchRequest};
use crate::services::client_ip::{extract_client_ip, CallerSource};
use crate::services::geolocation::GeolocationClient;
use crate::services::openweather::OpenWeatherClient;

/// Aggregates the weather and geolocation providers.
#[derive(Debug, Clone)]
pub struct WeatherService {
    weather: OpenWeatherClient,
    geolocation: GeolocationClient,
}

impl WeatherService {
    pub fn new(weather: OpenWeatherClient, geolocation: GeolocationClient) -> Self {
        Self {
            weather,
            geolocation,
        }
    }

    /// Resolve a search into a weather snapshot.
    ///
    /// `caller` is only consulted on the geolocation branches; without it
    /// the fallback IP is used.
    pub async fn get_weather_data(
        &self,
        request: &WeatherSearchRequest,
        caller: Option<&CallerSource<'_>>,
    ) -> Result<WeatherData, AppError> {
        let days = request.forecast_days();

        match &request.query {
            LocationQuery::CallerLocation => {
                tracing::info!("Resolving weather for caller location ({} days)", days);
                self.weather_at_caller_location(caller, days).await
            }
            LocationQuery::Coordinates {
                latitude,
                longitude,
            } => {
                let latitude = parse_coordinate("latitude", latitude)?;
                let longitude = parse_coordinate("longitude", longitude)?;
                tracing::info!(
                    "Resolving weather for coordinates {}, {} ({} days)",
                    latitude,
                    longitude,
                    days
                );
                self.weather
                    .forecast_by_coordinates(latitude, longitude, days)
                    .await
            }
            LocationQuery::City(city) => {
                tracing::info!("Resolving weather for city '{}' ({} days)", city, days);
                self.weather.forecast_by_city(city, days).await
            }
            LocationQuery::Unspecified => {
                tracing::info!(
                    "No location given, defaulting to caller location ({} days)",
                    days
                );
                self.weather_at_caller_location(caller, days).await
            }
        }
    }

    async fn weather_at_caller_location(
        &self,
        caller: Option<&CallerSource<'_>>,
        days: u32,
    ) -> Result<WeatherData, AppError> {
        let ip_address = extract_client_ip(caller);
        let location = self.geolocation.location_by_ip(&ip_address).await?;

        let mut weather = self
            .weather
            .forecast_by_coordinates(location.latitude, location.longitude, days)
            .await?;
        weather.backfill_from(&location);

        Ok(weather)
    }
}

fn parse_coordinate(field: &str, value: &str) -> Result<f64, AppError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| AppError::InvalidInput(format!("{} '{}' is not a valid number", field, value)))
}
