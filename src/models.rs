//! Domain records shared by the provider clients, the resolver and the
//! HTTP layer.
//!
//! All of these are plain value objects: built once by the pipeline stage
//! that produced them, cloned out of the cache, never mutated in place
//! except for the city/country backfill on `WeatherData`.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Forecast length used when a request does not specify one.
pub const DEFAULT_FORECAST_DAYS: u32 = 5;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Raw search parameters as they arrive on the wire. Every field is
/// optional; [`WeatherSearchParams::into_request`] applies the priority
/// rule that turns them into a [`WeatherSearchRequest`].
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSearchParams {
    /// City name, e.g. "Oslo"
    pub city: Option<String>,
    /// Latitude in decimal degrees, as text (e.g. "59.9139")
    pub latitude: Option<String>,
    /// Longitude in decimal degrees, as text (e.g. "10.7522")
    pub longitude: Option<String>,
    /// Number of forecast days (defaults to 5)
    pub days: Option<u32>,
    /// Resolve the location from the caller's IP address
    pub use_user_location: Option<bool>,
}

impl WeatherSearchParams {
    /// Select the resolution branch. Priority: explicit use-location flag,
    /// then a complete coordinate pair, then a non-empty city, then the
    /// unspecified default.
    pub fn into_request(self) -> WeatherSearchRequest {
        let query = if self.use_user_location == Some(true) {
            LocationQuery::CallerLocation
        } else if let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) {
            LocationQuery::Coordinates {
                latitude,
                longitude,
            }
        } else {
            match self.city {
                Some(city) if !city.is_empty() => LocationQuery::City(city),
                _ => LocationQuery::Unspecified,
            }
        };

        WeatherSearchRequest {
            query,
            days: self.days,
        }
    }
}

/// Where the weather should be looked up.
///
/// `CallerLocation` and `Unspecified` resolve the same way today (via the
/// caller's IP). They stay separate variants so a request that stated no
/// preference is distinguishable from one that asked for "my location".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationQuery {
    CallerLocation,
    Coordinates { latitude: String, longitude: String },
    City(String),
    Unspecified,
}

/// A caller's resolved intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherSearchRequest {
    pub query: LocationQuery,
    pub days: Option<u32>,
}

impl WeatherSearchRequest {
    pub fn city(city: impl Into<String>, days: Option<u32>) -> Self {
        Self {
            query: LocationQuery::City(city.into()),
            days,
        }
    }

    pub fn coordinates(
        latitude: impl Into<String>,
        longitude: impl Into<String>,
        days: Option<u32>,
    ) -> Self {
        Self {
            query: LocationQuery::Coordinates {
                latitude: latitude.into(),
                longitude: longitude.into(),
            },
            days,
        }
    }

    pub fn caller_location(days: Option<u32>) -> Self {
        Self {
            query: LocationQuery::CallerLocation,
            days,
        }
    }

    /// Requested forecast length, defaulting to [`DEFAULT_FORECAST_DAYS`].
    pub fn forecast_days(&self) -> u32 {
        self.days.unwrap_or(DEFAULT_FORECAST_DAYS)
    }
}

// ---------------------------------------------------------------------------
// Provider results
// ---------------------------------------------------------------------------

/// Result of an IP geolocation lookup.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationData {
    pub city: String,
    /// Full country name
    pub country: String,
    /// ISO 3166-1 alpha-2 country code
    pub country_code: String,
    pub latitude: f64,
    pub longitude: f64,
    /// The IP address this location was resolved for
    pub ip_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Instantaneous conditions, metric units.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    /// Air temperature in Celsius
    pub temperature: f64,
    /// Perceived temperature in Celsius
    pub feels_like: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Atmospheric pressure in hPa
    pub pressure: f64,
    /// Wind speed in metres per second
    pub wind_speed: f64,
    /// Provider's textual description, e.g. "scattered clouds"
    pub description: String,
    /// Provider icon code, e.g. "03d"
    pub icon: String,
}

/// One forecast day.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    /// Calendar date in the server's local time zone
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub humidity: f64,
    pub description: String,
    pub icon: String,
}

/// Aggregated weather snapshot returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherData {
    /// City name; may be backfilled from geolocation
    pub city_name: String,
    /// Country code; backfilled together with the city name
    pub country_code: String,
    pub coordinates: Coordinates,
    pub current_weather: CurrentWeather,
    /// Daily forecast, empty for current-conditions-only results
    pub daily_forecasts: Vec<DailyForecast>,
    /// When this snapshot was assembled
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Local>,
}

impl WeatherData {
    /// Fill in city and country from a geolocation record when the weather
    /// provider returned no city name. A provider-supplied name is kept.
    pub fn backfill_from(&mut self, location: &LocationData) {
        if self.city_name.is_empty() {
            self.city_name = location.city.clone();
            self.country_code = location.country_code.clone();
        }
    }
}
