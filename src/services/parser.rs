//! Provider payload parsing.
//!
//! Pure functions (no I/O) turning raw provider JSON into domain records.
//! Required fields are addressed by JSON pointer; a missing or mistyped
//! field fails with `AppError::DataFormat` naming that pointer.

use chrono::{Local, NaiveDate, TimeZone};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::{Coordinates, CurrentWeather, DailyForecast, LocationData, WeatherData};

const CURRENT_PAYLOAD: &str = "current weather";
const FORECAST_PAYLOAD: &str = "forecast";
const LOCATION_PAYLOAD: &str = "location";

fn parse_json(payload: &'static str, body: &str) -> Result<Value, AppError> {
    serde_json::from_str(body).map_err(|e| AppError::data_format(payload, "/", e.to_string()))
}

fn require<'a>(payload: &'static str, root: &'a Value, path: &str) -> Result<&'a Value, AppError> {
    root.pointer(path)
        .ok_or_else(|| AppError::data_format(payload, path, "missing field"))
}

fn require_f64(payload: &'static str, root: &Value, path: &str) -> Result<f64, AppError> {
    require(payload, root, path)?
        .as_f64()
        .ok_or_else(|| AppError::data_format(payload, path, "expected a number"))
}

fn require_i64(payload: &'static str, root: &Value, path: &str) -> Result<i64, AppError> {
    require(payload, root, path)?
        .as_i64()
        .ok_or_else(|| AppError::data_format(payload, path, "expected an integer"))
}

fn require_str(payload: &'static str, root: &Value, path: &str) -> Result<String, AppError> {
    require(payload, root, path)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AppError::data_format(payload, path, "expected a string"))
}

/// Parse an OpenWeatherMap `/weather` response into a `WeatherData` with
/// no daily forecasts.
pub fn parse_current_weather(body: &str) -> Result<WeatherData, AppError> {
    let root = parse_json(CURRENT_PAYLOAD, body)?;
    let p = CURRENT_PAYLOAD;

    Ok(WeatherData {
        city_name: require_str(p, &root, "/name")?,
        country_code: require_str(p, &root, "/sys/country")?,
        coordinates: Coordinates {
            latitude: require_f64(p, &root, "/coord/lat")?,
            longitude: require_f64(p, &root, "/coord/lon")?,
        },
        current_weather: CurrentWeather {
            temperature: require_f64(p, &root, "/main/temp")?,
            feels_like: require_f64(p, &root, "/main/feels_like")?,
            humidity: require_f64(p, &root, "/main/humidity")?,
            pressure: require_f64(p, &root, "/main/pressure")?,
            wind_speed: require_f64(p, &root, "/wind/speed")?,
            description: require_str(p, &root, "/weather/0/description")?,
            icon: require_str(p, &root, "/weather/0/icon")?,
        },
        daily_forecasts: Vec::new(),
        timestamp: Local::now(),
    })
}

/// Parse the `daily` array of an OpenWeatherMap `/onecall` response.
///
/// Returns `min(days, daily.len())` entries in provider order. Entries past
/// that limit are never inspected.
pub fn parse_daily_forecasts(body: &str, days: u32) -> Result<Vec<DailyForecast>, AppError> {
    let root = parse_json(FORECAST_PAYLOAD, body)?;
    let p = FORECAST_PAYLOAD;

    let daily = require(p, &root, "/daily")?
        .as_array()
        .ok_or_else(|| AppError::data_format(p, "/daily", "expected an array"))?;

    let limit = daily.len().min(days as usize);

    (0..limit)
        .map(|i| {
            let at = |field: &str| format!("/daily/{}/{}", i, field);
            let dt = require_i64(p, &root, &at("dt"))?;

            Ok(DailyForecast {
                date: local_date(dt).ok_or_else(|| {
                    AppError::data_format(p, at("dt"), format!("timestamp {} out of range", dt))
                })?,
                min_temperature: require_f64(p, &root, &at("temp/min"))?,
                max_temperature: require_f64(p, &root, &at("temp/max"))?,
                humidity: require_f64(p, &root, &at("humidity"))?,
                description: require_str(p, &root, &at("weather/0/description"))?,
                icon: require_str(p, &root, &at("weather/0/icon"))?,
            })
        })
        .collect()
}

/// Parse an ipgeolocation.io response. `ip_address` is the address that
/// was queried, recorded on the result.
pub fn parse_location(body: &str, ip_address: &str) -> Result<LocationData, AppError> {
    let root = parse_json(LOCATION_PAYLOAD, body)?;

    Ok(LocationData {
        city: optional_text(&root, "/city"),
        country: optional_text(&root, "/country_name"),
        country_code: optional_text(&root, "/country_code2"),
        latitude: decimal_text(&root, "/latitude")?,
        longitude: decimal_text(&root, "/longitude")?,
        ip_address: ip_address.to_string(),
    })
}

fn optional_text(root: &Value, path: &str) -> String {
    root.pointer(path)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// The geolocation provider sends coordinates as strings ("59.91273");
/// plain JSON numbers are accepted too.
fn decimal_text(root: &Value, path: &str) -> Result<f64, AppError> {
    match require(LOCATION_PAYLOAD, root, path)? {
        Value::String(s) => s.trim().parse::<f64>().map_err(|e| {
            AppError::data_format(LOCATION_PAYLOAD, path, format!("'{}': {}", s, e))
        }),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| AppError::data_format(LOCATION_PAYLOAD, path, "expected a number")),
        _ => Err(AppError::data_format(
            LOCATION_PAYLOAD,
            path,
            "expected decimal text",
        )),
    }
}

/// Calendar date of an epoch-seconds timestamp in the local time zone.
fn local_date(epoch_secs: i64) -> Option<NaiveDate> {
    Local
        .timestamp_opt(epoch_secs, 0)
        .single()
        .map(|dt| dt.date_naive())
}


#[cfg(test)]
mod tests {
    use super::samples::*;
    use super::*;

    fn assert_data_format_at(err: AppError, expected_path: &str) {
        match err {
            AppError::DataFormat { path, .. } => assert_eq!(path, expected_path),
            other => panic!("Expected DataFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_current_weather() {
        let body = current_weather_json("Oslo").to_string();
        let data = parse_current_weather(&body).unwrap();

        assert_eq!(data.city_name, "Oslo");
        assert_eq!(data.country_code, "NO");
        assert_eq!(data.coordinates.latitude, 59.9139);
        assert_eq!(data.coordinates.longitude, 10.7522);
        assert_eq!(data.current_weather.temperature, 5.2);
        assert_eq!(data.current_weather.feels_like, 2.1);
        assert_eq!(data.current_weather.humidity, 80.0);
        assert_eq!(data.current_weather.pressure, 1010.0);
        assert_eq!(data.current_weather.wind_speed, 3.6);
        assert_eq!(data.current_weather.description, "scattered clouds");
        assert_eq!(data.current_weather.icon, "03d");
        assert!(data.daily_forecasts.is_empty());
    }

    #[test]
    fn test_parse_current_weather_allows_empty_city() {
        let body = current_weather_json("").to_string();
        let data = parse_current_weather(&body).unwrap();
        assert_eq!(data.city_name, "");
    }

    #[test]
    fn test_parse_current_weather_missing_field() {
        let mut json = current_weather_json("Oslo");
        json["main"].as_object_mut().unwrap().remove("pressure");
        let err = parse_current_weather(&json.to_string()).unwrap_err();
        assert_data_format_at(err, "/main/pressure");
    }

    #[test]
    fn test_parse_current_weather_empty_weather_array() {
        let mut json = current_weather_json("Oslo");
        json["weather"] = serde_json::json!([]);
        let err = parse_current_weather(&json.to_string()).unwrap_err();
        assert_data_format_at(err, "/weather/0/description");
    }

    #[test]
    fn test_parse_current_weather_wrong_type() {
        let mut json = current_weather_json("Oslo");
        json["main"]["temp"] = serde_json::json!("warm");
        let err = parse_current_weather(&json.to_string()).unwrap_err();
        assert_data_format_at(err, "/main/temp");
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = parse_current_weather("<html>").unwrap_err();
        assert_data_format_at(err, "/");
    }

    #[test]
    fn test_parse_daily_forecasts_truncates_to_requested() {
        let body = onecall_json(5).to_string();
        let forecasts = parse_daily_forecasts(&body, 3).unwrap();

        assert_eq!(forecasts.len(), 3);
        assert_eq!(forecasts[0].description, "day 0");
        assert_eq!(forecasts[1].description, "day 1");
        assert_eq!(forecasts[2].description, "day 2");
        assert_eq!(forecasts[0].min_temperature, -2.0);
        assert_eq!(forecasts[0].max_temperature, 4.0);
        assert_eq!(forecasts[0].humidity, 70.0);
        assert_eq!(forecasts[0].icon, "04d");
    }

    #[test]
    fn test_parse_daily_forecasts_clamps_to_available() {
        let body = onecall_json(2).to_string();
        let forecasts = parse_daily_forecasts(&body, 7).unwrap();
        assert_eq!(forecasts.len(), 2);
    }

    #[test]
    fn test_parse_daily_forecasts_zero_days() {
        let body = onecall_json(5).to_string();
        assert!(parse_daily_forecasts(&body, 0).unwrap().is_empty());
    }

    #[test]
    fn test_parse_daily_forecasts_dates_use_local_zone() {
        let body = onecall_json(2).to_string();
        let forecasts = parse_daily_forecasts(&body, 2).unwrap();

        let expected = Local
            .timestamp_opt(1_772_366_400, 0)
            .unwrap()
            .date_naive();
        assert_eq!(forecasts[0].date, expected);
        assert_eq!(forecasts[1].date, expected.succ_opt().unwrap());
    }

    #[test]
    fn test_parse_daily_forecasts_missing_field_in_considered_entry() {
        let mut json = onecall_json(3);
        json["daily"][1]["temp"].as_object_mut().unwrap().remove("max");
        let err = parse_daily_forecasts(&json.to_string(), 3).unwrap_err();
        assert_data_format_at(err, "/daily/1/temp/max");
    }

    #[test]
    fn test_parse_daily_forecasts_ignores_entries_past_limit() {
        let mut json = onecall_json(3);
        json["daily"][2] = serde_json::json!({ "broken": true });
        let forecasts = parse_daily_forecasts(&json.to_string(), 2).unwrap();
        assert_eq!(forecasts.len(), 2);
    }

    #[test]
    fn test_parse_daily_forecasts_missing_daily() {
        let err = parse_daily_forecasts(r#"{"lat": 1.0}"#, 3).unwrap_err();
        assert_data_format_at(err, "/daily");
    }

    #[test]
    fn test_parse_location() {
        let body = location_json("Oslo").to_string();
        let location = parse_location(&body, "203.0.113.5").unwrap();

        assert_eq!(location.city, "Oslo");
        assert_eq!(location.country, "Norway");
        assert_eq!(location.country_code, "NO");
        assert_eq!(location.latitude, 59.91273);
        assert_eq!(location.longitude, 10.74609);
        assert_eq!(location.ip_address, "203.0.113.5");
    }

    #[test]
    fn test_parse_location_tolerates_missing_city() {
        let mut json = location_json("Oslo");
        json.as_object_mut().unwrap().remove("city");
        let location = parse_location(&json.to_string(), "8.8.8.8").unwrap();
        assert_eq!(location.city, "");
    }

    #[test]
    fn test_parse_location_numeric_coordinates() {
        let mut json = location_json("Oslo");
        json["latitude"] = serde_json::json!(59.5);
        let location = parse_location(&json.to_string(), "8.8.8.8").unwrap();
        assert_eq!(location.latitude, 59.5);
    }

    #[test]
    fn test_parse_location_bad_latitude_text() {
        let mut json = location_json("Oslo");
        json["latitude"] = serde_json::json!("north");
        let err = parse_location(&json.to_string(), "8.8.8.8").unwrap_err();
        assert_data_format_at(err, "/latitude");
    }
}
