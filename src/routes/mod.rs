pub mod health;
pub mod weather;

use axum::routing::{get, post};
use axum::Router;

use crate::services::weather::WeatherService;

/// Shared application state for the weather endpoints.
#[derive(Clone)]
pub struct AppState {
    pub weather: WeatherService,
}

/// API routes without the documentation UI or middleware layers.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/weather/search", post(weather::search_weather))
        .route("/api/weather/city/:city", get(weather::weather_by_city))
        .route("/api/weather/coordinates", get(weather::weather_by_coordinates))
        .route(
            "/api/weather/current-location",
            get(weather::weather_for_current_location),
        )
        .with_state(state)
}
