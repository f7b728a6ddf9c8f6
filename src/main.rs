// Weather Lookup API v0.1
use std::net::SocketAddr;

use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod models;
mod routes;
mod services;

use config::AppConfig;
use routes::AppState;
use services::cache::ResponseCache;
use services::geolocation::GeolocationClient;
use services::openweather::OpenWeatherClient;
use services::weather::WeatherService;

/// Weather Lookup API OpenAPI document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Weather Lookup API",
        version = "0.1.0",
        description = "Current weather and daily forecasts by city name, coordinates, \
            or the caller's IP-derived location. Weather comes from OpenWeatherMap, \
            IP locations from ipgeolocation.io; both are cached in memory.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Weather", description = "Weather and forecast lookup"),
    ),
    paths(
        routes::health::health_check,
        routes::weather::search_weather,
        routes::weather::weather_by_city,
        routes::weather::weather_by_coordinates,
        routes::weather::weather_for_current_location,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            models::WeatherSearchParams,
            models::WeatherData,
            models::CurrentWeather,
            models::DailyForecast,
            models::Coordinates,
            models::LocationData,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_lookup_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    // One cache region per operation family, all with the same policy
    let current_cache = ResponseCache::new("currentWeather", config.cache);
    let forecast_cache = ResponseCache::new("forecastWeather", config.cache);
    let location_cache = ResponseCache::new("ipLocation", config.cache);

    let weather_client = OpenWeatherClient::new(
        &config.openweathermap,
        config.http_timeout,
        current_cache,
        forecast_cache,
    )?;
    let geolocation_client =
        GeolocationClient::new(&config.ipgeolocation, config.http_timeout, location_cache)?;

    let app_state = AppState {
        weather: WeatherService::new(weather_client, geolocation_client),
    };

    // CORS: any origin, GET and POST
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = routes::api_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
