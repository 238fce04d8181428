// City Weather API v0.1
use axum::http::Method;
use axum::{routing::get, Router};
use sqlx::sqlite::SqlitePoolOptions;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod errors;
mod helpers;
mod routes;
mod screens;
mod services;

#[cfg(test)]
mod test_support;

use config::AppConfig;
use routes::AppState;
use services::openweather::OpenWeatherClient;

/// Maximum number of connections in the database pool.
const DB_POOL_MAX_CONNECTIONS: u32 = 5;

/// City Weather API: OpenAPI specification.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "City Weather API",
        version = "0.1.0",
        description = "Current weather and 3-day forecasts from OpenWeatherMap, served \
            through a SQLite cache. Cached data younger than 30 minutes is served \
            without a network call; when OpenWeatherMap is unreachable, older cached \
            data is returned and flagged stale. Also keeps a list of saved cities.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Weather", description = "Current weather and forecasts"),
        (name = "Cities", description = "Saved city list"),
        (name = "Cache", description = "Cache maintenance"),
        (name = "Screens", description = "Home and locations screen state"),
    ),
    paths(
        routes::health::health_check,
        routes::weather::get_weather,
        routes::weather::get_forecast,
        routes::cities::list_cities,
        routes::cities::add_city,
        routes::cities::get_city_status,
        routes::cities::remove_city,
        routes::cities::clear_cache,
        routes::cities::clear_city_cache,
        routes::screens::get_home,
        routes::screens::post_home_intent,
        routes::screens::get_locations,
        routes::screens::post_locations_intent,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::weather::WeatherResponse,
            routes::weather::ForecastEntryResponse,
            routes::weather::ForecastResponse,
            routes::cities::AddCityRequest,
            routes::cities::SavedCityResponse,
            routes::cities::CityStatusResponse,
            screens::home::HomeState,
            screens::home::HomeIntent,
            screens::home::LocationAccess,
            screens::home::DailyForecast,
            screens::locations::LocationsState,
            screens::locations::LocationsIntent,
            services::weather::Staleness,
            db::models::Weather,
            db::models::ForecastItem,
            db::models::SavedCity,
            errors::ErrorResponse,
            errors::ErrorKind,
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
                .unwrap_or_else(|_| "city_weather=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Set up the cache database
    let pool = SqlitePoolOptions::new()
        .max_connections(DB_POOL_MAX_CONNECTIONS)
        .connect(&config.database_url)
        .await
        .expect("Failed to open cache database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    let client = OpenWeatherClient::new(&config.openweather_base_url, &config.openweather_api_key)
        .expect("Failed to build OpenWeatherMap client");

    let app_state = AppState::new(pool, client, &config.default_city);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
        .expose_headers([routes::STALE_HEADER]);

    let app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/weather/:city", get(routes::weather::get_weather))
        .route("/api/v1/forecast/:city", get(routes::weather::get_forecast))
        .route(
            "/api/v1/cities",
            get(routes::cities::list_cities).post(routes::cities::add_city),
        )
        .route(
            "/api/v1/cities/:name",
            get(routes::cities::get_city_status).delete(routes::cities::remove_city),
        )
        .route(
            "/api/v1/cache",
            axum::routing::delete(routes::cities::clear_cache),
        )
        .route(
            "/api/v1/cache/:city",
            axum::routing::delete(routes::cities::clear_city_cache),
        )
        .route(
            "/api/v1/screens/home",
            get(routes::screens::get_home).post(routes::screens::post_home_intent),
        )
        .route(
            "/api/v1/screens/locations",
            get(routes::screens::get_locations).post(routes::screens::post_locations_intent),
        )
        .with_state(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
