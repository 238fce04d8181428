pub mod cities;
pub mod health;
pub mod screens;
pub mod weather;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::db::CacheStore;
use crate::screens::{HomeController, LocationsController};
use crate::services::openweather::OpenWeatherClient;
use crate::services::preferences::Preferences;
use crate::services::usecases::WeatherUseCases;
use crate::services::weather::WeatherRepository;

/// Set to "true" on weather and forecast responses served from an outdated
/// cache entry because the refresh failed.
pub const STALE_HEADER: HeaderName = HeaderName::from_static("x-weather-stale");

/// Shared application state for all endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) pool: SqlitePool,
    pub(crate) use_cases: WeatherUseCases,
    pub(crate) home: Arc<HomeController>,
    pub(crate) locations: Arc<LocationsController>,
}

impl AppState {
    /// Wire cache, client and controllers together. Spawns the locations
    /// observer, so it must run inside a Tokio runtime.
    pub(crate) fn new(pool: SqlitePool, client: OpenWeatherClient, default_city: &str) -> Self {
        let store = CacheStore::new(pool.clone());
        let repository = Arc::new(WeatherRepository::new(store, client));
        let use_cases = WeatherUseCases::new(repository);
        let preferences = Preferences::new(pool.clone());

        Self {
            home: Arc::new(HomeController::new(
                use_cases.clone(),
                preferences,
                default_city,
            )),
            locations: Arc::new(LocationsController::start(use_cases.clone())),
            pool,
            use_cases,
        }
    }
}

fn stale_headers(stale: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if stale {
        headers.insert(STALE_HEADER, HeaderValue::from_static("true"));
    }
    headers
}
