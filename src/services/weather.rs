//! Weather repository: the cache/refresh policy.
//!
//! Network first, cache fallback:
//! 1. Unless forced, serve a cached entry younger than `CACHE_DURATION_MINUTES`.
//! 2. Otherwise fetch, write through to the cache, and return the fresh value.
//! 3. If the fetch or the write fails, serve whatever the cache holds (any
//!    age) marked stale, or return the failure when the cache is empty.
//!
//! Concurrent calls for the same city are not coalesced; both may reach the
//! network and the last cache write wins.

use chrono::{Duration, Utc};
use futures::stream::BoxStream;
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::models::{ForecastItem, SavedCity, Weather};
use crate::db::CacheStore;
use crate::errors::{AppError, ErrorKind};
use crate::helpers::is_expired;
use crate::services::openweather::OpenWeatherClient;

/// How long a cached entry is served without a network attempt.
pub const CACHE_DURATION_MINUTES: i64 = 30;

/// Why a value came from the cache after a failed refresh.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Staleness {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&AppError> for Staleness {
    fn from(err: &AppError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// A value returned by the repository, with the reason it is stale if the
/// refresh behind it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub stale: Option<Staleness>,
}

impl<T> Resolved<T> {
    fn fresh(value: T) -> Self {
        Self { value, stale: None }
    }

    fn stale(value: T, err: &AppError) -> Self {
        Self {
            value,
            stale: Some(Staleness::from(err)),
        }
    }

    pub fn is_stale(&self) -> bool {
        self.stale.is_some()
    }
}

/// Trim a user-supplied city name, rejecting blank input.
fn city_key(city: &str) -> Result<&str, AppError> {
    let trimmed = city.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("City name must not be empty".to_string()));
    }
    Ok(trimmed)
}

#[derive(Debug, Clone)]
pub struct WeatherRepository {
    store: CacheStore,
    client: OpenWeatherClient,
    cache_ttl: Duration,
}

impl WeatherRepository {
    pub fn new(store: CacheStore, client: OpenWeatherClient) -> Self {
        Self {
            store,
            client,
            cache_ttl: Duration::minutes(CACHE_DURATION_MINUTES),
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Current weather for `city`, following the cache policy in the module docs.
    pub async fn get_current_weather(
        &self,
        city: &str,
        force_refresh: bool,
    ) -> Result<Resolved<Weather>, AppError> {
        let key = city_key(city)?;

        if !force_refresh {
            match self.store.weather(key).await {
                Ok(Some(cached)) if !is_expired(cached.cached_at, self.cache_ttl, Utc::now()) => {
                    tracing::debug!("Serving cached weather for '{}'", key);
                    return Ok(Resolved::fresh(cached));
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Weather cache read failed for '{}': {}", key, e),
            }
        }

        match self.fetch_and_store_weather(key).await {
            Ok(weather) => Ok(Resolved::fresh(weather)),
            Err(e) => match self.store.weather(key).await {
                Ok(Some(cached)) => {
                    tracing::warn!("Weather refresh for '{}' failed, serving cache: {}", key, e);
                    Ok(Resolved::stale(cached, &e))
                }
                Ok(None) => Err(e),
                Err(read_err) => {
                    tracing::warn!("Weather cache fallback for '{}' failed: {}", key, read_err);
                    Err(e)
                }
            },
        }
    }

    /// Forecast for `city`. Freshness is judged by the first item, since all
    /// items of one fetch share a cache-write time.
    pub async fn get_forecast(
        &self,
        city: &str,
        force_refresh: bool,
    ) -> Result<Resolved<Vec<ForecastItem>>, AppError> {
        let key = city_key(city)?;

        if !force_refresh {
            match self.store.forecast(key).await {
                Ok(cached) => {
                    if let Some(first) = cached.first() {
                        if !is_expired(first.cached_at, self.cache_ttl, Utc::now()) {
                            tracing::debug!("Serving cached forecast for '{}'", key);
                            return Ok(Resolved::fresh(cached));
                        }
                    }
                }
                Err(e) => tracing::warn!("Forecast cache read failed for '{}': {}", key, e),
            }
        }

        match self.fetch_and_store_forecast(key).await {
            Ok(items) => Ok(Resolved::fresh(items)),
            Err(e) => match self.store.forecast(key).await {
                Ok(cached) if !cached.is_empty() => {
                    tracing::warn!("Forecast refresh for '{}' failed, serving cache: {}", key, e);
                    Ok(Resolved::stale(cached, &e))
                }
                Ok(_) => Err(e),
                Err(read_err) => {
                    tracing::warn!("Forecast cache fallback for '{}' failed: {}", key, read_err);
                    Err(e)
                }
            },
        }
    }

    async fn fetch_and_store_weather(&self, key: &str) -> Result<Weather, AppError> {
        let response = self.client.fetch_current_weather(key).await?;
        let weather = response.into_weather(Utc::now());
        self.store.save_weather(key, &weather).await?;
        tracing::info!(
            "Fetched weather for '{}': {:.1}°C {}",
            key,
            weather.temperature,
            weather.weather_description
        );
        Ok(weather)
    }

    async fn fetch_and_store_forecast(&self, key: &str) -> Result<Vec<ForecastItem>, AppError> {
        let response = self.client.fetch_forecast(key).await?;
        let items = response.into_items(Utc::now());
        self.store.replace_forecast(key, &items).await?;
        tracing::info!("Fetched {} forecast items for '{}'", items.len(), key);
        Ok(items)
    }

    /// Stored weather for `city`, re-emitted on every write for that city.
    pub fn watch_cached_weather(
        &self,
        city: &str,
    ) -> BoxStream<'static, Result<Option<Weather>, AppError>> {
        self.store.watch_weather(city.trim())
    }

    pub fn watch_cached_forecast(
        &self,
        city: &str,
    ) -> BoxStream<'static, Result<Vec<ForecastItem>, AppError>> {
        self.store.watch_forecast(city.trim())
    }

    /// Fetch fresh weather for `name` and track the city. A failed fetch
    /// leaves the saved list untouched, even when cached weather exists.
    pub async fn add_city(&self, name: &str) -> Result<SavedCity, AppError> {
        let key = city_key(name)?;
        let weather = self.fetch_and_store_weather(key).await?;
        let city = SavedCity::from_weather(&weather, Utc::now());
        self.store.save_city(&city).await?;
        tracing::info!("Saved city '{}'", city.city_name);
        Ok(city)
    }

    /// Stop tracking `name`. Removing a city that is not saved succeeds.
    pub async fn remove_city(&self, name: &str) -> Result<(), AppError> {
        let key = city_key(name)?;
        if self.store.remove_city(key).await? {
            tracing::info!("Removed city '{}'", key);
        }
        Ok(())
    }

    pub async fn saved_cities(&self) -> Result<Vec<SavedCity>, AppError> {
        self.store.saved_cities().await
    }

    /// Saved cities, most recently added first, re-emitted on every change.
    pub fn watch_saved_cities(&self) -> BoxStream<'static, Result<Vec<SavedCity>, AppError>> {
        self.store.watch_saved_cities()
    }

    pub async fn is_city_saved(&self, name: &str) -> Result<bool, AppError> {
        let key = city_key(name)?;
        self.store.is_city_saved(key).await
    }

    /// Drop cached weather and forecast for one city, or for all cities.
    pub async fn clear_cache(&self, city: Option<&str>) -> Result<(), AppError> {
        match city {
            Some(city) => self.store.clear_city(city_key(city)?).await,
            None => self.store.clear_all().await,
        }
    }
}
