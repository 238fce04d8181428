//! Observable cache store.
//!
//! Wraps the SQLite pool and broadcasts a [`CacheChange`] after every write,
//! so screens can follow what is stored while a fetch runs elsewhere. Each
//! `watch_*` stream yields the current value first, then re-reads once per
//! matching write. A lagging watcher re-reads instead of replaying the events
//! it missed.

use futures::stream::{self, BoxStream, StreamExt};
use sqlx::SqlitePool;
use std::future::Future;
use tokio::sync::broadcast::{self, error::RecvError};

use super::models::{ForecastItem, SavedCity, Weather};
use super::queries;
use crate::errors::AppError;

/// Capacity of the change channel; watchers further behind re-read.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A write that landed in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheChange {
    /// Current weather for a city key was replaced or deleted.
    Weather(String),
    /// Forecast set for a city key was replaced or deleted.
    Forecast(String),
    /// Every cached weather and forecast row was deleted.
    Cleared,
    SavedCities,
}

impl CacheChange {
    fn touches_weather(&self, city_key: &str) -> bool {
        match self {
            CacheChange::Weather(key) => key.eq_ignore_ascii_case(city_key),
            CacheChange::Cleared => true,
            _ => false,
        }
    }

    fn touches_forecast(&self, city_key: &str) -> bool {
        match self {
            CacheChange::Forecast(key) => key.eq_ignore_ascii_case(city_key),
            CacheChange::Cleared => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    pool: SqlitePool,
    changes: broadcast::Sender<CacheChange>,
}

impl CacheStore {
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { pool, changes }
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn notify(&self, change: CacheChange) {
        // No receivers is fine: nobody is watching.
        let _ = self.changes.send(change);
    }

    pub async fn weather(&self, city_key: &str) -> Result<Option<Weather>, AppError> {
        Ok(queries::get_weather_by_city(&self.pool, city_key).await?)
    }

    pub async fn save_weather(&self, city_key: &str, weather: &Weather) -> Result<(), AppError> {
        queries::upsert_weather(&self.pool, city_key, weather).await?;
        self.notify(CacheChange::Weather(city_key.to_string()));
        Ok(())
    }

    pub async fn forecast(&self, city_key: &str) -> Result<Vec<ForecastItem>, AppError> {
        Ok(queries::get_forecast_by_city(&self.pool, city_key).await?)
    }

    pub async fn replace_forecast(
        &self,
        city_key: &str,
        items: &[ForecastItem],
    ) -> Result<(), AppError> {
        queries::replace_forecast(&self.pool, city_key, items).await?;
        self.notify(CacheChange::Forecast(city_key.to_string()));
        Ok(())
    }

    /// Delete the cached weather and forecast of one city.
    pub async fn clear_city(&self, city_key: &str) -> Result<(), AppError> {
        queries::clear_city_cache(&self.pool, city_key).await?;
        self.notify(CacheChange::Weather(city_key.to_string()));
        self.notify(CacheChange::Forecast(city_key.to_string()));
        Ok(())
    }

    pub async fn clear_all(&self) -> Result<(), AppError> {
        queries::clear_weather_cache(&self.pool).await?;
        self.notify(CacheChange::Cleared);
        Ok(())
    }

    pub async fn saved_cities(&self) -> Result<Vec<SavedCity>, AppError> {
        Ok(queries::list_cities(&self.pool).await?)
    }

    pub async fn save_city(&self, city: &SavedCity) -> Result<(), AppError> {
        queries::insert_city(&self.pool, city).await?;
        self.notify(CacheChange::SavedCities);
        Ok(())
    }

    /// Returns whether a row was deleted.
    pub async fn remove_city(&self, city_name: &str) -> Result<bool, AppError> {
        let deleted = queries::delete_city_by_name(&self.pool, city_name).await?;
        if deleted > 0 {
            self.notify(CacheChange::SavedCities);
        }
        Ok(deleted > 0)
    }

    pub async fn is_city_saved(&self, city_name: &str) -> Result<bool, AppError> {
        Ok(queries::is_city_saved(&self.pool, city_name).await?)
    }

    pub fn watch_weather(
        &self,
        city_key: &str,
    ) -> BoxStream<'static, Result<Option<Weather>, AppError>> {
        let key = city_key.to_string();
        let load_key = key.clone();
        self.watch(
            move |change| change.touches_weather(&key),
            move |pool| {
                let key = load_key.clone();
                async move { queries::get_weather_by_city(&pool, &key).await.map_err(AppError::from) }
            },
        )
    }

    pub fn watch_forecast(
        &self,
        city_key: &str,
    ) -> BoxStream<'static, Result<Vec<ForecastItem>, AppError>> {
        let key = city_key.to_string();
        let load_key = key.clone();
        self.watch(
            move |change| change.touches_forecast(&key),
            move |pool| {
                let key = load_key.clone();
                async move { queries::get_forecast_by_city(&pool, &key).await.map_err(AppError::from) }
            },
        )
    }

    pub fn watch_saved_cities(&self) -> BoxStream<'static, Result<Vec<SavedCity>, AppError>> {
        self.watch(
            |change| *change == CacheChange::SavedCities,
            |pool| async move { queries::list_cities(&pool).await.map_err(AppError::from) },
        )
    }

    /// Build a stream that loads once immediately and again on every change
    /// accepted by `matches`. Subscribes before the first load so no write
    /// between the two is missed.
    fn watch<T, M, L, Fut>(&self, matches: M, load: L) -> BoxStream<'static, Result<T, AppError>>
    where
        T: Send + 'static,
        M: Fn(&CacheChange) -> bool + Send + 'static,
        L: Fn(SqlitePool) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        let state = WatchState {
            pool: self.pool.clone(),
            changes: self.changes.subscribe(),
            primed: false,
            matches,
            load,
        };

        stream::unfold(state, |mut state| async move {
            if state.primed {
                loop {
                    match state.changes.recv().await {
                        Ok(change) if (state.matches)(&change) => break,
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!("Cache watcher lagged by {} changes, re-reading", skipped);
                            break;
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            }
            state.primed = true;
            let item = (state.load)(state.pool.clone()).await;
            Some((item, state))
        })
        .boxed()
    }
}

struct WatchState<M, L> {
    pool: SqlitePool,
    changes: broadcast::Receiver<CacheChange>,
    primed: bool,
    matches: M,
    load: L,
}
