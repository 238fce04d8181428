//! Operations available to screens and HTTP handlers.
//!
//! Each method forwards to [`WeatherRepository`] unchanged; presentation code
//! depends on this facade rather than on the repository itself.

use futures::stream::BoxStream;
use std::sync::Arc;

use crate::db::models::{ForecastItem, SavedCity, Weather};
use crate::errors::AppError;
use crate::services::weather::{Resolved, WeatherRepository};

#[derive(Debug, Clone)]
pub struct WeatherUseCases {
    repository: Arc<WeatherRepository>,
}

impl WeatherUseCases {
    pub fn new(repository: Arc<WeatherRepository>) -> Self {
        Self { repository }
    }

    pub async fn get_current_weather(
        &self,
        city: &str,
        force_refresh: bool,
    ) -> Result<Resolved<Weather>, AppError> {
        self.repository.get_current_weather(city, force_refresh).await
    }

    pub async fn get_forecast(
        &self,
        city: &str,
        force_refresh: bool,
    ) -> Result<Resolved<Vec<ForecastItem>>, AppError> {
        self.repository.get_forecast(city, force_refresh).await
    }

    pub fn watch_cached_weather(
        &self,
        city: &str,
    ) -> BoxStream<'static, Result<Option<Weather>, AppError>> {
        self.repository.watch_cached_weather(city)
    }

    pub fn watch_cached_forecast(
        &self,
        city: &str,
    ) -> BoxStream<'static, Result<Vec<ForecastItem>, AppError>> {
        self.repository.watch_cached_forecast(city)
    }

    pub async fn add_city(&self, name: &str) -> Result<SavedCity, AppError> {
        self.repository.add_city(name).await
    }

    pub async fn remove_city(&self, name: &str) -> Result<(), AppError> {
        self.repository.remove_city(name).await
    }

    pub async fn saved_cities(&self) -> Result<Vec<SavedCity>, AppError> {
        self.repository.saved_cities().await
    }

    pub fn watch_saved_cities(&self) -> BoxStream<'static, Result<Vec<SavedCity>, AppError>> {
        self.repository.watch_saved_cities()
    }

    pub async fn is_city_saved(&self, name: &str) -> Result<bool, AppError> {
        self.repository.is_city_saved(name).await
    }

    pub async fn clear_cache(&self, city: Option<&str>) -> Result<(), AppError> {
        self.repository.clear_cache(city).await
    }
}
