use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Current weather for a city, as last fetched from OpenWeatherMap.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
pub struct Weather {
    /// Canonical city name returned by the API
    pub city_name: String,
    /// Temperature in °C
    pub temperature: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub feels_like: f64,
    /// Relative humidity in %
    pub humidity: i64,
    /// Atmospheric pressure in hPa
    pub pressure: i64,
    /// Condition category, e.g. "Clouds"
    pub weather_main: String,
    /// Condition description, e.g. "broken clouds"
    pub weather_description: String,
    /// OpenWeatherMap icon code, e.g. "04d"
    pub weather_icon: String,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Observation time (unix seconds)
    pub observed_at: i64,
    /// Observation date formatted for display
    pub date: String,
    pub sunrise: Option<i64>,
    pub sunset: Option<i64>,
    /// When this record was written to the cache
    pub cached_at: DateTime<Utc>,
}

/// One 3-hour forecast interval.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
pub struct ForecastItem {
    pub city_name: String,
    /// Start of the interval (unix seconds)
    pub forecast_at: i64,
    pub temperature: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub weather_main: String,
    pub weather_description: String,
    pub weather_icon: String,
    pub humidity: i64,
    pub wind_speed: f64,
    /// API-provided interval label, e.g. "2025-03-03 12:00:00"
    pub date_text: String,
    pub cached_at: DateTime<Utc>,
}

/// A city on the user's tracked list.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
pub struct SavedCity {
    pub city_name: String,
    /// Temperature at the time the city was added
    pub current_temp: f64,
    pub weather_description: String,
    pub weather_icon: String,
    pub added_at: DateTime<Utc>,
}

impl SavedCity {
    pub fn from_weather(weather: &Weather, added_at: DateTime<Utc>) -> Self {
        Self {
            city_name: weather.city_name.clone(),
            current_temp: weather.temperature,
            weather_description: weather.weather_description.clone(),
            weather_icon: weather.weather_icon.clone(),
            added_at,
        }
    }
}
