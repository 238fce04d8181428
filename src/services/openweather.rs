//! OpenWeatherMap 2.5 client.
//!
//! Fetches current weather and 3-hour forecasts by city name.
//! See: https://openweathermap.org/current and https://openweathermap.org/forecast5

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::db::models::{ForecastItem, Weather};
use crate::errors::AppError;
use crate::helpers::full_date;

pub const UNITS_METRIC: &str = "metric";

/// Number of forecast items requested: 3 days at 3-hour resolution.
pub const FORECAST_ITEMS: u32 = 24;

/// Client for the OpenWeatherMap API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

// --- OpenWeatherMap JSON response types ---

#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    name: String,
    main: CurrentMain,
    #[serde(default)]
    weather: Vec<Condition>,
    wind: Option<Wind>,
    dt: i64,
    sys: Option<Sys>,
}

#[derive(Debug, Deserialize)]
struct CurrentMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
    feels_like: f64,
    humidity: i64,
    pressure: i64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct Sys {
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    list: Vec<ForecastEntry>,
    city: ForecastCity,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt: i64,
    main: ForecastMain,
    #[serde(default)]
    weather: Vec<Condition>,
    wind: Option<Wind>,
    dt_txt: String,
}

#[derive(Debug, Deserialize)]
struct ForecastMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: i64,
}

#[derive(Debug, Deserialize)]
struct ForecastCity {
    name: String,
}

/// Condition fields of the first entry, or empty strings when the API sent none.
fn primary_condition(conditions: &[Condition]) -> (String, String, String) {
    conditions
        .first()
        .map(|c| (c.main.clone(), c.description.clone(), c.icon.clone()))
        .unwrap_or_default()
}

impl CurrentWeatherResponse {
    /// Map the API payload into a cache record stamped with `cached_at`.
    pub fn into_weather(self, cached_at: DateTime<Utc>) -> Weather {
        let (weather_main, weather_description, weather_icon) = primary_condition(&self.weather);
        Weather {
            city_name: self.name,
            temperature: self.main.temp,
            temp_min: self.main.temp_min,
            temp_max: self.main.temp_max,
            feels_like: self.main.feels_like,
            humidity: self.main.humidity,
            pressure: self.main.pressure,
            weather_main,
            weather_description,
            weather_icon,
            wind_speed: self.wind.map(|w| w.speed).unwrap_or(0.0),
            observed_at: self.dt,
            date: full_date(self.dt),
            sunrise: self.sys.as_ref().and_then(|s| s.sunrise),
            sunset: self.sys.as_ref().and_then(|s| s.sunset),
            cached_at,
        }
    }
}

impl ForecastResponse {
    /// Map the API payload into forecast items, ascending by interval start.
    /// Every item shares `cached_at`.
    pub fn into_items(self, cached_at: DateTime<Utc>) -> Vec<ForecastItem> {
        let city_name = self.city.name;
        let mut items: Vec<ForecastItem> = self
            .list
            .into_iter()
            .map(|entry| {
                let (weather_main, weather_description, weather_icon) =
                    primary_condition(&entry.weather);
                ForecastItem {
                    city_name: city_name.clone(),
                    forecast_at: entry.dt,
                    temperature: entry.main.temp,
                    temp_min: entry.main.temp_min,
                    temp_max: entry.main.temp_max,
                    weather_main,
                    weather_description,
                    weather_icon,
                    humidity: entry.main.humidity,
                    wind_speed: entry.wind.map(|w| w.speed).unwrap_or(0.0),
                    date_text: entry.dt_txt,
                    cached_at,
                }
            })
            .collect();
        items.sort_by_key(|item| item.forecast_at);
        items
    }
}

impl OpenWeatherClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::InternalError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Fetch current weather for a city.
    pub async fn fetch_current_weather(&self, city: &str) -> Result<CurrentWeatherResponse, AppError> {
        self.get_json("weather", city, &[]).await
    }

    /// Fetch the next `FORECAST_ITEMS` 3-hour intervals for a city.
    pub async fn fetch_forecast(&self, city: &str) -> Result<ForecastResponse, AppError> {
        self.get_json("forecast", city, &[("cnt", FORECAST_ITEMS.to_string())])
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        city: &str,
        extra: &[(&str, String)],
    ) -> Result<T, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let mut query: Vec<(&str, String)> = vec![
            ("q", city.to_string()),
            ("appid", self.api_key.clone()),
            ("units", UNITS_METRIC.to_string()),
        ];
        query.extend(extra.iter().cloned());

        tracing::debug!("OpenWeatherMap request: {} q={}", endpoint, city);

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::Network(format!("OpenWeatherMap request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::CityNotFound(format!("No weather data for '{}'", city)));
        }
        if status.is_client_error() {
            // Bad key or rate limit: the server answered, so this is not offline.
            return Err(AppError::InternalError(format!(
                "OpenWeatherMap rejected the request: HTTP {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(AppError::Network(format!(
                "OpenWeatherMap returned HTTP {}",
                status
            )));
        }

        response.json::<T>().await.map_err(|e| {
            AppError::Network(format!("OpenWeatherMap JSON parse error: {}", e))
        })
    }
}
