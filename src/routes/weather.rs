//! Weather HTTP endpoints.
//!
//! - GET /api/v1/weather/:city?refresh=bool
//! - GET /api/v1/forecast/:city?refresh=bool

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{stale_headers, AppState};
use crate::db::models::{ForecastItem, Weather};
use crate::errors::{AppError, ErrorResponse};
use crate::helpers::{
    capitalize_description, day_label, format_temperature, hour_label, icon_url, is_cloudy,
    is_rainy, is_sunny, time_label, weather_emoji,
};
use crate::screens::home::{group_forecasts_by_day, DailyForecast};
use crate::services::weather::Staleness;

#[derive(Debug, Deserialize, IntoParams)]
pub struct RefreshQuery {
    /// Skip the cache and go to OpenWeatherMap first
    #[serde(default)]
    pub refresh: bool,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct WeatherResponse {
    pub city_name: String,
    /// Temperature in °C
    pub temperature: f64,
    /// Whole-degree temperature for display, e.g. "27°C"
    pub temperature_label: String,
    pub feels_like_label: String,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: i64,
    pub pressure: i64,
    pub weather_main: String,
    /// Description with the first letter capitalised
    pub description: String,
    pub icon_url: String,
    pub emoji: String,
    pub rainy: bool,
    pub sunny: bool,
    pub cloudy: bool,
    pub wind_speed: f64,
    /// Observation date, e.g. "Monday, 03 March 2025"
    pub date: String,
    /// Sunrise time of day, e.g. "06:20 AM"
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    /// When the data was written to the cache (RFC 3339)
    pub cached_at: String,
    /// Present when the data is served from cache after a failed refresh
    pub stale: Option<Staleness>,
}

impl WeatherResponse {
    fn new(weather: Weather, stale: Option<Staleness>) -> Self {
        Self {
            temperature_label: format_temperature(weather.temperature),
            feels_like_label: format_temperature(weather.feels_like),
            description: capitalize_description(&weather.weather_description),
            icon_url: icon_url(&weather.weather_icon),
            emoji: weather_emoji(&weather.weather_main).to_string(),
            rainy: is_rainy(&weather.weather_main),
            sunny: is_sunny(&weather.weather_main),
            cloudy: is_cloudy(&weather.weather_main),
            sunrise: weather.sunrise.map(time_label),
            sunset: weather.sunset.map(time_label),
            cached_at: weather.cached_at.to_rfc3339(),
            city_name: weather.city_name,
            temperature: weather.temperature,
            temp_min: weather.temp_min,
            temp_max: weather.temp_max,
            humidity: weather.humidity,
            pressure: weather.pressure,
            weather_main: weather.weather_main,
            wind_speed: weather.wind_speed,
            date: weather.date,
            stale,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ForecastEntryResponse {
    /// Start of the interval (unix seconds)
    pub forecast_at: i64,
    /// Time of day, e.g. "15:00"
    pub time: String,
    /// Day label, e.g. "03 Mar"
    pub day: String,
    pub temperature: f64,
    pub temperature_label: String,
    pub temp_min: f64,
    pub temp_max: f64,
    pub weather_main: String,
    pub description: String,
    pub icon_url: String,
    pub humidity: i64,
    pub wind_speed: f64,
}

impl From<&ForecastItem> for ForecastEntryResponse {
    fn from(item: &ForecastItem) -> Self {
        Self {
            forecast_at: item.forecast_at,
            time: hour_label(item.forecast_at),
            day: day_label(item.forecast_at),
            temperature: item.temperature,
            temperature_label: format_temperature(item.temperature),
            temp_min: item.temp_min,
            temp_max: item.temp_max,
            weather_main: item.weather_main.clone(),
            description: capitalize_description(&item.weather_description),
            icon_url: icon_url(&item.weather_icon),
            humidity: item.humidity,
            wind_speed: item.wind_speed,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ForecastResponse {
    pub city_name: String,
    /// 3-hour intervals, ascending
    pub items: Vec<ForecastEntryResponse>,
    /// Per-day summary of the first three days
    pub daily: Vec<DailyForecast>,
    /// When the items were written to the cache (RFC 3339)
    pub cached_at: Option<String>,
    pub stale: Option<Staleness>,
}

impl ForecastResponse {
    fn new(items: Vec<ForecastItem>, stale: Option<Staleness>) -> Self {
        Self {
            city_name: items
                .first()
                .map(|i| i.city_name.clone())
                .unwrap_or_default(),
            cached_at: items.first().map(|i| i.cached_at.to_rfc3339()),
            daily: group_forecasts_by_day(&items),
            items: items.iter().map(ForecastEntryResponse::from).collect(),
            stale,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Get current weather for a city.
///
/// Served from cache when the cached entry is younger than 30 minutes.
/// If OpenWeatherMap is unreachable, returns the cached entry of any age
/// with the `X-Weather-Stale: true` header.
#[utoipa::path(
    get,
    path = "/api/v1/weather/{city}",
    tag = "Weather",
    params(
        ("city" = String, Path, description = "City name, e.g. \"Mumbai\""),
        RefreshQuery,
    ),
    responses(
        (status = 200, description = "Current weather", body = WeatherResponse,
         headers(
             ("X-Weather-Stale" = String, description = "Set to 'true' when serving cached data because the refresh failed")
         )),
        (status = 400, description = "Blank city name", body = ErrorResponse),
        (status = 404, description = "Unknown city", body = ErrorResponse),
        (status = 502, description = "OpenWeatherMap unreachable and nothing cached", body = ErrorResponse),
    )
)]
pub async fn get_weather(
    State(state): State<AppState>,
    Path(city): Path<String>,
    Query(params): Query<RefreshQuery>,
) -> Result<(HeaderMap, Json<WeatherResponse>), AppError> {
    let resolved = state
        .use_cases
        .get_current_weather(&city, params.refresh)
        .await?;

    let headers = stale_headers(resolved.is_stale());
    Ok((headers, Json(WeatherResponse::new(resolved.value, resolved.stale))))
}

/// Get the 3-day forecast for a city.
///
/// Same cache policy as current weather; the whole forecast set is
/// replaced on every successful refresh.
#[utoipa::path(
    get,
    path = "/api/v1/forecast/{city}",
    tag = "Weather",
    params(
        ("city" = String, Path, description = "City name"),
        RefreshQuery,
    ),
    responses(
        (status = 200, description = "Forecast items and daily summary", body = ForecastResponse,
         headers(
             ("X-Weather-Stale" = String, description = "Set to 'true' when serving cached data because the refresh failed")
         )),
        (status = 400, description = "Blank city name", body = ErrorResponse),
        (status = 404, description = "Unknown city", body = ErrorResponse),
        (status = 502, description = "OpenWeatherMap unreachable and nothing cached", body = ErrorResponse),
    )
)]
pub async fn get_forecast(
    State(state): State<AppState>,
    Path(city): Path<String>,
    Query(params): Query<RefreshQuery>,
) -> Result<(HeaderMap, Json<ForecastResponse>), AppError> {
    let resolved = state.use_cases.get_forecast(&city, params.refresh).await?;

    let headers = stale_headers(resolved.is_stale());
    Ok((headers, Json(ForecastResponse::new(resolved.value, resolved.stale))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries;
    use crate::errors::ErrorKind;
    use crate::routes::test_state::state_for;
    use crate::routes::STALE_HEADER;
    use crate::test_support::{current_weather_json, forecast_json, sample_weather};
    use chrono::{Duration, Utc};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_get_weather_formats_display_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_json("Paris", 18.4)))
            .mount(&server)
            .await;
        let state = state_for(&server).await;

        let (headers, Json(body)) = get_weather(
            State(state),
            Path("Paris".to_string()),
            Query(RefreshQuery { refresh: false }),
        )
        .await
        .unwrap();

        assert!(headers.get(STALE_HEADER).is_none());
        assert_eq!(body.city_name, "Paris");
        assert_eq!(body.temperature_label, "18°C");
        assert_eq!(body.description, "Broken clouds");
        assert_eq!(body.icon_url, "https://openweathermap.org/img/wn/04d@2x.png");
        assert!(body.cloudy);
        assert!(!body.rainy);
        assert!(body.sunrise.is_some());
        assert!(body.stale.is_none());
    }

    #[tokio::test]
    async fn test_get_weather_stale_sets_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let state = state_for(&server).await;
        let cached = sample_weather("Paris", 12.0, Utc::now() - Duration::hours(2));
        queries::upsert_weather(&state.pool, "Paris", &cached)
            .await
            .unwrap();

        let (headers, Json(body)) = get_weather(
            State(state),
            Path("Paris".to_string()),
            Query(RefreshQuery { refresh: false }),
        )
        .await
        .unwrap();

        assert_eq!(headers.get(STALE_HEADER).unwrap(), "true");
        assert_eq!(body.temperature, 12.0);
        assert_eq!(body.stale.unwrap().kind, ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_get_weather_blank_city_is_bad_request() {
        let server = MockServer::start().await;
        let state = state_for(&server).await;

        let err = get_weather(
            State(state),
            Path("  ".to_string()),
            Query(RefreshQuery { refresh: false }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_get_forecast_groups_days() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_json("Paris", 24, 6.0)))
            .mount(&server)
            .await;
        let state = state_for(&server).await;

        let (headers, Json(body)) = get_forecast(
            State(state),
            Path("Paris".to_string()),
            Query(RefreshQuery { refresh: true }),
        )
        .await
        .unwrap();

        assert!(headers.get(STALE_HEADER).is_none());
        assert_eq!(body.city_name, "Paris");
        assert_eq!(body.items.len(), 24);
        assert_eq!(body.items[0].time, "00:00");
        assert_eq!(body.items[0].day, "03 Mar");
        assert_eq!(body.daily.len(), 3);
        assert!(body.cached_at.is_some());
    }
}
