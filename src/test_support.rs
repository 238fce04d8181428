//! Fixtures shared by unit tests: an in-memory database and sample
//! OpenWeatherMap payloads.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::db::models::{ForecastItem, Weather};

/// A migrated in-memory database. One connection only: every SQLite
/// `:memory:` connection is a separate database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();
    pool
}

pub fn sample_weather(city: &str, temperature: f64, cached_at: DateTime<Utc>) -> Weather {
    Weather {
        city_name: city.to_string(),
        temperature,
        temp_min: temperature - 2.0,
        temp_max: temperature + 2.0,
        feels_like: temperature - 1.0,
        humidity: 60,
        pressure: 1012,
        weather_main: "Clouds".to_string(),
        weather_description: "broken clouds".to_string(),
        weather_icon: "04d".to_string(),
        wind_speed: 3.5,
        observed_at: 1_740_982_500,
        date: "Monday, 03 March 2025".to_string(),
        sunrise: Some(1_740_966_000),
        sunset: Some(1_741_008_000),
        cached_at,
    }
}

pub fn sample_forecast_item(
    city: &str,
    forecast_at: i64,
    temperature: f64,
    cached_at: DateTime<Utc>,
) -> ForecastItem {
    ForecastItem {
        city_name: city.to_string(),
        forecast_at,
        temperature,
        temp_min: temperature - 1.0,
        temp_max: temperature + 1.0,
        weather_main: "Rain".to_string(),
        weather_description: "light rain".to_string(),
        weather_icon: "10d".to_string(),
        humidity: 80,
        wind_speed: 5.0,
        date_text: format!("ts-{}", forecast_at),
        cached_at,
    }
}

/// Body of `GET /weather` as OpenWeatherMap returns it.
pub fn current_weather_json(city: &str, temperature: f64) -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": 2.35, "lat": 48.85 },
        "weather": [
            { "id": 803, "main": "Clouds", "description": "broken clouds", "icon": "04d" }
        ],
        "base": "stations",
        "main": {
            "temp": temperature,
            "feels_like": temperature - 1.0,
            "temp_min": temperature - 2.0,
            "temp_max": temperature + 2.0,
            "pressure": 1012,
            "humidity": 60
        },
        "visibility": 10000,
        "wind": { "speed": 3.5, "deg": 240 },
        "clouds": { "all": 75 },
        "dt": 1_740_982_500,
        "sys": { "country": "FR", "sunrise": 1_740_966_000, "sunset": 1_741_008_000 },
        "timezone": 3600,
        "id": 2988507,
        "name": city,
        "cod": 200
    })
}

/// Body of `GET /forecast` with `count` 3-hour items starting at 2025-03-03 00:00 UTC.
pub fn forecast_json(city: &str, count: usize, temperature: f64) -> serde_json::Value {
    let start = 1_740_960_000_i64;
    let list: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            let dt = start + i as i64 * 10_800;
            let label = DateTime::<Utc>::from_timestamp(dt, 0)
                .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            serde_json::json!({
                "dt": dt,
                "main": {
                    "temp": temperature + i as f64,
                    "feels_like": temperature,
                    "temp_min": temperature + i as f64 - 1.0,
                    "temp_max": temperature + i as f64 + 1.0,
                    "pressure": 1010,
                    "humidity": 70
                },
                "weather": [
                    { "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }
                ],
                "wind": { "speed": 4.2, "deg": 200 },
                "dt_txt": label
            })
        })
        .collect();

    serde_json::json!({
        "cod": "200",
        "message": 0,
        "cnt": count,
        "list": list,
        "city": { "id": 2988507, "name": city, "country": "FR", "timezone": 3600 }
    })
}
