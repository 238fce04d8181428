use sqlx::SqlitePool;

use super::models::{ForecastItem, SavedCity, Weather};

const WEATHER_COLUMNS: &str = "city_name, temperature, temp_min, temp_max, feels_like,
    humidity, pressure, weather_main, weather_description, weather_icon,
    wind_speed, observed_at, date, sunrise, sunset, cached_at";

const FORECAST_COLUMNS: &str = "city_name, forecast_at, temperature, temp_min, temp_max,
    weather_main, weather_description, weather_icon, humidity, wind_speed,
    date_text, cached_at";

/// Get the cached current weather for a city key (case-insensitive).
pub async fn get_weather_by_city(
    pool: &SqlitePool,
    city_key: &str,
) -> Result<Option<Weather>, sqlx::Error> {
    sqlx::query_as::<_, Weather>(&format!(
        "SELECT {} FROM current_weather WHERE city_key = ?",
        WEATHER_COLUMNS
    ))
    .bind(city_key)
    .fetch_optional(pool)
    .await
}

/// Insert or replace the cached current weather for a city key.
pub async fn upsert_weather(
    pool: &SqlitePool,
    city_key: &str,
    weather: &Weather,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT OR REPLACE INTO current_weather (
            city_key, city_name, temperature, temp_min, temp_max, feels_like,
            humidity, pressure, weather_main, weather_description, weather_icon,
            wind_speed, observed_at, date, sunrise, sunset, cached_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(city_key)
    .bind(&weather.city_name)
    .bind(weather.temperature)
    .bind(weather.temp_min)
    .bind(weather.temp_max)
    .bind(weather.feels_like)
    .bind(weather.humidity)
    .bind(weather.pressure)
    .bind(&weather.weather_main)
    .bind(&weather.weather_description)
    .bind(&weather.weather_icon)
    .bind(weather.wind_speed)
    .bind(weather.observed_at)
    .bind(&weather.date)
    .bind(weather.sunrise)
    .bind(weather.sunset)
    .bind(weather.cached_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Get the cached forecast for a city key, ascending by interval start.
pub async fn get_forecast_by_city(
    pool: &SqlitePool,
    city_key: &str,
) -> Result<Vec<ForecastItem>, sqlx::Error> {
    sqlx::query_as::<_, ForecastItem>(&format!(
        "SELECT {} FROM forecast_items WHERE city_key = ? ORDER BY forecast_at ASC, id ASC",
        FORECAST_COLUMNS
    ))
    .bind(city_key)
    .fetch_all(pool)
    .await
}

/// Replace a city's forecast set. Delete and inserts share one transaction,
/// so readers see either the old set or the new one.
pub async fn replace_forecast(
    pool: &SqlitePool,
    city_key: &str,
    items: &[ForecastItem],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM forecast_items WHERE city_key = ?")
        .bind(city_key)
        .execute(&mut *tx)
        .await?;

    for item in items {
        sqlx::query(
            "INSERT INTO forecast_items (
                city_key, city_name, forecast_at, temperature, temp_min, temp_max,
                weather_main, weather_description, weather_icon, humidity, wind_speed,
                date_text, cached_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(city_key)
        .bind(&item.city_name)
        .bind(item.forecast_at)
        .bind(item.temperature)
        .bind(item.temp_min)
        .bind(item.temp_max)
        .bind(&item.weather_main)
        .bind(&item.weather_description)
        .bind(&item.weather_icon)
        .bind(item.humidity)
        .bind(item.wind_speed)
        .bind(&item.date_text)
        .bind(item.cached_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

/// Delete one city's cached weather and forecast in a single transaction.
pub async fn clear_city_cache(pool: &SqlitePool, city_key: &str) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM current_weather WHERE city_key = ?")
        .bind(city_key)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM forecast_items WHERE city_key = ?")
        .bind(city_key)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

/// Delete every cached weather and forecast row. Saved cities are kept.
pub async fn clear_weather_cache(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM current_weather")
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM forecast_items")
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

/// Insert a saved city, replacing any existing entry with the same name.
/// Replacing gives the row a new rowid, so a re-added city sorts first even
/// when `added_at` ties.
pub async fn insert_city(pool: &SqlitePool, city: &SavedCity) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT OR REPLACE INTO saved_cities (
            city_name, current_temp, weather_description, weather_icon, added_at
        ) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&city.city_name)
    .bind(city.current_temp)
    .bind(&city.weather_description)
    .bind(&city.weather_icon)
    .bind(city.added_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// List saved cities, most recently added first.
pub async fn list_cities(pool: &SqlitePool) -> Result<Vec<SavedCity>, sqlx::Error> {
    sqlx::query_as::<_, SavedCity>(
        "SELECT city_name, current_temp, weather_description, weather_icon, added_at
         FROM saved_cities
         ORDER BY added_at DESC, rowid DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn delete_city_by_name(pool: &SqlitePool, city_name: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM saved_cities WHERE city_name = ?")
        .bind(city_name)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn is_city_saved(pool: &SqlitePool, city_name: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM saved_cities WHERE city_name = ?)")
        .bind(city_name)
        .fetch_one(pool)
        .await
}

pub async fn get_preference(pool: &SqlitePool, key: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT value FROM preferences WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
}

pub async fn set_preference(pool: &SqlitePool, key: &str, value: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO preferences (key, value) VALUES (?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}
