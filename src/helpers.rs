//! Shared helpers for timestamps and weather display.
//!
//! OpenWeatherMap reports times as unix seconds; every formatter here takes
//! that form and renders in UTC. Formatters return an empty string for
//! timestamps chrono cannot represent.

use chrono::{DateTime, Datelike, Duration, Utc};

/// Full date, e.g. "Monday, 03 March 2025".
pub const DATE_FORMAT_FULL: &str = "%A, %d %B %Y";
/// Short day label used to group forecast items, e.g. "03 Mar".
pub const DATE_FORMAT_DAY: &str = "%d %b";
/// 12-hour clock time, e.g. "06:15 AM".
pub const DATE_FORMAT_TIME: &str = "%I:%M %p";
/// 24-hour clock time, e.g. "18:00".
pub const DATE_FORMAT_HOUR: &str = "%H:%M";

const ICON_URL_BASE: &str = "https://openweathermap.org/img/wn";

/// Format a unix timestamp (seconds) with a chrono format string.
pub fn format_date(timestamp: i64, format: &str) -> String {
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(dt) => dt.format(format).to_string(),
        None => {
            tracing::warn!("format_date received out-of-range timestamp {}", timestamp);
            String::new()
        }
    }
}

pub fn full_date(timestamp: i64) -> String {
    format_date(timestamp, DATE_FORMAT_FULL)
}

pub fn day_label(timestamp: i64) -> String {
    format_date(timestamp, DATE_FORMAT_DAY)
}

pub fn time_label(timestamp: i64) -> String {
    format_date(timestamp, DATE_FORMAT_TIME)
}

pub fn hour_label(timestamp: i64) -> String {
    format_date(timestamp, DATE_FORMAT_HOUR)
}

/// Whether two unix timestamps fall on the same UTC calendar day.
pub fn is_same_day(a: i64, b: i64) -> bool {
    match (
        DateTime::<Utc>::from_timestamp(a, 0),
        DateTime::<Utc>::from_timestamp(b, 0),
    ) {
        (Some(a), Some(b)) => a.year() == b.year() && a.ordinal() == b.ordinal(),
        _ => false,
    }
}

/// Whether a cache entry written at `cached_at` is no longer fresh at `now`.
///
/// An entry is fresh while its age is at least zero and strictly below `ttl`.
/// An entry stamped in the future is expired, so a clock that jumped
/// backwards cannot pin it.
pub fn is_expired(cached_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    let age = now - cached_at;
    age < Duration::zero() || age >= ttl
}

pub fn icon_url(icon_code: &str) -> String {
    format!("{}/{}@2x.png", ICON_URL_BASE, icon_code)
}

/// Temperature label with the fractional part truncated, e.g. "21°C".
pub fn format_temperature(temp: f64) -> String {
    format!("{}°C", temp.trunc() as i64)
}

/// Lowercase a condition description and capitalise its first letter.
pub fn capitalize_description(condition: &str) -> String {
    let lower = condition.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn weather_emoji(condition: &str) -> &'static str {
    match condition.to_lowercase().as_str() {
        "clear" | "clear sky" => "☀️",
        "clouds" | "few clouds" | "scattered clouds" | "broken clouds" | "overcast clouds" => "☁️",
        "rain" | "light rain" | "moderate rain" | "heavy rain" | "shower rain" => "🌧️",
        "drizzle" | "light drizzle" => "🌦️",
        "thunderstorm" => "⛈️",
        "snow" | "light snow" | "heavy snow" => "❄️",
        "mist" | "fog" | "haze" => "🌫️",
        _ => "🌡️",
    }
}

pub fn is_rainy(condition: &str) -> bool {
    let lower = condition.to_lowercase();
    ["rain", "drizzle", "shower", "thunderstorm"]
        .iter()
        .any(|c| lower.contains(c))
}

pub fn is_sunny(condition: &str) -> bool {
    condition.to_lowercase().contains("clear")
}

pub fn is_cloudy(condition: &str) -> bool {
    condition.to_lowercase().contains("cloud")
}
