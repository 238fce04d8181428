/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub openweather_api_key: String,
    pub openweather_base_url: String,
    pub port: u16,
    /// City shown when neither a saved preference nor a GPS fix is available.
    pub default_city: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {value}")]
    Invalid { name: &'static str, value: String },
}

pub const DEFAULT_DATABASE_URL: &str = "sqlite://weather.db?mode=rwc";
pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_CITY: &str = "Mumbai";

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let openweather_api_key = std::env::var("OPENWEATHER_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("OPENWEATHER_API_KEY"))?;

        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            Err(_) => 8080,
        };

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            openweather_api_key,
            openweather_base_url: std::env::var("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENWEATHER_BASE_URL.to_string()),
            port,
            default_city: std::env::var("DEFAULT_CITY").unwrap_or_else(|_| DEFAULT_CITY.to_string()),
        })
    }
}
