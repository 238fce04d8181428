//! Home screen: current weather, hourly items and a 3-day summary for one city.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use utoipa::ToSchema;

use crate::db::models::{ForecastItem, Weather};
use crate::errors::{AppError, ErrorKind};
use crate::helpers::{day_label, is_same_day};
use crate::services::preferences::Preferences;
use crate::services::usecases::WeatherUseCases;

/// Days shown in the daily summary.
const DAILY_FORECAST_DAYS: usize = 3;

/// One day of the summary, folded from that day's 3-hour items.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyForecast {
    /// Day label, e.g. "03 Mar"
    pub date: String,
    /// Start of the day's first interval (unix seconds)
    pub timestamp: i64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub weather_main: String,
    pub weather_description: String,
    pub weather_icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HomeState {
    pub weather: Option<Weather>,
    pub hourly_forecasts: Vec<ForecastItem>,
    pub daily_forecasts: Vec<DailyForecast>,
    pub is_loading: bool,
    /// Blocking error: set only when no weather could be shown at all
    pub error: Option<String>,
    /// Dismissible notice: set when cached weather is shown after a failed refresh
    pub notice: Option<String>,
    pub is_offline: bool,
    pub current_city: String,
    pub show_location_permission_dialog: bool,
}

impl HomeState {
    fn new(default_city: &str) -> Self {
        Self {
            weather: None,
            hourly_forecasts: Vec::new(),
            daily_forecasts: Vec::new(),
            is_loading: false,
            error: None,
            notice: None,
            is_offline: false,
            current_city: default_city.to_string(),
            show_location_permission_dialog: false,
        }
    }
}

/// What the device reported about location access when the screen opened.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "permission", rename_all = "snake_case")]
pub enum LocationAccess {
    /// Permission granted; `gps_city` is the resolved city, if the fix succeeded.
    Granted { gps_city: Option<String> },
    NotGranted,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HomeIntent {
    Start { location: LocationAccess },
    LocationPermissionGranted { gps_city: Option<String> },
    LocationPermissionDenied,
    LoadWeather {
        city: String,
        #[serde(default)]
        force_refresh: bool,
    },
    Refresh,
    ClearError,
}

pub struct HomeController {
    use_cases: WeatherUseCases,
    preferences: Preferences,
    default_city: String,
    state: watch::Sender<HomeState>,
}

impl HomeController {
    pub fn new(use_cases: WeatherUseCases, preferences: Preferences, default_city: &str) -> Self {
        let (state, _) = watch::channel(HomeState::new(default_city));
        Self {
            use_cases,
            preferences,
            default_city: default_city.to_string(),
            state,
        }
    }

    pub fn state(&self) -> HomeState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<HomeState> {
        self.state.subscribe()
    }

    pub async fn dispatch(&self, intent: HomeIntent) {
        tracing::debug!("Home intent: {:?}", intent);
        match intent {
            HomeIntent::Start { location } => self.start(location).await,
            HomeIntent::LocationPermissionGranted { gps_city } => {
                self.state
                    .send_modify(|s| s.show_location_permission_dialog = false);
                self.mark_location_asked().await;
                self.load_location_city(gps_city).await;
            }
            HomeIntent::LocationPermissionDenied => {
                self.state
                    .send_modify(|s| s.show_location_permission_dialog = false);
                self.mark_location_asked().await;
                let city = self.default_city.clone();
                self.load_weather(&city, false).await;
            }
            HomeIntent::LoadWeather {
                city,
                force_refresh,
            } => self.load_weather(&city, force_refresh).await,
            HomeIntent::Refresh => {
                let city = self.state.borrow().current_city.clone();
                self.load_weather(&city, true).await;
            }
            HomeIntent::ClearError => self.state.send_modify(|s| {
                s.error = None;
                s.notice = None;
            }),
        }
    }

    async fn start(&self, location: LocationAccess) {
        let saved = match self.preferences.current_city().await {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!("Could not read last viewed city: {}", e);
                None
            }
        };
        if let Some(city) = saved.filter(|c| !c.trim().is_empty()) {
            self.load_weather(&city, false).await;
            return;
        }

        match location {
            LocationAccess::Granted { gps_city } => self.load_location_city(gps_city).await,
            LocationAccess::NotGranted => {
                let asked = self
                    .preferences
                    .has_asked_location_permission()
                    .await
                    .unwrap_or(false);
                if asked {
                    let city = self.default_city.clone();
                    self.load_weather(&city, false).await;
                } else {
                    self.state
                        .send_modify(|s| s.show_location_permission_dialog = true);
                }
            }
        }
    }

    async fn load_location_city(&self, gps_city: Option<String>) {
        let city = gps_city
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.default_city.clone());
        self.load_weather(&city, false).await;
    }

    async fn mark_location_asked(&self) {
        if let Err(e) = self.preferences.set_asked_location_permission().await {
            tracing::warn!("Could not record location prompt: {}", e);
        }
    }

    async fn load_weather(&self, city: &str, force_refresh: bool) {
        let city = city.trim().to_string();
        if city.is_empty() {
            let e = AppError::BadRequest("City name must not be empty".to_string());
            self.state.send_modify(|s| {
                s.is_loading = false;
                s.error = Some(e.to_string());
            });
            return;
        }
        if let Err(e) = self.preferences.save_current_city(&city).await {
            tracing::warn!("Could not save current city '{}': {}", city, e);
        }

        self.state.send_modify(|s| {
            // Data of the previous city must not show under the new name.
            if !s.current_city.eq_ignore_ascii_case(&city) {
                s.weather = None;
                s.hourly_forecasts.clear();
                s.daily_forecasts.clear();
            }
            s.is_loading = true;
            s.error = None;
            s.notice = None;
            s.current_city = city.clone();
        });

        match self.use_cases.get_current_weather(&city, force_refresh).await {
            Ok(resolved) => self.state.send_modify(|s| {
                s.is_loading = false;
                s.error = None;
                s.is_offline = resolved
                    .stale
                    .as_ref()
                    .is_some_and(|stale| stale.kind == ErrorKind::Network);
                s.notice = resolved.stale.as_ref().map(|stale| {
                    format!("Showing saved weather, refresh failed: {}", stale.message)
                });
                s.weather = Some(resolved.value);
            }),
            Err(e) => self.state.send_modify(|s| {
                s.is_loading = false;
                s.error = Some(e.to_string());
                s.is_offline = e.is_offline();
            }),
        }

        match self.use_cases.get_forecast(&city, force_refresh).await {
            Ok(resolved) => {
                let daily = group_forecasts_by_day(&resolved.value);
                self.state.send_modify(|s| {
                    s.hourly_forecasts = resolved.value;
                    s.daily_forecasts = daily;
                });
            }
            // Keep showing current weather without a forecast.
            Err(e) => tracing::warn!("Forecast unavailable for '{}': {}", city, e),
        }
    }
}

/// Fold ascending forecast items into per-day summaries, first three days only.
pub fn group_forecasts_by_day(items: &[ForecastItem]) -> Vec<DailyForecast> {
    let mut days: Vec<DailyForecast> = Vec::new();

    for item in items {
        match days.last_mut() {
            Some(day) if is_same_day(day.timestamp, item.forecast_at) => {
                day.temp_min = day.temp_min.min(item.temp_min);
                day.temp_max = day.temp_max.max(item.temp_max);
            }
            _ => {
                if days.len() == DAILY_FORECAST_DAYS {
                    break;
                }
                days.push(DailyForecast {
                    date: day_label(item.forecast_at),
                    timestamp: item.forecast_at,
                    temp_min: item.temp_min,
                    temp_max: item.temp_max,
                    weather_main: item.weather_main.clone(),
                    weather_description: item.weather_description.clone(),
                    weather_icon: item.weather_icon.clone(),
                });
            }
        }
    }

    days
}
