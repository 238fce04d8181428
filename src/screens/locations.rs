//! Locations screen: the saved-city list with add and remove.

use futures::stream::BoxStream;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use crate::db::models::SavedCity;
use crate::errors::AppError;
use crate::services::usecases::WeatherUseCases;

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct LocationsState {
    /// Saved cities, most recently added first
    pub cities: Vec<SavedCity>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub show_add_dialog: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LocationsIntent {
    AddCity { name: String },
    RemoveCity { name: String },
    ShowAddDialog,
    HideAddDialog,
    ClearError,
}

/// Owns the locations state. The city list is mirrored from the cache by a
/// background task that lives as long as the controller.
pub struct LocationsController {
    use_cases: WeatherUseCases,
    state: Arc<watch::Sender<LocationsState>>,
    observer: JoinHandle<()>,
}

impl LocationsController {
    /// Must be called inside a Tokio runtime.
    pub fn start(use_cases: WeatherUseCases) -> Self {
        let (state, _) = watch::channel(LocationsState::default());
        let state = Arc::new(state);
        let observer = tokio::spawn(mirror_saved_cities(
            use_cases.watch_saved_cities(),
            state.clone(),
        ));
        Self {
            use_cases,
            state,
            observer,
        }
    }

    pub fn state(&self) -> LocationsState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LocationsState> {
        self.state.subscribe()
    }

    pub async fn dispatch(&self, intent: LocationsIntent) {
        tracing::debug!("Locations intent: {:?}", intent);
        match intent {
            LocationsIntent::AddCity { name } => self.add_city(&name).await,
            LocationsIntent::RemoveCity { name } => {
                if let Err(e) = self.use_cases.remove_city(&name).await {
                    tracing::warn!("Failed to remove city '{}': {}", name, e);
                    self.state
                        .send_modify(|s| s.error = Some("Failed to remove city".to_string()));
                }
            }
            LocationsIntent::ShowAddDialog => self.state.send_modify(|s| s.show_add_dialog = true),
            LocationsIntent::HideAddDialog => {
                self.state.send_modify(|s| s.show_add_dialog = false)
            }
            LocationsIntent::ClearError => self.state.send_modify(|s| s.error = None),
        }
    }

    async fn add_city(&self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }

        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        match self.use_cases.add_city(name).await {
            Ok(city) => {
                tracing::info!("Saved city '{}'", city.city_name);
                self.state.send_modify(|s| {
                    s.is_loading = false;
                    s.show_add_dialog = false;
                });
            }
            Err(e) => self.state.send_modify(|s| {
                s.is_loading = false;
                s.error = Some(e.to_string());
            }),
        }
    }
}

impl Drop for LocationsController {
    fn drop(&mut self) {
        self.observer.abort();
    }
}

async fn mirror_saved_cities(
    mut cities: BoxStream<'static, Result<Vec<SavedCity>, AppError>>,
    state: Arc<watch::Sender<LocationsState>>,
) {
    while let Some(next) = cities.next().await {
        match next {
            Ok(list) => state.send_modify(|s| s.cities = list),
            Err(e) => tracing::warn!("Saved cities unavailable: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CacheStore;
    use crate::services::openweather::OpenWeatherClient;
    use crate::services::weather::WeatherRepository;
    use crate::test_support::{current_weather_json, memory_pool};
    use std::time::Duration;
    use tokio::time::timeout;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn controller_for(server: &MockServer) -> LocationsController {
        let store = CacheStore::new(memory_pool().await);
        let client = OpenWeatherClient::new(&server.uri(), "test-key").unwrap();
        let repository = Arc::new(WeatherRepository::new(store, client));
        LocationsController::start(WeatherUseCases::new(repository))
    }

    async fn wait_for_cities(controller: &LocationsController, count: usize) -> LocationsState {
        let mut rx = controller.subscribe();
        let state = timeout(Duration::from_secs(2), rx.wait_for(|s| s.cities.len() == count))
            .await
            .expect("timed out waiting for city list")
            .unwrap();
        state.clone()
    }

    #[tokio::test]
    async fn test_add_city_updates_list_and_closes_dialog() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Kolkata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_json("Kolkata", 31.0)))
            .mount(&server)
            .await;
        let controller = controller_for(&server).await;

        controller.dispatch(LocationsIntent::ShowAddDialog).await;
        assert!(controller.state().show_add_dialog);

        controller
            .dispatch(LocationsIntent::AddCity {
                name: " Kolkata ".into(),
            })
            .await;

        let state = wait_for_cities(&controller, 1).await;
        assert_eq!(state.cities[0].city_name, "Kolkata");
        assert!(!state.show_add_dialog);
        assert!(!state.is_loading);
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_blank_name_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let controller = controller_for(&server).await;

        controller
            .dispatch(LocationsIntent::AddCity { name: "   ".into() })
            .await;

        let state = controller.state();
        assert!(state.error.is_none());
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_failed_add_keeps_dialog_open_with_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let controller = controller_for(&server).await;

        controller.dispatch(LocationsIntent::ShowAddDialog).await;
        controller
            .dispatch(LocationsIntent::AddCity {
                name: "Atlantis".into(),
            })
            .await;

        let state = controller.state();
        assert!(state.show_add_dialog);
        assert!(state.error.is_some());
        assert!(state.cities.is_empty());

        controller.dispatch(LocationsIntent::ClearError).await;
        controller.dispatch(LocationsIntent::HideAddDialog).await;
        let state = controller.state();
        assert!(state.error.is_none());
        assert!(!state.show_add_dialog);
    }

    #[tokio::test]
    async fn test_remove_city_updates_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_json("Jaipur", 29.0)))
            .mount(&server)
            .await;
        let controller = controller_for(&server).await;

        controller
            .dispatch(LocationsIntent::AddCity {
                name: "Jaipur".into(),
            })
            .await;
        wait_for_cities(&controller, 1).await;

        controller
            .dispatch(LocationsIntent::RemoveCity {
                name: "Jaipur".into(),
            })
            .await;
        let state = wait_for_cities(&controller, 0).await;
        assert!(state.error.is_none());
    }
}
