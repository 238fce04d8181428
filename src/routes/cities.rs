//! Saved-city and cache maintenance endpoints.
//!
//! - GET    /api/v1/cities
//! - POST   /api/v1/cities
//! - GET    /api/v1/cities/:name
//! - DELETE /api/v1/cities/:name
//! - DELETE /api/v1/cache
//! - DELETE /api/v1/cache/:city

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AppState;
use crate::db::models::SavedCity;
use crate::errors::{AppError, ErrorResponse};
use crate::helpers::{capitalize_description, format_temperature, icon_url};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCityRequest {
    /// City name to look up and save, e.g. "Pune"
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SavedCityResponse {
    /// Canonical city name as returned by OpenWeatherMap
    pub city_name: String,
    /// Temperature when the city was added, in °C
    pub current_temp: f64,
    pub temperature_label: String,
    pub description: String,
    pub icon_url: String,
    /// When the city was added (RFC 3339)
    pub added_at: String,
}

impl From<SavedCity> for SavedCityResponse {
    fn from(c: SavedCity) -> Self {
        Self {
            temperature_label: format_temperature(c.current_temp),
            description: capitalize_description(&c.weather_description),
            icon_url: icon_url(&c.weather_icon),
            added_at: c.added_at.to_rfc3339(),
            city_name: c.city_name,
            current_temp: c.current_temp,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CityStatusResponse {
    pub name: String,
    pub saved: bool,
}

/// List saved cities, most recently added first.
#[utoipa::path(
    get,
    path = "/api/v1/cities",
    tag = "Cities",
    responses(
        (status = 200, description = "Saved cities", body = Vec<SavedCityResponse>),
        (status = 500, description = "Cache database error", body = ErrorResponse),
    )
)]
pub async fn list_cities(
    State(state): State<AppState>,
) -> Result<Json<Vec<SavedCityResponse>>, AppError> {
    let cities = state.use_cases.saved_cities().await?;
    Ok(Json(cities.into_iter().map(SavedCityResponse::from).collect()))
}

/// Save a city.
///
/// Fetches fresh current weather first; the city is saved only if that
/// fetch succeeds. Saving an already-saved city moves it to the top.
#[utoipa::path(
    post,
    path = "/api/v1/cities",
    tag = "Cities",
    request_body = AddCityRequest,
    responses(
        (status = 201, description = "City saved", body = SavedCityResponse),
        (status = 400, description = "Blank city name", body = ErrorResponse),
        (status = 404, description = "Unknown city", body = ErrorResponse),
        (status = 502, description = "OpenWeatherMap unreachable", body = ErrorResponse),
    )
)]
pub async fn add_city(
    State(state): State<AppState>,
    Json(request): Json<AddCityRequest>,
) -> Result<(StatusCode, Json<SavedCityResponse>), AppError> {
    let city = state.use_cases.add_city(&request.name).await?;
    Ok((StatusCode::CREATED, Json(city.into())))
}

/// Whether a city is on the saved list (case-insensitive).
#[utoipa::path(
    get,
    path = "/api/v1/cities/{name}",
    tag = "Cities",
    params(("name" = String, Path, description = "City name")),
    responses(
        (status = 200, description = "Saved status", body = CityStatusResponse),
        (status = 400, description = "Blank city name", body = ErrorResponse),
    )
)]
pub async fn get_city_status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CityStatusResponse>, AppError> {
    let saved = state.use_cases.is_city_saved(&name).await?;
    Ok(Json(CityStatusResponse { name, saved }))
}

/// Remove a city from the saved list. Removing an unsaved city succeeds.
#[utoipa::path(
    delete,
    path = "/api/v1/cities/{name}",
    tag = "Cities",
    params(("name" = String, Path, description = "City name")),
    responses(
        (status = 204, description = "City removed"),
        (status = 400, description = "Blank city name", body = ErrorResponse),
    )
)]
pub async fn remove_city(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    state.use_cases.remove_city(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Drop all cached weather and forecasts. Saved cities are kept.
#[utoipa::path(
    delete,
    path = "/api/v1/cache",
    tag = "Cache",
    responses(
        (status = 204, description = "Cache cleared"),
        (status = 500, description = "Cache database error", body = ErrorResponse),
    )
)]
pub async fn clear_cache(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.use_cases.clear_cache(None).await?;
    tracing::info!("Cleared weather cache");
    Ok(StatusCode::NO_CONTENT)
}

/// Drop cached weather and forecast for one city.
#[utoipa::path(
    delete,
    path = "/api/v1/cache/{city}",
    tag = "Cache",
    params(("city" = String, Path, description = "City name")),
    responses(
        (status = 204, description = "City cache cleared"),
        (status = 400, description = "Blank city name", body = ErrorResponse),
    )
)]
pub async fn clear_city_cache(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<StatusCode, AppError> {
    state.use_cases.clear_cache(Some(&city)).await?;
    tracing::info!("Cleared weather cache for '{}'", city);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries;
    use crate::errors::ErrorKind;
    use crate::routes::test_state::state_for;
    use crate::test_support::{current_weather_json, sample_weather};
    use chrono::Utc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_city(server: &MockServer, city: &str) {
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", city))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_weather_json(city, 22.7)))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_add_then_list_and_status() {
        let server = MockServer::start().await;
        mock_city(&server, "Pune").await;
        mock_city(&server, "Goa").await;
        let state = state_for(&server).await;

        let (status, Json(added)) = add_city(
            State(state.clone()),
            Json(AddCityRequest {
                name: "Pune".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(added.city_name, "Pune");
        assert_eq!(added.temperature_label, "22°C");

        add_city(
            State(state.clone()),
            Json(AddCityRequest { name: "Goa".into() }),
        )
        .await
        .unwrap();

        let Json(list) = list_cities(State(state.clone())).await.unwrap();
        let names: Vec<&str> = list.iter().map(|c| c.city_name.as_str()).collect();
        assert_eq!(names, ["Goa", "Pune"]);

        let Json(status) = get_city_status(State(state), Path("pune".to_string()))
            .await
            .unwrap();
        assert!(status.saved);
    }

    #[tokio::test]
    async fn test_add_unknown_city_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let state = state_for(&server).await;

        let err = add_city(
            State(state.clone()),
            Json(AddCityRequest {
                name: "Atlantis".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let Json(list) = list_cities(State(state)).await.unwrap();
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_remove_city_is_idempotent() {
        let server = MockServer::start().await;
        mock_city(&server, "Pune").await;
        let state = state_for(&server).await;

        add_city(
            State(state.clone()),
            Json(AddCityRequest {
                name: "Pune".into(),
            }),
        )
        .await
        .unwrap();

        for _ in 0..2 {
            let status = remove_city(State(state.clone()), Path("Pune".to_string()))
                .await
                .unwrap();
            assert_eq!(status, StatusCode::NO_CONTENT);
        }

        let Json(status) = get_city_status(State(state), Path("Pune".to_string()))
            .await
            .unwrap();
        assert!(!status.saved);
    }

    #[tokio::test]
    async fn test_clear_cache_endpoints() {
        let server = MockServer::start().await;
        let state = state_for(&server).await;
        for city in ["Pune", "Goa"] {
            queries::upsert_weather(&state.pool, city, &sample_weather(city, 20.0, Utc::now()))
                .await
                .unwrap();
        }

        clear_city_cache(State(state.clone()), Path("pune".to_string()))
            .await
            .unwrap();
        assert!(queries::get_weather_by_city(&state.pool, "Pune")
            .await
            .unwrap()
            .is_none());
        assert!(queries::get_weather_by_city(&state.pool, "Goa")
            .await
            .unwrap()
            .is_some());

        clear_cache(State(state.clone())).await.unwrap();
        assert!(queries::get_weather_by_city(&state.pool, "Goa")
            .await
            .unwrap()
            .is_none());
    }
}
