//! Screen state endpoints: read the current state of a screen, or send it an
//! intent and get the resulting state back.
//!
//! - GET/POST /api/v1/screens/home
//! - GET/POST /api/v1/screens/locations

use axum::extract::State;
use axum::Json;

use super::AppState;
use crate::screens::home::{HomeIntent, HomeState};
use crate::screens::locations::{LocationsIntent, LocationsState};

#[utoipa::path(
    get,
    path = "/api/v1/screens/home",
    tag = "Screens",
    responses(
        (status = 200, description = "Current home screen state", body = HomeState),
    )
)]
pub async fn get_home(State(state): State<AppState>) -> Json<HomeState> {
    Json(state.home.state())
}

/// Apply a home screen intent. Returns once the intent's loads have finished.
#[utoipa::path(
    post,
    path = "/api/v1/screens/home",
    tag = "Screens",
    request_body = HomeIntent,
    responses(
        (status = 200, description = "Home screen state after the intent", body = HomeState),
    )
)]
pub async fn post_home_intent(
    State(state): State<AppState>,
    Json(intent): Json<HomeIntent>,
) -> Json<HomeState> {
    state.home.dispatch(intent).await;
    Json(state.home.state())
}

#[utoipa::path(
    get,
    path = "/api/v1/screens/locations",
    tag = "Screens",
    responses(
        (status = 200, description = "Current locations screen state", body = LocationsState),
    )
)]
pub async fn get_locations(State(state): State<AppState>) -> Json<LocationsState> {
    Json(state.locations.state())
}

/// Apply a locations screen intent. The saved-city list in the returned
/// state may lag a just-applied add or remove by one update.
#[utoipa::path(
    post,
    path = "/api/v1/screens/locations",
    tag = "Screens",
    request_body = LocationsIntent,
    responses(
        (status = 200, description = "Locations screen state after the intent", body = LocationsState),
    )
)]
pub async fn post_locations_intent(
    State(state): State<AppState>,
    Json(intent): Json<LocationsIntent>,
) -> Json<LocationsState> {
    state.locations.dispatch(intent).await;
    Json(state.locations.state())
}
