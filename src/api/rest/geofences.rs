use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{post, put};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use tracing::info;

use crate::engine::geofence::GeofenceInput;
use crate::error::AppError;
use crate::models::geofence::{Geofence, GeofenceViolation};
use crate::models::location::GeoPoint;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/geofences", post(create_geofence).get(list_geofences))
        .route("/geofences/check", post(check_geofences))
        .route(
            "/geofences/:id",
            put(update_geofence).delete(delete_geofence),
        )
}

#[derive(Deserialize)]
pub struct CheckRequest {
    pub location: GeoPoint,
}

async fn create_geofence(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GeofenceInput>,
) -> Result<Json<Geofence>, AppError> {
    let geofence = state
        .update_geofences(|geofences| geofences.create(payload))
        .await?;

    info!(
        geofence_id = geofence.id,
        name = %geofence.name,
        radius_m = geofence.radius_m,
        "geofence created"
    );
    Ok(Json(geofence))
}

async fn list_geofences(State(state): State<Arc<AppState>>) -> Json<Vec<Geofence>> {
    Json(state.geofences.read().await.list())
}

async fn update_geofence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<GeofenceInput>,
) -> Result<Json<Geofence>, AppError> {
    let geofence = state
        .update_geofences(|geofences| geofences.update(id, payload))
        .await?;

    info!(geofence_id = id, "geofence updated");
    Ok(Json(geofence))
}

async fn delete_geofence(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Geofence>, AppError> {
    let geofence = state
        .update_geofences(|geofences| geofences.delete(id))
        .await?;

    info!(geofence_id = id, "geofence deleted");
    Ok(Json(geofence))
}

async fn check_geofences(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CheckRequest>,
) -> Result<Json<Vec<GeofenceViolation>>, AppError> {
    if !payload.location.is_valid() {
        return Err(AppError::Validation(format!(
            "({}, {}) is not a valid coordinate",
            payload.location.lat, payload.location.lng
        )));
    }

    Ok(Json(state.check_geofences(&payload.location).await))
}
