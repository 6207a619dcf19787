use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AppError;
use crate::fleet::NewDriver;
use crate::models::delay_report::{DelayReport, DriverReportSummary};
use crate::models::driver::Driver;
use crate::models::geofence::{GeofenceTimeCheck, GeofenceViolation};
use crate::models::location::{DriverLocation, GeoPoint};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(create_driver).get(list_drivers))
        .route("/drivers/:id", get(get_driver))
        .route(
            "/drivers/:id/location",
            post(report_location).get(get_location),
        )
        .route("/drivers/:id/delay-reports", get(driver_delay_reports))
        .route("/reports/drivers", get(driver_report_summary))
}

#[derive(Deserialize)]
pub struct ReportLocationRequest {
    pub location: GeoPoint,
}

#[derive(Serialize)]
pub struct LocationReportResponse {
    pub location: DriverLocation,
    pub geofences: Vec<GeofenceViolation>,
    pub time_limits: Vec<GeofenceTimeCheck>,
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewDriver>,
) -> Result<Json<Driver>, AppError> {
    let driver = state
        .update_fleet(|fleet| fleet.create_driver(payload))
        .await?;

    state.metrics.observe_driver(&driver);
    info!(driver_id = driver.id, name = %driver.name, "driver registered");

    Ok(Json(driver))
}

async fn list_drivers(State(state): State<Arc<AppState>>) -> Json<Vec<Driver>> {
    Json(state.fleet.read().await.drivers())
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Driver>, AppError> {
    let fleet = state.fleet.read().await;
    Ok(Json(fleet.driver(id)?.clone()))
}

async fn report_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<ReportLocationRequest>,
) -> Result<Json<LocationReportResponse>, AppError> {
    let check = state.record_location(id, payload.location).await?;

    let violated: Vec<u64> = check
        .geofences
        .iter()
        .filter(|r| r.is_violation)
        .map(|r| r.geofence_id)
        .collect();
    if !violated.is_empty() {
        warn!(driver_id = id, geofences = ?violated, "driver outside geofence");
    }

    Ok(Json(LocationReportResponse {
        location: check.location,
        geofences: check.geofences,
        time_limits: check.time_limits,
    }))
}

async fn get_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<DriverLocation>, AppError> {
    Ok(Json(state.latest_location(id).await?))
}

async fn driver_delay_reports(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<DelayReport>>, AppError> {
    let fleet = state.fleet.read().await;
    Ok(Json(fleet.delay_reports_for_driver(id)?))
}

/// Every driver with their delay report count, most reports first.
async fn driver_report_summary(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<DriverReportSummary>> {
    Json(state.fleet.read().await.driver_report_summary())
}
