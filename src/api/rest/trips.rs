use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::assignment::{assign_trip, auto_assign_trip};
use crate::engine::reminder::{reminder_for, schedule_reminder};
use crate::error::AppError;
use crate::events::DispatchEvent;
use crate::fleet::{AssignmentOutcome, NewTrip};
use crate::models::assignment::Assignment;
use crate::models::delay_report::DelayReport;
use crate::models::driver::Driver;
use crate::models::trip::{Trip, TripStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/trips", post(create_trip).get(list_trips))
        .route("/trips/:id", get(get_trip))
        .route("/trips/:id/status", patch(update_trip_status))
        .route("/trips/:id/eligible-drivers", get(eligible_drivers))
        .route("/trips/:id/assign", post(assign))
        .route("/trips/:id/auto-assign", post(auto_assign))
        .route(
            "/trips/:id/delay-reports",
            post(create_delay_report).get(list_delay_reports),
        )
        .route("/assignments", get(list_assignments))
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct AssignRequest {
    pub driver_id: u64,
}

#[derive(Deserialize)]
pub struct DelayReportRequest {
    pub reason: String,
    #[serde(default)]
    pub custom_message: Option<String>,
}

#[derive(Serialize)]
pub struct AssignmentResponse {
    pub trip: Trip,
    pub driver: Driver,
    pub assignment: Assignment,
}

impl From<AssignmentOutcome> for AssignmentResponse {
    fn from(outcome: AssignmentOutcome) -> Self {
        Self {
            trip: outcome.trip,
            driver: outcome.driver,
            assignment: outcome.assignment,
        }
    }
}

#[derive(Serialize)]
pub struct StatusUpdateResponse {
    pub trip: Trip,
    pub delay_report: Option<DelayReport>,
}

async fn create_trip(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewTrip>,
) -> Result<Json<Trip>, AppError> {
    let trip = state.update_fleet(|fleet| fleet.create_trip(payload)).await?;
    info!(
        trip_id = trip.id,
        source = %trip.source,
        destination = %trip.destination,
        "trip created"
    );

    if let Some(reminder) = reminder_for(&trip, state.reminder_lead) {
        schedule_reminder(state.clone(), reminder);
    }

    Ok(Json(trip))
}

async fn list_trips(State(state): State<Arc<AppState>>) -> Json<Vec<Trip>> {
    Json(state.fleet.read().await.trips())
}

async fn get_trip(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Trip>, AppError> {
    let fleet = state.fleet.read().await;
    Ok(Json(fleet.trip(id)?.clone()))
}

async fn update_trip_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<StatusUpdateResponse>, AppError> {
    let status: TripStatus = payload.status.parse().map_err(AppError::Validation)?;
    let change = state
        .update_fleet(|fleet| fleet.update_status(id, status))
        .await?;

    info!(trip_id = id, from = %change.previous, to = %status, "trip status updated");

    if change.previous != status {
        state.publish(DispatchEvent::TripStatusChanged {
            trip_id: id,
            driver_id: change.trip.assigned_driver_id,
            from: change.previous,
            to: status,
        });
    }
    if let Some(report) = &change.delay_report {
        state.publish(DispatchEvent::DelayReported(report.clone()));
    }

    Ok(Json(StatusUpdateResponse {
        trip: change.trip,
        delay_report: change.delay_report,
    }))
}

async fn eligible_drivers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<Driver>>, AppError> {
    let fleet = state.fleet.read().await;
    let drivers = fleet.eligible_drivers(id)?.into_iter().cloned().collect();
    Ok(Json(drivers))
}

async fn assign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<AssignRequest>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let outcome = assign_trip(&state, id, payload.driver_id).await?;
    Ok(Json(outcome.into()))
}

async fn auto_assign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let outcome = auto_assign_trip(&state, id).await?;
    Ok(Json(outcome.into()))
}

async fn create_delay_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(payload): Json<DelayReportRequest>,
) -> Result<Json<DelayReport>, AppError> {
    let report = state
        .update_fleet(|fleet| fleet.file_delay_report(id, &payload.reason, payload.custom_message))
        .await?;

    info!(trip_id = id, reason = %report.reason, "delay report filed");
    state.publish(DispatchEvent::DelayReported(report.clone()));

    Ok(Json(report))
}

async fn list_delay_reports(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<DelayReport>>, AppError> {
    let fleet = state.fleet.read().await;
    Ok(Json(fleet.delay_reports_for(id)?))
}

async fn list_assignments(State(state): State<Arc<AppState>>) -> Json<Vec<Assignment>> {
    Json(state.fleet.read().await.assignments().to_vec())
}
