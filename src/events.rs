use serde::Serialize;

use crate::engine::reminder::Reminder;
use crate::models::assignment::Assignment;
use crate::models::delay_report::DelayReport;
use crate::models::geofence::{GeofenceTimeCheck, GeofenceViolation};
use crate::models::trip::TripStatus;

/// Everything pushed to `/ws` subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchEvent {
    TripAssigned(Assignment),
    TripStatusChanged {
        trip_id: u64,
        driver_id: Option<u64>,
        from: TripStatus,
        to: TripStatus,
    },
    DelayReported(DelayReport),
    GeofenceViolation {
        driver_id: u64,
        #[serde(flatten)]
        violation: GeofenceViolation,
    },
    GeofenceTimeLimitExceeded {
        driver_id: u64,
        #[serde(flatten)]
        check: GeofenceTimeCheck,
    },
    TripReminder {
        driver_id: Option<u64>,
        #[serde(flatten)]
        reminder: Reminder,
    },
}

impl DispatchEvent {
    pub fn driver_id(&self) -> Option<u64> {
        match self {
            DispatchEvent::TripAssigned(assignment) => Some(assignment.driver_id),
            DispatchEvent::TripStatusChanged { driver_id, .. }
            | DispatchEvent::TripReminder { driver_id, .. } => *driver_id,
            DispatchEvent::DelayReported(report) => report.driver_id,
            DispatchEvent::GeofenceViolation { driver_id, .. }
            | DispatchEvent::GeofenceTimeLimitExceeded { driver_id, .. } => Some(*driver_id),
        }
    }
}
