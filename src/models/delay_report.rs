use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const AUTO_DELAY_REASON: &str = "Trip delay";
pub const AUTO_DELAY_MESSAGE: &str = "Trip status marked as delayed";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayReport {
    pub id: Uuid,
    pub trip_id: u64,
    pub driver_id: Option<u64>,
    pub reason: String,
    pub custom_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One row of the per-driver delay report summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriverReportSummary {
    pub driver_id: u64,
    pub driver_name: String,
    pub total_reports: usize,
}
