use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStrategy {
    Manual,
    BestDriver,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub trip_id: u64,
    pub driver_id: u64,
    pub strategy: AssignmentStrategy,
    pub tonnage: f64,
    pub assigned_at: DateTime<Utc>,
}
