use serde::{Deserialize, Serialize};

use crate::models::location::GeoPoint;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geofence {
    pub id: u64,
    pub name: String,
    pub center: GeoPoint,
    pub radius_m: f64,
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeofenceViolation {
    pub geofence_id: u64,
    pub geofence_name: String,
    pub distance_m: f64,
    pub is_violation: bool,
}

/// How long the driver's In-Route trip has been running against a
/// geofence's time limit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeofenceTimeCheck {
    pub geofence_id: u64,
    pub geofence_name: String,
    pub trip_id: u64,
    pub time_limit_minutes: u32,
    pub elapsed_minutes: f64,
    pub exceeded: bool,
}

pub fn default_name(center: &GeoPoint) -> String {
    format!("Geofence_{}_{}", center.lat, center.lng)
}
