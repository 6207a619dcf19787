use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TripStatus {
    Pending,
    Assigned,
    #[serde(rename = "In-Route")]
    InRoute,
    Delivered,
    Delayed,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Pending => "Pending",
            TripStatus::Assigned => "Assigned",
            TripStatus::InRoute => "In-Route",
            TripStatus::Delivered => "Delivered",
            TripStatus::Delayed => "Delayed",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripStatus {
    type Err = String;

    /// Accepts the display names plus the loose spellings drivers type into
    /// the status form ("in route", "InRoute", "delayed").
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "pending" => Ok(TripStatus::Pending),
            "assigned" => Ok(TripStatus::Assigned),
            "inroute" => Ok(TripStatus::InRoute),
            "delivered" => Ok(TripStatus::Delivered),
            "delayed" => Ok(TripStatus::Delayed),
            _ => Err(format!(
                "unknown trip status: {raw}, expected Pending/Assigned/In-Route/Delivered/Delayed"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: u64,
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub intermediate_destinations: Vec<String>,
    pub tonnage: f64,
    pub status: TripStatus,
    #[serde(default)]
    pub assigned_driver_id: Option<u64>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// First time the trip went In-Route.
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    /// Every place the driver's route has to pass through.
    pub fn required_stops(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.source.as_str())
            .chain(std::iter::once(self.destination.as_str()))
            .chain(self.intermediate_destinations.iter().map(String::as_str))
    }
}
