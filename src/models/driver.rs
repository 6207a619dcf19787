use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: u64,
    pub name: String,
    pub current_location: String,
    pub route: Vec<String>,
    pub vehicle_capacity: f64,
    pub vehicle_tonnage_used: f64,
    #[serde(default)]
    pub assigned_trips: Vec<u64>,
}

impl Driver {
    pub fn remaining_capacity(&self) -> f64 {
        self.vehicle_capacity - self.vehicle_tonnage_used
    }

    pub fn serves(&self, place: &str) -> bool {
        self.route.iter().any(|stop| stop == place)
    }

    pub fn utilization(&self) -> f64 {
        if self.vehicle_capacity <= 0.0 {
            return 0.0;
        }
        (self.vehicle_tonnage_used / self.vehicle_capacity).clamp(0.0, 1.0)
    }
}
