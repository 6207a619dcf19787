//! Demo data loaded into an empty store: five trips and five drivers on the
//! lettered test network, plus four geofences along the Kolkata to
//! Bhubaneswar corridor.

use chrono::Utc;

use crate::engine::geofence::GeofenceBook;
use crate::fleet::Fleet;
use crate::models::driver::Driver;
use crate::models::geofence::Geofence;
use crate::models::location::GeoPoint;
use crate::models::trip::{Trip, TripStatus};

pub fn demo_fleet() -> Fleet {
    let trips = vec![
        trip(1, "City A", "City D", &["City B"], 5.0),
        trip(2, "City B", "City E", &["City C"], 8.0),
        trip(3, "City F", "City G", &[], 7.0),
        trip(4, "City A", "City C", &["City B"], 6.0),
        trip(5, "City H", "City I", &[], 9.0),
    ];

    let drivers = vec![
        driver(1, "John Doe", "City A", &["City A", "City B", "City D"], 20.0, 10.0),
        driver(2, "Jane Smith", "City B", &["City B", "City C", "City E"], 15.0, 5.0),
        driver(3, "Alice Johnson", "City F", &["City F", "City G"], 25.0, 10.0),
        driver(4, "Bob Brown", "City H", &["City H", "City I"], 18.0, 9.0),
        driver(5, "Charlie Green", "City A", &["City A", "City B", "City C", "City D"], 22.0, 12.0),
    ];

    Fleet::from_parts(trips, drivers, Vec::new(), Vec::new())
}

pub fn demo_geofences() -> GeofenceBook {
    GeofenceBook::from_geofences([
        geofence(1, "Kolkata Geofence", 22.5726, 88.3639, 1_000.0, 30),
        geofence(2, "Kharagpur Geofence", 21.9146, 87.3294, 1_500.0, 40),
        geofence(3, "Balasore Geofence", 21.4935, 86.9337, 800.0, 20),
        geofence(4, "Bhubaneswar Geofence", 20.2961, 85.8245, 1_200.0, 60),
    ])
}

fn trip(id: u64, source: &str, destination: &str, via: &[&str], tonnage: f64) -> Trip {
    let now = Utc::now();
    Trip {
        id,
        source: source.to_string(),
        destination: destination.to_string(),
        intermediate_destinations: via.iter().map(|s| s.to_string()).collect(),
        tonnage,
        status: TripStatus::Pending,
        assigned_driver_id: None,
        scheduled_at: None,
        started_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn driver(id: u64, name: &str, at: &str, route: &[&str], capacity: f64, used: f64) -> Driver {
    Driver {
        id,
        name: name.to_string(),
        current_location: at.to_string(),
        route: route.iter().map(|s| s.to_string()).collect(),
        vehicle_capacity: capacity,
        vehicle_tonnage_used: used,
        assigned_trips: Vec::new(),
    }
}

fn geofence(id: u64, name: &str, lat: f64, lng: f64, radius_m: f64, minutes: u32) -> Geofence {
    Geofence {
        id,
        name: name.to_string(),
        center: GeoPoint { lat, lng },
        radius_m,
        time_limit_minutes: Some(minutes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trip_one_matches_john_and_charlie() {
        let fleet = demo_fleet();
        let ids: Vec<u64> = fleet
            .eligible_drivers(1)
            .unwrap()
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![1, 5]);
    }

    #[test]
    fn demo_geofences_are_ordered() {
        let ids: Vec<u64> = demo_geofences().list().iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }
}
