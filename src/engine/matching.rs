use crate::models::driver::Driver;
use crate::models::trip::Trip;

/// Picks a driver for `trip` out of already-eligible candidates.
///
/// A candidate parked at the trip's source wins; otherwise the first
/// candidate does. Ties keep candidate order, there is no secondary key.
pub fn select_best_driver<'a>(trip: &Trip, candidates: &[&'a Driver]) -> Option<&'a Driver> {
    candidates
        .iter()
        .find(|driver| driver.current_location == trip.source)
        .or_else(|| candidates.first())
        .copied()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::select_best_driver;
    use crate::models::driver::Driver;
    use crate::models::trip::{Trip, TripStatus};

    fn trip(source: &str) -> Trip {
        Trip {
            id: 1,
            source: source.to_string(),
            destination: "City D".to_string(),
            intermediate_destinations: Vec::new(),
            tonnage: 5.0,
            status: TripStatus::Pending,
            assigned_driver_id: None,
            scheduled_at: None,
            started_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn driver(id: u64, at: &str) -> Driver {
        Driver {
            id,
            name: format!("driver-{id}"),
            current_location: at.to_string(),
            route: vec!["City A".to_string(), "City D".to_string()],
            vehicle_capacity: 20.0,
            vehicle_tonnage_used: 0.0,
            assigned_trips: Vec::new(),
        }
    }

    #[test]
    fn prefers_driver_at_trip_source() {
        let far = driver(1, "City D");
        let near = driver(2, "City A");
        let chosen = select_best_driver(&trip("City A"), &[&far, &near]).unwrap();
        assert_eq!(chosen.id, 2);
    }

    #[test]
    fn falls_back_to_first_candidate() {
        let a = driver(4, "City X");
        let b = driver(5, "City Y");
        let chosen = select_best_driver(&trip("City A"), &[&a, &b]).unwrap();
        assert_eq!(chosen.id, 4);
    }

    #[test]
    fn ties_at_source_keep_candidate_order() {
        let first = driver(9, "City A");
        let second = driver(3, "City A");
        let chosen = select_best_driver(&trip("City A"), &[&first, &second]).unwrap();
        assert_eq!(chosen.id, 9);
    }

    #[test]
    fn no_candidates_yields_none() {
        assert!(select_best_driver(&trip("City A"), &[]).is_none());
    }
}
