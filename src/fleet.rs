//! In-memory fleet: trips, drivers, the assignment log and delay reports.
//!
//! All mutation goes through the command methods on [`Fleet`], which check
//! every precondition before touching state so a failed command leaves the
//! fleet unchanged.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::eligibility::{self, missing_waypoints};
use crate::engine::matching::select_best_driver;
use crate::error::AppError;
use crate::models::assignment::{Assignment, AssignmentStrategy};
use crate::models::delay_report::{
    AUTO_DELAY_MESSAGE, AUTO_DELAY_REASON, DelayReport, DriverReportSummary,
};
use crate::models::driver::Driver;
use crate::models::trip::{Trip, TripStatus};
use crate::storage::{
    self, ASSIGNMENTS_KEY, DELAY_REPORTS_KEY, DRIVERS_KEY, KeyValueStore, TRIPS_KEY,
};

#[derive(Debug, Clone, Deserialize)]
pub struct NewTrip {
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub intermediate_destinations: Vec<String>,
    pub tonnage: f64,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDriver {
    pub name: String,
    pub current_location: String,
    pub route: Vec<String>,
    pub vehicle_capacity: f64,
    #[serde(default)]
    pub vehicle_tonnage_used: f64,
}

/// Result of a successful assignment.
#[derive(Debug, Clone)]
pub struct AssignmentOutcome {
    pub trip: Trip,
    pub driver: Driver,
    pub assignment: Assignment,
}

/// Result of a status update; `delay_report` is set when the trip moved to
/// `Delayed`.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub trip: Trip,
    pub previous: TripStatus,
    pub delay_report: Option<DelayReport>,
}

#[derive(Debug, Clone, Default)]
pub struct Fleet {
    trips: BTreeMap<u64, Trip>,
    drivers: BTreeMap<u64, Driver>,
    assignments: Vec<Assignment>,
    delay_reports: Vec<DelayReport>,
}

impl Fleet {
    pub fn from_parts(
        trips: Vec<Trip>,
        drivers: Vec<Driver>,
        assignments: Vec<Assignment>,
        delay_reports: Vec<DelayReport>,
    ) -> Self {
        Self {
            trips: trips.into_iter().map(|t| (t.id, t)).collect(),
            drivers: drivers.into_iter().map(|d| (d.id, d)).collect(),
            assignments,
            delay_reports,
        }
    }

    pub fn load(store: &dyn KeyValueStore) -> storage::Result<Self> {
        Ok(Self::from_parts(
            storage::load_collection(store, TRIPS_KEY)?,
            storage::load_collection(store, DRIVERS_KEY)?,
            storage::load_collection(store, ASSIGNMENTS_KEY)?,
            storage::load_collection(store, DELAY_REPORTS_KEY)?,
        ))
    }

    /// Writes every collection back under its key in one batch, replacing
    /// what was there.
    pub fn persist(&self, store: &dyn KeyValueStore) -> storage::Result<()> {
        store.set_many(vec![
            storage::encode_collection(TRIPS_KEY, &self.trips())?,
            storage::encode_collection(DRIVERS_KEY, &self.drivers())?,
            storage::encode_collection(ASSIGNMENTS_KEY, &self.assignments)?,
            storage::encode_collection(DELAY_REPORTS_KEY, &self.delay_reports)?,
        ])
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty() && self.drivers.is_empty()
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    pub fn driver_count(&self) -> usize {
        self.drivers.len()
    }

    pub fn trips(&self) -> Vec<Trip> {
        self.trips.values().cloned().collect()
    }

    pub fn drivers(&self) -> Vec<Driver> {
        self.drivers.values().cloned().collect()
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn delay_reports_for(&self, trip_id: u64) -> Result<Vec<DelayReport>, AppError> {
        self.trip(trip_id)?;
        Ok(self
            .delay_reports
            .iter()
            .filter(|report| report.trip_id == trip_id)
            .cloned()
            .collect())
    }

    pub fn delay_reports_for_driver(&self, driver_id: u64) -> Result<Vec<DelayReport>, AppError> {
        self.driver(driver_id)?;
        Ok(self
            .delay_reports
            .iter()
            .filter(|report| report.driver_id == Some(driver_id))
            .cloned()
            .collect())
    }

    /// Every driver with their delay report count, most reports first. Ties
    /// keep id order.
    pub fn driver_report_summary(&self) -> Vec<DriverReportSummary> {
        let mut summary: Vec<DriverReportSummary> = self
            .drivers
            .values()
            .map(|driver| DriverReportSummary {
                driver_id: driver.id,
                driver_name: driver.name.clone(),
                total_reports: self
                    .delay_reports
                    .iter()
                    .filter(|report| report.driver_id == Some(driver.id))
                    .count(),
            })
            .collect();
        summary.sort_by(|a, b| b.total_reports.cmp(&a.total_reports));
        summary
    }

    /// The driver's trip currently In-Route, lowest id first if there are
    /// several.
    pub fn active_trip_for(&self, driver_id: u64) -> Option<&Trip> {
        self.trips.values().find(|trip| {
            trip.assigned_driver_id == Some(driver_id) && trip.status == TripStatus::InRoute
        })
    }

    pub fn trip(&self, id: u64) -> Result<&Trip, AppError> {
        self.trips
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("trip {id} not found")))
    }

    pub fn driver(&self, id: u64) -> Result<&Driver, AppError> {
        self.drivers
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("driver {id} not found")))
    }

    pub fn create_trip(&mut self, new_trip: NewTrip) -> Result<Trip, AppError> {
        let source = required_place("source", &new_trip.source)?;
        let destination = required_place("destination", &new_trip.destination)?;
        let intermediate_destinations = new_trip
            .intermediate_destinations
            .iter()
            .map(|stop| required_place("intermediate destination", stop))
            .collect::<Result<Vec<_>, _>>()?;

        if !new_trip.tonnage.is_finite() || new_trip.tonnage <= 0.0 {
            return Err(AppError::Validation("tonnage must be > 0".to_string()));
        }

        let now = Utc::now();
        let trip = Trip {
            id: next_id(&self.trips),
            source,
            destination,
            intermediate_destinations,
            tonnage: new_trip.tonnage,
            status: TripStatus::Pending,
            assigned_driver_id: None,
            scheduled_at: new_trip.scheduled_at,
            started_at: None,
            created_at: now,
            updated_at: now,
        };

        self.trips.insert(trip.id, trip.clone());
        Ok(trip)
    }

    pub fn create_driver(&mut self, new_driver: NewDriver) -> Result<Driver, AppError> {
        let name = new_driver.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("name cannot be empty".to_string()));
        }
        let current_location = required_place("current location", &new_driver.current_location)?;
        if new_driver.route.is_empty() {
            return Err(AppError::Validation("route cannot be empty".to_string()));
        }
        let route = new_driver
            .route
            .iter()
            .map(|stop| required_place("route stop", stop))
            .collect::<Result<Vec<_>, _>>()?;

        if !new_driver.vehicle_capacity.is_finite() || new_driver.vehicle_capacity <= 0.0 {
            return Err(AppError::Validation("vehicle capacity must be > 0".to_string()));
        }
        if !new_driver.vehicle_tonnage_used.is_finite()
            || new_driver.vehicle_tonnage_used < 0.0
            || new_driver.vehicle_tonnage_used > new_driver.vehicle_capacity
        {
            return Err(AppError::Validation(
                "tonnage used must be between 0 and vehicle capacity".to_string(),
            ));
        }

        let driver = Driver {
            id: next_id(&self.drivers),
            name: name.to_string(),
            current_location,
            route,
            vehicle_capacity: new_driver.vehicle_capacity,
            vehicle_tonnage_used: new_driver.vehicle_tonnage_used,
            assigned_trips: Vec::new(),
        };

        self.drivers.insert(driver.id, driver.clone());
        Ok(driver)
    }

    /// Drivers (in id order) able to take the trip right now.
    pub fn eligible_drivers(&self, trip_id: u64) -> Result<Vec<&Driver>, AppError> {
        let trip = self.trip(trip_id)?;
        Ok(eligibility::eligible_drivers(trip, self.drivers.values()))
    }

    pub fn assign(
        &mut self,
        trip_id: u64,
        driver_id: u64,
        strategy: AssignmentStrategy,
    ) -> Result<AssignmentOutcome, AppError> {
        let trip = self
            .trips
            .get(&trip_id)
            .ok_or_else(|| AppError::InvalidReference(format!("trip {trip_id} does not exist")))?;
        let driver = self.drivers.get(&driver_id).ok_or_else(|| {
            AppError::InvalidReference(format!("driver {driver_id} does not exist"))
        })?;

        if trip.assigned_driver_id.is_some()
            || trip.status == TripStatus::Delivered
            || eligibility::already_carries(driver, trip)
        {
            return Err(AppError::AlreadyAssigned(trip_id));
        }

        let missing = missing_waypoints(driver, trip);
        if !missing.is_empty() {
            return Err(AppError::RouteMismatch(format!(
                "driver {driver_id} route does not include {}",
                missing.join(", ")
            )));
        }

        if !eligibility::has_capacity(driver, trip) {
            return Err(AppError::InsufficientCapacity(format!(
                "driver {driver_id} has {} t free, trip {trip_id} needs {} t",
                driver.remaining_capacity(),
                trip.tonnage
            )));
        }

        let now = Utc::now();
        let tonnage = trip.tonnage;

        let (Some(trip), Some(driver)) =
            (self.trips.get_mut(&trip_id), self.drivers.get_mut(&driver_id))
        else {
            return Err(AppError::Internal(
                "fleet entry vanished during assignment".to_string(),
            ));
        };

        trip.assigned_driver_id = Some(driver_id);
        trip.status = TripStatus::Assigned;
        trip.updated_at = now;

        driver.vehicle_tonnage_used += tonnage;
        driver.assigned_trips.push(trip_id);

        let assignment = Assignment {
            id: Uuid::new_v4(),
            trip_id,
            driver_id,
            strategy,
            tonnage,
            assigned_at: now,
        };
        self.assignments.push(assignment.clone());

        Ok(AssignmentOutcome {
            trip: trip.clone(),
            driver: driver.clone(),
            assignment,
        })
    }

    /// Assigns the trip to the best eligible driver.
    pub fn auto_assign(&mut self, trip_id: u64) -> Result<AssignmentOutcome, AppError> {
        let trip = self.trip(trip_id)?;
        if trip.assigned_driver_id.is_some() || trip.status == TripStatus::Delivered {
            return Err(AppError::AlreadyAssigned(trip_id));
        }

        let candidates = self.eligible_drivers(trip_id)?;
        let driver_id = select_best_driver(trip, &candidates)
            .map(|driver| driver.id)
            .ok_or(AppError::NoSuitableDriver(trip_id))?;

        self.assign(trip_id, driver_id, AssignmentStrategy::BestDriver)
    }

    pub fn update_status(
        &mut self,
        trip_id: u64,
        status: TripStatus,
    ) -> Result<StatusChange, AppError> {
        let trip = self.trip(trip_id)?;
        let previous = trip.status;

        if previous == TripStatus::Delivered && status != TripStatus::Delivered {
            return Err(AppError::InvalidTransition(format!(
                "trip {trip_id} is already delivered"
            )));
        }
        match (status, trip.assigned_driver_id) {
            (TripStatus::Pending, Some(driver_id)) => {
                return Err(AppError::InvalidTransition(format!(
                    "trip {trip_id} is assigned to driver {driver_id} and cannot return to Pending"
                )));
            }
            (TripStatus::Assigned, None) => {
                return Err(AppError::InvalidTransition(format!(
                    "trip {trip_id} has no driver; assign it instead"
                )));
            }
            _ => {}
        }

        let driver_id = trip.assigned_driver_id;
        let now = Utc::now();

        let newly_delayed = status == TripStatus::Delayed && previous != TripStatus::Delayed;
        let delay_report = newly_delayed.then(|| DelayReport {
            id: Uuid::new_v4(),
            trip_id,
            driver_id,
            reason: AUTO_DELAY_REASON.to_string(),
            custom_message: Some(AUTO_DELAY_MESSAGE.to_string()),
            created_at: now,
        });
        if let Some(report) = &delay_report {
            self.delay_reports.push(report.clone());
        }

        let trip = self
            .trips
            .get_mut(&trip_id)
            .ok_or_else(|| AppError::NotFound(format!("trip {trip_id} not found")))?;
        trip.status = status;
        trip.updated_at = now;
        if status == TripStatus::InRoute && trip.started_at.is_none() {
            trip.started_at = Some(now);
        }

        Ok(StatusChange {
            trip: trip.clone(),
            previous,
            delay_report,
        })
    }

    pub fn file_delay_report(
        &mut self,
        trip_id: u64,
        reason: &str,
        custom_message: Option<String>,
    ) -> Result<DelayReport, AppError> {
        let trip = self.trip(trip_id)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation("reason cannot be empty".to_string()));
        }

        let report = DelayReport {
            id: Uuid::new_v4(),
            trip_id,
            driver_id: trip.assigned_driver_id,
            reason: reason.to_string(),
            custom_message: custom_message.filter(|msg| !msg.trim().is_empty()),
            created_at: Utc::now(),
        };

        self.delay_reports.push(report.clone());
        Ok(report)
    }
}

fn next_id<T>(entries: &BTreeMap<u64, T>) -> u64 {
    entries.keys().next_back().map_or(1, |last| last + 1)
}

fn required_place(field: &str, raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}
