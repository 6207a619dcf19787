use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use crate::engine::geofence::GeofenceBook;
use crate::error::AppError;
use crate::events::DispatchEvent;
use crate::fleet::Fleet;
use crate::models::geofence::{GeofenceTimeCheck, GeofenceViolation};
use crate::models::location::{DriverLocation, GeoPoint};
use crate::observability::metrics::Metrics;
use crate::seed;
use crate::storage::{self, DRIVER_UPDATES_KEY, KeyValueStore};

/// Everything a location report produced.
#[derive(Debug, Clone)]
pub struct LocationCheck {
    pub location: DriverLocation,
    pub geofences: Vec<GeofenceViolation>,
    /// Empty unless the driver has a trip In-Route.
    pub time_limits: Vec<GeofenceTimeCheck>,
}

pub struct AppState {
    pub fleet: RwLock<Fleet>,
    pub geofences: RwLock<GeofenceBook>,
    pub locations: RwLock<BTreeMap<u64, DriverLocation>>,
    pub store: Arc<dyn KeyValueStore>,
    pub events_tx: broadcast::Sender<DispatchEvent>,
    pub metrics: Metrics,
    pub reminder_lead: Duration,
}

impl AppState {
    /// Builds the state from whatever the store already holds.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        event_buffer_size: usize,
        reminder_lead_minutes: i64,
    ) -> Result<Self, AppError> {
        let fleet = Fleet::load(store.as_ref())?;
        let geofences = GeofenceBook::load(store.as_ref())?;
        let locations: Vec<DriverLocation> =
            storage::load_collection(store.as_ref(), DRIVER_UPDATES_KEY)?;

        info!(
            trips = fleet.trip_count(),
            drivers = fleet.driver_count(),
            geofences = geofences.len(),
            "state loaded"
        );

        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);
        let metrics = Metrics::new();
        for driver in fleet.drivers() {
            metrics.observe_driver(&driver);
        }

        Ok(Self {
            fleet: RwLock::new(fleet),
            geofences: RwLock::new(geofences),
            locations: RwLock::new(locations.into_iter().map(|l| (l.driver_id, l)).collect()),
            store,
            events_tx,
            metrics,
            reminder_lead: Duration::minutes(reminder_lead_minutes),
        })
    }

    /// Runs `command` against a working copy of the fleet under the write
    /// lock. The copy replaces the live fleet only once it has been saved.
    pub async fn update_fleet<T, F>(&self, command: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Fleet) -> Result<T, AppError>,
    {
        let mut fleet = self.fleet.write().await;
        let mut draft = fleet.clone();
        let output = command(&mut draft)?;
        draft.persist(self.store.as_ref())?;
        *fleet = draft;
        Ok(output)
    }

    /// Same as [`AppState::update_fleet`] for the geofence collection.
    pub async fn update_geofences<T, F>(&self, command: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut GeofenceBook) -> Result<T, AppError>,
    {
        let mut geofences = self.geofences.write().await;
        let mut draft = geofences.clone();
        let output = command(&mut draft)?;
        draft.persist(self.store.as_ref())?;
        *geofences = draft;
        Ok(output)
    }

    /// Stores the driver's latest position and evaluates it against every
    /// geofence, plus the geofence time limits when the driver has a trip
    /// In-Route. The location map stays write-locked until the snapshot is
    /// saved, so concurrent reports persist in order.
    pub async fn record_location(
        &self,
        driver_id: u64,
        location: GeoPoint,
    ) -> Result<LocationCheck, AppError> {
        if !location.is_valid() {
            return Err(AppError::Validation(format!(
                "({}, {}) is not a valid coordinate",
                location.lat, location.lng
            )));
        }
        let active_trip = {
            let fleet = self.fleet.read().await;
            fleet.driver(driver_id)?;
            fleet.active_trip_for(driver_id).cloned()
        };

        let update = DriverLocation {
            driver_id,
            location,
            recorded_at: Utc::now(),
        };
        {
            let mut locations = self.locations.write().await;
            let mut draft = locations.clone();
            draft.insert(driver_id, update.clone());
            let snapshot: Vec<DriverLocation> = draft.values().cloned().collect();
            storage::save_collection(self.store.as_ref(), DRIVER_UPDATES_KEY, &snapshot)?;
            *locations = draft;
        }

        let geofences = self.check_geofences(&location).await;
        for violation in geofences.iter().filter(|r| r.is_violation) {
            self.publish(DispatchEvent::GeofenceViolation {
                driver_id,
                violation: violation.clone(),
            });
        }

        let time_limits = match &active_trip {
            Some(trip) => self
                .geofences
                .read()
                .await
                .check_time_limits(trip, update.recorded_at),
            None => Vec::new(),
        };
        for check in time_limits.iter().filter(|c| c.exceeded) {
            warn!(
                driver_id,
                trip_id = check.trip_id,
                geofence_id = check.geofence_id,
                elapsed_minutes = check.elapsed_minutes,
                limit_minutes = check.time_limit_minutes,
                "geofence time limit exceeded"
            );
            self.publish(DispatchEvent::GeofenceTimeLimitExceeded {
                driver_id,
                check: check.clone(),
            });
        }

        Ok(LocationCheck {
            location: update,
            geofences,
            time_limits,
        })
    }

    pub async fn latest_location(&self, driver_id: u64) -> Result<DriverLocation, AppError> {
        self.locations
            .read()
            .await
            .get(&driver_id)
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("no location reported for driver {driver_id}"))
            })
    }

    pub async fn check_geofences(&self, point: &GeoPoint) -> Vec<GeofenceViolation> {
        let results = self.geofences.read().await.check(point);
        self.metrics.observe_geofence_check(&results);
        results
    }

    /// Fills an empty store with the demo trips, drivers and geofences.
    pub async fn seed_if_empty(&self) -> Result<bool, AppError> {
        let seeded_fleet = self
            .update_fleet(|fleet| {
                if !fleet.is_empty() {
                    return Ok(false);
                }
                *fleet = seed::demo_fleet();
                Ok(true)
            })
            .await?;

        if seeded_fleet {
            for driver in self.fleet.read().await.drivers() {
                self.metrics.observe_driver(&driver);
            }
        }

        let seeded_geofences = self
            .update_geofences(|geofences| {
                if !geofences.is_empty() {
                    return Ok(false);
                }
                *geofences = seed::demo_geofences();
                Ok(true)
            })
            .await?;

        info!(seeded_fleet, seeded_geofences, "demo data check finished");
        Ok(seeded_fleet || seeded_geofences)
    }

    pub fn publish(&self, event: DispatchEvent) {
        if self.events_tx.send(event).is_err() {
            debug!("no event subscribers");
        }
    }
}
