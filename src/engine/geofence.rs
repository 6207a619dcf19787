use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::AppError;
use crate::geo::haversine_m;
use crate::models::geofence::{Geofence, GeofenceTimeCheck, GeofenceViolation, default_name};
use crate::models::location::GeoPoint;
use crate::models::trip::Trip;
use crate::storage::{self, GEOFENCES_KEY, KeyValueStore};

/// Evaluates `point` against every geofence. A point is in violation when
/// it lies strictly farther from the center than the radius.
pub fn check_violations<'a, I>(point: &GeoPoint, geofences: I) -> Vec<GeofenceViolation>
where
    I: IntoIterator<Item = &'a Geofence>,
{
    geofences
        .into_iter()
        .map(|geofence| {
            let distance_m = haversine_m(point, &geofence.center);
            GeofenceViolation {
                geofence_id: geofence.id,
                geofence_name: geofence.name.clone(),
                distance_m,
                is_violation: distance_m > geofence.radius_m,
            }
        })
        .collect()
}

/// Measures how long `trip` has been In-Route against every geofence that
/// carries a time limit. The limit is exceeded once the elapsed time is
/// strictly greater than it. A trip that never started yields nothing.
pub fn check_time_limits<'a, I>(
    trip: &Trip,
    now: DateTime<Utc>,
    geofences: I,
) -> Vec<GeofenceTimeCheck>
where
    I: IntoIterator<Item = &'a Geofence>,
{
    let Some(started_at) = trip.started_at else {
        return Vec::new();
    };
    let elapsed_minutes = (now - started_at).num_milliseconds() as f64 / 60_000.0;

    geofences
        .into_iter()
        .filter_map(|geofence| {
            let limit = geofence.time_limit_minutes?;
            Some(GeofenceTimeCheck {
                geofence_id: geofence.id,
                geofence_name: geofence.name.clone(),
                trip_id: trip.id,
                time_limit_minutes: limit,
                elapsed_minutes,
                exceeded: elapsed_minutes > f64::from(limit),
            })
        })
        .collect()
}

/// Form fields for creating or editing a geofence.
#[derive(Debug, Clone, Deserialize)]
pub struct GeofenceInput {
    pub center: GeoPoint,
    pub radius_m: f64,
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
}

impl GeofenceInput {
    fn validate(&self) -> Result<(), AppError> {
        if !self.center.is_valid() {
            return Err(AppError::Validation(format!(
                "center ({}, {}) is not a valid coordinate",
                self.center.lat, self.center.lng
            )));
        }
        if !self.radius_m.is_finite() || self.radius_m <= 0.0 {
            return Err(AppError::Validation("radius must be greater than 0".to_string()));
        }
        if self.time_limit_minutes == Some(0) {
            return Err(AppError::Validation(
                "time limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    fn resolved_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_name(&self.center),
        }
    }
}

/// The geofence collection, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct GeofenceBook {
    geofences: BTreeMap<u64, Geofence>,
}

impl GeofenceBook {
    pub fn from_geofences(geofences: impl IntoIterator<Item = Geofence>) -> Self {
        Self {
            geofences: geofences.into_iter().map(|g| (g.id, g)).collect(),
        }
    }

    pub fn load(store: &dyn KeyValueStore) -> storage::Result<Self> {
        let geofences: Vec<Geofence> = storage::load_collection(store, GEOFENCES_KEY)?;
        Ok(Self::from_geofences(geofences))
    }

    pub fn persist(&self, store: &dyn KeyValueStore) -> storage::Result<()> {
        storage::save_collection(store, GEOFENCES_KEY, &self.list())
    }

    pub fn len(&self) -> usize {
        self.geofences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geofences.is_empty()
    }

    pub fn list(&self) -> Vec<Geofence> {
        self.geofences.values().cloned().collect()
    }

    pub fn create(&mut self, input: GeofenceInput) -> Result<Geofence, AppError> {
        input.validate()?;

        let id = self.geofences.keys().next_back().map_or(1, |last| last + 1);
        let geofence = Geofence {
            id,
            name: input.resolved_name(),
            center: input.center,
            radius_m: input.radius_m,
            time_limit_minutes: input.time_limit_minutes,
        };

        self.geofences.insert(id, geofence.clone());
        Ok(geofence)
    }

    pub fn update(&mut self, id: u64, input: GeofenceInput) -> Result<Geofence, AppError> {
        input.validate()?;

        let geofence = self
            .geofences
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("geofence {id} not found")))?;

        geofence.name = input.resolved_name();
        geofence.center = input.center;
        geofence.radius_m = input.radius_m;
        geofence.time_limit_minutes = input.time_limit_minutes;

        Ok(geofence.clone())
    }

    pub fn delete(&mut self, id: u64) -> Result<Geofence, AppError> {
        self.geofences
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("geofence {id} not found")))
    }

    pub fn check(&self, point: &GeoPoint) -> Vec<GeofenceViolation> {
        check_violations(point, self.geofences.values())
    }

    pub fn check_time_limits(&self, trip: &Trip, now: DateTime<Utc>) -> Vec<GeofenceTimeCheck> {
        check_time_limits(trip, now, self.geofences.values())
    }
}
