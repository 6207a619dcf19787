use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::events::DispatchEvent;
use crate::models::trip::{Trip, TripStatus};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reminder {
    pub trip_id: u64,
    pub fire_at: DateTime<Utc>,
    pub message: String,
}

/// Reminder for a scheduled trip, due `lead` before it starts.
pub fn reminder_for(trip: &Trip, lead: Duration) -> Option<Reminder> {
    let starts_at = trip.scheduled_at?;
    Some(Reminder {
        trip_id: trip.id,
        fire_at: starts_at - lead,
        message: format!(
            "Trip {} from {} to {} starts at {}",
            trip.id,
            trip.source,
            trip.destination,
            starts_at.format("%Y-%m-%d %H:%M UTC")
        ),
    })
}

/// Spawns a timer that publishes the reminder when due. Reminders whose fire
/// time has already passed are dropped. There is no way to cancel a timer
/// once started; it checks the trip again when it wakes up.
pub fn schedule_reminder(state: Arc<AppState>, reminder: Reminder) -> Option<JoinHandle<()>> {
    let delay = match (reminder.fire_at - Utc::now()).to_std() {
        Ok(delay) => delay,
        Err(_) => {
            debug!(
                trip_id = reminder.trip_id,
                fire_at = %reminder.fire_at,
                "reminder time already passed"
            );
            return None;
        }
    };

    info!(trip_id = reminder.trip_id, fire_at = %reminder.fire_at, "trip reminder scheduled");

    Some(tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        fire(&state, reminder).await;
    }))
}

async fn fire(state: &AppState, reminder: Reminder) {
    let trip = {
        let fleet = state.fleet.read().await;
        fleet
            .trip(reminder.trip_id)
            .map(|trip| (trip.status, trip.assigned_driver_id))
            .ok()
    };

    match trip {
        Some((TripStatus::Delivered, _)) | None => {
            debug!(trip_id = reminder.trip_id, "skipping reminder for finished or unknown trip");
        }
        Some((_, driver_id)) => {
            info!(trip_id = reminder.trip_id, message = %reminder.message, "trip reminder fired");
            state.publish(DispatchEvent::TripReminder { driver_id, reminder });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use super::{Reminder, reminder_for, schedule_reminder};
    use crate::events::DispatchEvent;
    use crate::models::assignment::AssignmentStrategy;
    use crate::models::trip::{Trip, TripStatus};
    use crate::state::AppState;
    use crate::storage::MemoryStore;

    fn trip(scheduled_at: Option<chrono::DateTime<Utc>>) -> Trip {
        Trip {
            id: 3,
            source: "City F".to_string(),
            destination: "City G".to_string(),
            intermediate_destinations: Vec::new(),
            tonnage: 7.0,
            status: TripStatus::Pending,
            assigned_driver_id: None,
            scheduled_at,
            started_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn fires_thirty_minutes_before_start() {
        let start = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        let reminder = reminder_for(&trip(Some(start)), Duration::minutes(30)).unwrap();

        assert_eq!(reminder.trip_id, 3);
        assert_eq!(reminder.fire_at, Utc.with_ymd_and_hms(2026, 3, 14, 8, 30, 0).unwrap());
        assert_eq!(
            reminder.message,
            "Trip 3 from City F to City G starts at 2026-03-14 09:00 UTC"
        );
    }

    #[test]
    fn unscheduled_trip_has_no_reminder() {
        assert!(reminder_for(&trip(None), Duration::minutes(30)).is_none());
    }

    async fn seeded_state() -> Arc<AppState> {
        let state = Arc::new(AppState::new(Arc::new(MemoryStore::new()), 16, 30).unwrap());
        state.seed_if_empty().await.unwrap();
        state
    }

    fn due_in(trip_id: u64, millis: i64) -> Reminder {
        Reminder {
            trip_id,
            fire_at: Utc::now() + Duration::milliseconds(millis),
            message: format!("Trip {trip_id} starts soon"),
        }
    }

    #[tokio::test]
    async fn past_reminder_is_not_scheduled() {
        let state = seeded_state().await;
        assert!(schedule_reminder(state, due_in(3, -60_000)).is_none());
    }

    #[tokio::test]
    async fn due_reminder_goes_to_assigned_driver() {
        let state = seeded_state().await;
        state
            .update_fleet(|fleet| fleet.assign(3, 3, AssignmentStrategy::Manual))
            .await
            .unwrap();
        let mut rx = state.events_tx.subscribe();

        let handle = schedule_reminder(state.clone(), due_in(3, 20)).unwrap();
        handle.await.unwrap();

        match rx.try_recv().unwrap() {
            DispatchEvent::TripReminder { driver_id, reminder } => {
                assert_eq!(driver_id, Some(3));
                assert_eq!(reminder.trip_id, 3);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn delivered_trip_reminder_is_dropped_on_wake() {
        let state = seeded_state().await;
        let handle = schedule_reminder(state.clone(), due_in(3, 50)).unwrap();
        state
            .update_fleet(|fleet| fleet.update_status(3, TripStatus::Delivered))
            .await
            .unwrap();
        let mut rx = state.events_tx.subscribe();

        handle.await.unwrap();

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn reminder_for_unknown_trip_is_dropped() {
        let state = seeded_state().await;
        let mut rx = state.events_tx.subscribe();

        schedule_reminder(state.clone(), due_in(42, 10))
            .unwrap()
            .await
            .unwrap();

        assert!(rx.try_recv().is_err());
    }
}
