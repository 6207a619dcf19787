use std::time::Instant;

use tracing::{info, warn};

use crate::error::AppError;
use crate::events::DispatchEvent;
use crate::fleet::{AssignmentOutcome, Fleet};
use crate::models::assignment::AssignmentStrategy;
use crate::state::AppState;

/// Assigns `trip_id` to the chosen driver.
pub async fn assign_trip(
    state: &AppState,
    trip_id: u64,
    driver_id: u64,
) -> Result<AssignmentOutcome, AppError> {
    run(state, trip_id, |fleet| {
        fleet.assign(trip_id, driver_id, AssignmentStrategy::Manual)
    })
    .await
}

/// Assigns `trip_id` to whichever eligible driver the best-driver rule picks.
pub async fn auto_assign_trip(
    state: &AppState,
    trip_id: u64,
) -> Result<AssignmentOutcome, AppError> {
    run(state, trip_id, |fleet| fleet.auto_assign(trip_id)).await
}

async fn run<F>(
    state: &AppState,
    trip_id: u64,
    command: F,
) -> Result<AssignmentOutcome, AppError>
where
    F: FnOnce(&mut Fleet) -> Result<AssignmentOutcome, AppError>,
{
    let start = Instant::now();
    let result = state.update_fleet(command).await;
    let elapsed = start.elapsed().as_secs_f64();

    match &result {
        Ok(outcome) => {
            state.metrics.observe_assignment("success", elapsed);
            state.metrics.observe_driver(&outcome.driver);

            info!(
                trip_id,
                driver_id = outcome.driver.id,
                tonnage = outcome.assignment.tonnage,
                tonnage_used = outcome.driver.vehicle_tonnage_used,
                strategy = ?outcome.assignment.strategy,
                "trip assigned"
            );

            state.publish(DispatchEvent::TripAssigned(outcome.assignment.clone()));
        }
        Err(err) => {
            state.metrics.observe_assignment("error", elapsed);
            warn!(trip_id, error = %err, "assignment rejected");
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryStore;

    async fn seeded_state() -> AppState {
        let state = AppState::new(Arc::new(MemoryStore::new()), 16, 30).unwrap();
        state.seed_if_empty().await.unwrap();
        state
    }

    #[tokio::test]
    async fn successful_assignment_is_broadcast() {
        let state = seeded_state().await;
        let mut rx = state.events_tx.subscribe();

        let outcome = assign_trip(&state, 1, 1).await.unwrap();
        assert_eq!(outcome.driver.vehicle_tonnage_used, 15.0);

        match rx.recv().await.unwrap() {
            DispatchEvent::TripAssigned(assignment) => {
                assert_eq!(assignment.trip_id, 1);
                assert_eq!(assignment.driver_id, 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejected_assignment_is_counted_as_error() {
        let state = seeded_state().await;

        let result = assign_trip(&state, 2, 1).await;
        assert!(matches!(result, Err(AppError::RouteMismatch(_))));

        let errors = state
            .metrics
            .assignments_total
            .with_label_values(&["error"])
            .get();
        assert_eq!(errors, 1);
    }

    #[tokio::test]
    async fn auto_assign_uses_driver_at_source() {
        let state = seeded_state().await;

        let outcome = auto_assign_trip(&state, 3).await.unwrap();
        assert_eq!(outcome.driver.id, 3);
        assert_eq!(outcome.assignment.strategy, AssignmentStrategy::BestDriver);
    }
}
