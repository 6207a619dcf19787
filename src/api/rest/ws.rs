use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::events::DispatchEvent;
use crate::state::AppState;

/// `?driver_id=N` narrows the stream to events about one driver, the way a
/// driver's device subscribes. Without it the admin console sees everything.
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    pub driver_id: Option<u64>,
}

impl EventFilter {
    fn accepts(&self, event: &DispatchEvent) -> bool {
        match self.driver_id {
            Some(wanted) => event.driver_id() == Some(wanted),
            None => true,
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(filter): Query<EventFilter>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, filter))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, filter: EventFilter) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = BroadcastStream::new(state.events_tx.subscribe());

    info!(driver_id = ?filter.driver_id, "websocket client connected");

    let send_task = tokio::spawn(async move {
        while let Some(next) = events.next().await {
            let event = match next {
                Ok(event) => event,
                Err(err) => {
                    warn!(error = %err, "websocket client fell behind");
                    continue;
                }
            };
            if !filter.accepts(&event) {
                continue;
            }

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!("websocket client disconnected");
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::EventFilter;
    use crate::events::DispatchEvent;
    use crate::models::assignment::{Assignment, AssignmentStrategy};

    fn assigned_to(driver_id: u64) -> DispatchEvent {
        DispatchEvent::TripAssigned(Assignment {
            id: Uuid::new_v4(),
            trip_id: 1,
            driver_id,
            strategy: AssignmentStrategy::Manual,
            tonnage: 5.0,
            assigned_at: Utc::now(),
        })
    }

    #[test]
    fn driver_filter_only_passes_own_events() {
        let filter = EventFilter { driver_id: Some(2) };
        assert!(filter.accepts(&assigned_to(2)));
        assert!(!filter.accepts(&assigned_to(3)));
    }

    #[test]
    fn no_filter_passes_everything() {
        assert!(EventFilter::default().accepts(&assigned_to(3)));
    }
}
