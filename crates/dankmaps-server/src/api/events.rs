use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use dankmaps_core::update::STORE_UPDATED_EVENT;
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;

use super::AppState;
use crate::store::{StoreEvent, STORE_REMOVED_EVENT};

/// GET /api/clients/events: store change push stream.
///
/// Creates and updates arrive as `storeDetailsUpdated` carrying the full
/// record; deletes as `storeRemoved` carrying `{ "id" }`. Slow subscribers
/// that fall behind the channel skip the missed events.
pub(in crate::api) async fn store_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.stores.subscribe();
    tracing::debug!("store event subscriber connected");

    let stream = futures::stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(change) => match encode(&change) {
                    Ok(event) => return Some((Ok(event), receiver)),
                    Err(e) => {
                        tracing::error!(error = %e, "failed to encode store event");
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "store event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn encode(change: &StoreEvent) -> Result<Event, axum::Error> {
    match change {
        StoreEvent::Changed(record) => Event::default().event(STORE_UPDATED_EVENT).json_data(record),
        StoreEvent::Removed { id } => Event::default()
            .event(STORE_REMOVED_EVENT)
            .json_data(serde_json::json!({ "id": id })),
    }
}
