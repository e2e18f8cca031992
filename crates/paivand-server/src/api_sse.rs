//! SSE chat event stream handler.

use crate::AppState;
use axum::{
    extract::Extension,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
};
use futures_util::Stream;
use std::{convert::Infallible, sync::Arc};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Handler for `GET /events/stream`.
///
/// Streams chat events (message created/updated, reaction added) as they
/// happen. A subscriber that lags far enough to drop events simply misses
/// them; delivery is best-effort and clients re-sync via `GET /api/messages`.
pub async fn get_event_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events_tx.subscribe();
    let stream = BroadcastStream::new(rx);

    let mapped_stream = stream.filter_map(|result| match result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(data) => Some(Ok(Event::default().event(event.name()).data(data))),
            Err(e) => {
                tracing::error!("failed to serialize chat event: {}", e);
                None
            }
        },
        Err(broadcast_error) => {
            tracing::warn!(
                error = %broadcast_error,
                "chat event stream lagged; events were dropped for this subscriber"
            );
            None
        }
    });

    Sse::new(mapped_stream).keep_alive(KeepAlive::default())
}
