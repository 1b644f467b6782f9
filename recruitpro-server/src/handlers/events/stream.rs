use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::Extension;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::AppState;

/// GET /api/jobs/events
/// Server-sent events for terminal job states.
///
/// Delivery is at-most-once to clients connected when the event fires;
/// there is no replay for late subscribers. Clients that need reliable
/// outcomes poll the job record endpoints instead.
pub async fn stream(
    Extension(state): Extension<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.notifier.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(|message| match message {
        Ok(event) => Event::default().event("job").json_data(&event).ok().map(Ok),
        // A lagged receiver missed events; the client recovers by polling.
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
