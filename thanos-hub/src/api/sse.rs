//! Server-Sent Events stream of controller events

use crate::api::server::AppContext;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

/// GET /api/events
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = ctx.controller.events();
    let rx = events.subscribe();
    debug!("New SSE client connected ({} subscribers)", events.subscriber_count());

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => match Event::default().event(event.event_type()).json_data(&event) {
                Ok(sse_event) => Some(Ok(sse_event)),
                Err(e) => {
                    warn!("Failed to serialize event: {}", e);
                    None
                }
            },
            // Lagged: the client missed some events, keep streaming
            Err(e) => {
                warn!("SSE stream error: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
