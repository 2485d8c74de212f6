//! Server-Sent Events support

use crate::runtime::SessionEvent;
use crate::state_machine::SessionState;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Initial snapshot followed by every session event
pub fn sse_stream(
    init: SessionState,
    broadcast_rx: tokio::sync::broadcast::Receiver<SessionEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move {
        Ok(to_sse("init", json!({"type": "init", "session": init})))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(session_event_to_sse(event))),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn session_event_to_sse(event: SessionEvent) -> Event {
    match event {
        SessionEvent::Snapshot(state) => to_sse(
            "snapshot",
            json!({"type": "snapshot", "session": state.as_ref()}),
        ),
        SessionEvent::PhaseChanged { from, to } => to_sse(
            "phase_change",
            json!({"type": "phase_change", "from": from, "to": to}),
        ),
        SessionEvent::Fallback(fallback) => to_sse(
            "fallback",
            json!({"type": "fallback", "fallback": fallback}),
        ),
    }
}

fn to_sse(event_type: &str, data: serde_json::Value) -> Event {
    Event::default().event(event_type).data(data.to_string())
}
