use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::{
    dto::{
        console::ConsoleSnapshot,
        sse::{Handshake, ServerEvent},
    },
    state::SharedState,
};

const EVENT_HANDSHAKE: &str = "handshake";

/// Subscribe to the display stream and build a handshake carrying the current console.
///
/// The receiver exists before the snapshot is taken.
pub async fn subscribe_display(
    state: &SharedState,
) -> (broadcast::Receiver<ServerEvent>, ServerEvent) {
    let receiver = state.display_sse().subscribe();
    let console = state.console().lock().await;
    let handshake = Handshake {
        message: "display stream connected".into(),
        degraded: state.is_degraded(),
        console: ConsoleSnapshot::from(&*console),
    };
    let event = ServerEvent::json(Some(EVENT_HANDSHAKE.to_string()), &handshake).unwrap_or_else(
        |_| ServerEvent::new(Some(EVENT_HANDSHAKE.to_string()), handshake.message.clone()),
    );
    (receiver, event)
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

/// Convert a broadcast receiver into an SSE response, forwarding events until
/// the client disconnects. `first` is delivered before any broadcast event.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    first: ServerEvent,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: reads from broadcast and pushes into mpsc
    tokio::spawn(async move {
        if tx.send(Ok(to_event(first))).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // Skip lagged messages but keep the stream alive.
                            debug!(skipped, "display stream lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!("Display SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{config::AppConfig, dao::question_source::InlineQuestionSource, state::AppState};

    #[tokio::test]
    async fn handshake_carries_idle_console() {
        let state = AppState::new(
            AppConfig::default(),
            Arc::new(InlineQuestionSource::new("", 58)),
        );
        let (_receiver, handshake) = subscribe_display(&state).await;

        assert_eq!(handshake.event.as_deref(), Some("handshake"));
        let payload: serde_json::Value = serde_json::from_str(&handshake.data).unwrap();
        assert_eq!(payload["degraded"], true);
        assert_eq!(payload["console"]["phase"], "idle");
        assert_eq!(state.display_sse().subscriber_count(), 1);
    }
}
