use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/display",
    tag = "sse",
    responses((status = 200, description = "Presentation display SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream console events to the presentation display, starting with a handshake.
pub async fn display_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let (receiver, handshake) = sse_service::subscribe_display(&state).await;
    info!(
        subscribers = state.display_sse().subscriber_count(),
        "New display SSE connection"
    );
    sse_service::to_sse_stream(receiver, handshake)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/display", get(display_stream))
}
