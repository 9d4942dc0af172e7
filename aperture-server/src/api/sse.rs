//! Server-Sent Events broadcaster
//!
//! Streams gallery events to connected clients. A client interested
//! in specific photos scopes its stream with `?photo=<uuid>[,<uuid>]`;
//! without the parameter it receives every event.

use aperture_common::db::init::get_setting_i64;
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use serde::Deserialize;
use std::collections::HashSet;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::ApiError;
use crate::AppState;

/// Query parameters for the event stream
#[derive(Debug, Deserialize)]
pub struct EventStreamQuery {
    /// Comma-separated photo guids to scope the stream to
    pub photo: Option<String>,
}

/// GET /api/events - SSE event stream
pub async fn event_stream(
    State(state): State<AppState>,
    Query(query): Query<EventStreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let filter = parse_photo_filter(query.photo.as_deref())?;

    let keepalive_secs = get_setting_i64(&state.db, "sse_keepalive_secs", 15)
        .await
        .unwrap_or(15) as u64;

    debug!(
        "New SSE client connected (scope: {})",
        match &filter {
            Some(set) => format!("{} photo(s)", set.len()),
            None => "all events".to_string(),
        }
    );

    let mut rx = state.events.subscribe();

    let stream = async_stream::stream! {
        // Initial connected status so clients can show connection state
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(wanted) = &filter {
                        if !wanted.contains(&event.photo_id()) {
                            continue;
                        }
                    }

                    match serde_json::to_string(&event) {
                        Ok(json) => {
                            yield Ok(Event::default()
                                .event(event.event_name())
                                .data(json));
                        }
                        Err(e) => {
                            warn!("Failed to serialize event: {}", e);
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Slow consumer: counts resync on the next event it
                    // does receive, so just note the gap and continue.
                    warn!("SSE subscriber lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(keepalive_secs))
            .text("keep-alive"),
    ))
}

/// Parse the `photo` query parameter into a scoping set
///
/// None means no scoping (all events). Any malformed guid rejects the
/// whole request.
fn parse_photo_filter(raw: Option<&str>) -> Result<Option<HashSet<Uuid>>, ApiError> {
    let raw = match raw {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(None),
    };

    let mut wanted = HashSet::new();
    for part in raw.split(',') {
        let id = Uuid::parse_str(part.trim())
            .map_err(|_| ApiError::BadRequest(format!("Invalid photo id: {}", part)))?;
        wanted.insert(id);
    }

    Ok(Some(wanted))
}
