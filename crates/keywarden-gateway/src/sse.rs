// SPDX-FileCopyrightText: 2026 Keywarden Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events feed for GET /v1/rotations/{id}/events.
//!
//! Every progress message becomes one event whose data is the message JSON:
//! ```text
//! event: progress
//! data: {"task":"accounts","message":"100/250 records processed","time":1767225600,"progress":40,"end":0,...}
//!
//! event: end
//! data: {"task":"rotation","message":"rotation completed: ...","progress":100,"end":1,"summary":{...}}
//! ```
//! The stream replays messages already published, then follows the job
//! live, and closes after the `end` event.

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};

use crate::handlers::{parse_job_id, ApiError};
use crate::server::GatewayState;

pub async fn rotation_events(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let job_id = parse_job_id(&id)?;
    let subscription = state.manager.subscribe(job_id).await?;

    let events = subscription.into_stream().map(|message| {
        let name = if message.is_end() { "end" } else { "progress" };
        Event::default().event(name).json_data(&message)
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
