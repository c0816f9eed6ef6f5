//! Request handlers for the notification endpoint.
//!
//! Both handlers return the cached acknowledgement unconditionally. The
//! POST handler additionally records the visiting organization when a
//! backend is configured; that write is spawned and never awaited by the
//! response path.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use bytes::Bytes;
use tracing::{debug, instrument, warn};

use crate::{extract::extract_org_id, server::AppState};

/// Acknowledges a GET callout with the cached payload. No side effects.
#[instrument(name = "acknowledge", skip_all)]
pub async fn acknowledge(State(state): State<AppState>) -> impl IntoResponse {
    xml_response(state.cache.body())
}

/// Acknowledges a POST notification and records the visit.
///
/// The acknowledgement is prepared regardless of what the body contains
/// or whether the insert succeeds; logging is fire-and-forget.
#[instrument(name = "receive_notification", skip_all, fields(body_bytes = body.len()))]
pub async fn receive_notification(
    State(state): State<AppState>,
    body: Bytes,
) -> impl IntoResponse {
    if let Some(visits) = state.visits.clone() {
        match extract_org_id(&body) {
            Some(org_id) => {
                tokio::spawn(async move {
                    if let Err(error) = visits.log_visit(&org_id).await {
                        warn!(org_id, %error, "visit logging failed");
                    }
                });
            }
            None => debug!("notification carries no organization id, nothing to record"),
        }
    }

    xml_response(state.cache.body())
}

fn xml_response(body: Bytes) -> impl IntoResponse {
    (StatusCode::OK, [(header::CONTENT_TYPE, "application/xml")], body)
}
