//! Completion calls from the downstream.
//!
//! A POST carrying the reply-id header is not forwarded: its status header
//! and body become the [`PendingResponse`] for that reply id. The call is
//! acknowledged with an empty 200 whether or not anyone was waiting.

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, HeaderName, Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::correlation::{PendingResponse, RegistryHandle, ReplyId};
use crate::error::{ProxyError, ProxyResult};
use crate::http::response::completion_headers;
use crate::protocol::X_REPLY_STATUS;

/// Reply id of an inbound request, if it is a completion call.
pub fn completion_id(headers: &HeaderMap, reply_id_header: &HeaderName) -> Option<ReplyId> {
    headers.get(reply_id_header).and_then(ReplyId::from_header)
}

/// Parse the status carried by a completion call.
pub fn completion_status(headers: &HeaderMap) -> ProxyResult<StatusCode> {
    let raw = headers
        .get(X_REPLY_STATUS)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    raw.trim()
        .parse::<u16>()
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or_else(|| ProxyError::MalformedStatus(raw.to_string()))
}

/// Handle a completion call for `id`.
pub async fn complete(
    registry: &RegistryHandle,
    id: ReplyId,
    reply_id_header: &HeaderName,
    max_body_bytes: usize,
    request: Request<Body>,
) -> ProxyResult<Response> {
    let (parts, body) = request.into_parts();
    let status = completion_status(&parts.headers)?;
    let body = to_bytes(body, max_body_bytes)
        .await
        .map_err(|e| ProxyError::BodyRead(e.to_string()))?;

    tracing::debug!(
        reply_id = %id,
        status = status.as_u16(),
        bytes = body.len(),
        "Completion received"
    );
    let headers = completion_headers(parts.headers, reply_id_header);
    registry.deliver(id, PendingResponse::new(status, headers, body));

    Ok(StatusCode::OK.into_response())
}
