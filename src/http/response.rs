//! Response handling and transformation.
//!
//! # Responsibilities
//! - Turn a delivered [`PendingResponse`] into the client-visible response
//! - Decide which completion-call headers are replayed to the client
//!
//! # Design Decisions
//! - Final downstream responses never pass through here; they are streamed
//!   back as received
//! - Hop-by-hop and framing headers of the completion call are dropped so
//!   hyper frames the replayed body itself
//! - The completion call's request id is dropped; the waiting client gets
//!   its own id back from the request-id layer

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, Response};
use axum::response::IntoResponse;

use crate::correlation::PendingResponse;
use crate::http::request::X_REQUEST_ID;
use crate::protocol::{X_REPLY_STATUS, X_REPLY_TIMEOUT};

static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::HOST,
];

impl IntoResponse for PendingResponse {
    fn into_response(self) -> axum::response::Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Strip a completion call's headers down to what the waiting client sees.
pub fn completion_headers(mut headers: HeaderMap, reply_id_header: &HeaderName) -> HeaderMap {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove(header::CONTENT_LENGTH);
    headers.remove("keep-alive");
    headers.remove(reply_id_header);
    headers.remove(X_REPLY_STATUS);
    headers.remove(X_REPLY_TIMEOUT);
    headers.remove(X_REQUEST_ID);
    headers
}
