//! Values exchanged with the correlation registry.

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use serde::Serialize;
use tokio::sync::oneshot;

use crate::protocol::GATEWAY_TIMEOUT_BODY;

/// Downstream-chosen token identifying one pending asynchronous exchange.
///
/// Compared as the raw header bytes, so values carrying obs-text still
/// correlate. Uniqueness among outstanding exchanges is the downstream's
/// contract; the registry never checks it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplyId(HeaderValue);

impl ReplyId {
    /// Build from text. Empty values and values that are not a legal header
    /// value are rejected.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        HeaderValue::try_from(value.into())
            .ok()
            .and_then(|v| Self::from_header(&v))
    }

    /// Build from a received header. Empty values count as an absent header.
    pub fn from_header(value: &HeaderValue) -> Option<Self> {
        if value.is_empty() {
            None
        } else {
            Some(Self(value.clone()))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn as_header(&self) -> &HeaderValue {
        &self.0
    }
}

impl std::fmt::Display for ReplyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.0.as_bytes()))
    }
}

/// Completion payload for a deferred request, real or synthetic.
#[derive(Debug, Clone)]
pub struct PendingResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl PendingResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self { status, headers, body }
    }

    /// The response injected by the expiry timer.
    pub fn gateway_timeout() -> Self {
        Self {
            status: StatusCode::GATEWAY_TIMEOUT,
            headers: HeaderMap::new(),
            body: Bytes::from_static(GATEWAY_TIMEOUT_BODY.as_bytes()),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.status == StatusCode::GATEWAY_TIMEOUT && self.body == GATEWAY_TIMEOUT_BODY.as_bytes()
    }
}

/// Single-use delivery slot for one blocked client request.
#[derive(Debug)]
pub struct Waiter {
    tx: oneshot::Sender<PendingResponse>,
}

impl Waiter {
    /// Create a waiter and the receiver the request task blocks on.
    pub fn new() -> (Self, oneshot::Receiver<PendingResponse>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Whether the requesting task has stopped listening.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }

    /// Hand the response over. Returns `false` if nobody was listening.
    pub fn fulfill(self, response: PendingResponse) -> bool {
        self.tx.send(response).is_ok()
    }
}

/// Snapshot of registry occupancy and lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Reply ids with at least one registered waiter.
    pub pending_ids: usize,
    /// Waiters across all pending ids.
    pub pending_waiters: usize,
    /// Deliveries that found an entry.
    pub delivered: u64,
    /// Deliveries for ids nobody was waiting on.
    pub dropped: u64,
    /// Expiries that found an entry and answered it with the synthetic 504.
    pub timed_out: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reply_id_is_absent() {
        assert!(ReplyId::new("").is_none());
        assert!(ReplyId::from_header(&HeaderValue::from_static("")).is_none());
        assert_eq!(ReplyId::new("A1").unwrap().as_bytes(), b"A1");
    }

    #[test]
    fn non_ascii_reply_id_is_kept_as_bytes() {
        let raw = HeaderValue::from_bytes(b"id-\xe9\xff").unwrap();
        let id = ReplyId::from_header(&raw).unwrap();
        assert_eq!(id.as_bytes(), b"id-\xe9\xff");
        assert_eq!(id, ReplyId::from_header(&raw).unwrap());
        let shorter = HeaderValue::from_bytes(b"id-\xe9").unwrap();
        assert_ne!(id, ReplyId::from_header(&shorter).unwrap());
        assert_eq!(id.to_string(), "id-\u{fffd}\u{fffd}");
    }

    #[test]
    fn gateway_timeout_shape() {
        let resp = PendingResponse::gateway_timeout();
        assert_eq!(resp.status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(&resp.body[..], b"Gateway Timeout");
        assert!(resp.headers.is_empty());
        assert!(resp.is_timeout());
    }

    #[tokio::test]
    async fn waiter_reports_abandonment() {
        let (waiter, rx) = Waiter::new();
        assert!(!waiter.is_abandoned());
        drop(rx);
        assert!(waiter.is_abandoned());
        assert!(!waiter.fulfill(PendingResponse::gateway_timeout()));
    }
}
