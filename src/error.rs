//! Per-request error handling.
//!
//! Every failure on a single request is handled the same way: log it and
//! answer HTTP 500 with an empty body to whoever issued the request. Nothing
//! is retried and nothing outlives the request it happened on.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::observability::metrics;
use crate::protocol::DurationError;

/// Errors that end a single proxied or completion request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Downstream could not be reached or the request could not be built.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Downstream did not answer within the configured deadline.
    #[error("upstream did not answer within {0} seconds")]
    UpstreamTimeout(u64),

    /// Non-integer status on a completion call.
    #[error("malformed reply status {0:?}")]
    MalformedStatus(String),

    /// Missing or unparsable timeout window on a deferred response.
    #[error("malformed reply timeout: {0}")]
    MalformedTimeout(#[from] DurationError),

    /// Anything but POST on the proxy listener.
    #[error("bad method {0}")]
    BadMethod(String),

    /// Reading a request body failed.
    #[error("body read failed: {0}")]
    BodyRead(String),

    /// The registry went away before delivering.
    #[error("waiter for reply {0} closed before delivery")]
    WaiterClosed(String),

    /// Simulator received a path it does not serve.
    #[error("unknown simulator path {0}")]
    UnknownPath(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        metrics::record_outcome("error");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

/// Result type for request handlers.
pub type ProxyResult<T> = Result<T, ProxyError>;

/// Fatal errors while starting or running a server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid reply id header {0:?}")]
    InvalidHeader(String),

    #[error("invalid simulator settings: {0}")]
    Simulator(ProxyError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn every_error_is_empty_500() {
        let errors = vec![
            ProxyError::Upstream("connection refused".into()),
            ProxyError::MalformedStatus("abc".into()),
            ProxyError::BadMethod("GET".into()),
            ProxyError::BodyRead("reset".into()),
        ];
        for err in errors {
            let resp = err.into_response();
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body = to_bytes(resp.into_body(), 1024).await.unwrap();
            assert!(body.is_empty());
        }
    }

    #[test]
    fn display_names_the_cause() {
        let err = ProxyError::from(DurationError::Empty);
        assert_eq!(err.to_string(), "malformed reply timeout: empty duration");
        assert_eq!(ProxyError::BadMethod("PUT".into()).to_string(), "bad method PUT");
    }
}
