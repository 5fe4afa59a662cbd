//! Downstream simulator.
//!
//! Stands in for a downstream service when exercising a proxy:
//! - `/instant` answers `200 InstantOK` straight away
//! - `/deferred` answers `200 DeferOK` with a fresh reply id, then calls the
//!   proxy back after a delay with the real payload
//!
//! Any other path is a 500.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};

use crate::config::ProxyConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::forward::HttpClient;
use crate::protocol::{format_timeout, X_REPLY_STATUS, X_REPLY_TIMEOUT};

pub const INSTANT_BODY: &str = "InstantOK";
pub const DEFER_BODY: &str = "DeferOK";
pub const DEFERRED_BODY: &str = "DeferredOK";

/// Settings shared by simulator handlers.
#[derive(Debug, Clone)]
pub struct SimulatorState {
    client: HttpClient,
    callback_url: Arc<str>,
    reply_id_header: HeaderName,
    callback_delay: Duration,
    reply_window: Duration,
    completion_status: StatusCode,
}

impl SimulatorState {
    pub fn new(
        config: &ProxyConfig,
        client: HttpClient,
        reply_id_header: HeaderName,
    ) -> ProxyResult<Self> {
        let status = config.simulator.completion_status;
        let completion_status = StatusCode::from_u16(status)
            .map_err(|_| ProxyError::MalformedStatus(status.to_string()))?;
        Ok(Self {
            client,
            callback_url: Arc::from(config.downstream_url.as_str()),
            reply_id_header,
            callback_delay: Duration::from_millis(config.simulator.callback_delay_ms),
            reply_window: Duration::from_millis(config.simulator.reply_timeout_ms),
            completion_status,
        })
    }
}

/// Routes served in simulator mode.
pub fn router(state: SimulatorState) -> Router {
    Router::new()
        .route("/{*path}", any(simulate))
        .route("/", any(simulate))
        .with_state(state)
}

async fn simulate(State(state): State<SimulatorState>, request: Request<Body>) -> Response {
    match request.uri().path() {
        "/instant" => (StatusCode::OK, INSTANT_BODY).into_response(),
        "/deferred" => defer(&state),
        other => ProxyError::UnknownPath(other.to_string()).into_response(),
    }
}

fn defer(state: &SimulatorState) -> Response {
    let id = new_reply_id();
    tracing::info!(reply_id = %id, delay = ?state.callback_delay, "Deferring reply");

    let mut response = (StatusCode::OK, DEFER_BODY).into_response();
    let headers = response.headers_mut();
    match HeaderValue::from_str(&id) {
        Ok(value) => {
            headers.insert(state.reply_id_header.clone(), value);
        }
        Err(e) => return ProxyError::Upstream(e.to_string()).into_response(),
    }
    if let Ok(value) = HeaderValue::from_str(&format_timeout(state.reply_window)) {
        headers.insert(X_REPLY_TIMEOUT, value);
    }

    tokio::spawn(send_completion(state.clone(), id));
    response
}

/// 20 uppercase hex characters from 10 random bytes.
pub fn new_reply_id() -> String {
    let bytes: [u8; 10] = rand::random();
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

async fn send_completion(state: SimulatorState, id: String) {
    tokio::time::sleep(state.callback_delay).await;

    let request = match Request::builder()
        .method(Method::POST)
        .uri(state.callback_url.as_ref())
        .header(state.reply_id_header.clone(), id.as_str())
        .header(X_REPLY_STATUS, state.completion_status.as_str())
        .body(Body::from(DEFERRED_BODY))
    {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(reply_id = %id, error = %e, "Failed to build completion call");
            return;
        }
    };

    match state.client.request(request).await {
        Ok(response) => {
            tracing::debug!(reply_id = %id, status = %response.status(), "Completion acknowledged");
        }
        Err(e) => {
            tracing::error!(reply_id = %id, error = %e, "Completion call failed");
        }
    }
}
