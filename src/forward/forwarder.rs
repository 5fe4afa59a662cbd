//! Downstream forwarding and reply classification.
//!
//! # Responsibilities
//! - Rebuild the inbound request against the downstream base URL
//! - Issue it with a deadline, mapping transport failures to errors
//! - Classify the reply as final or deferred
//! - For deferred replies, block on the registry until a completion or the
//!   synthetic timeout arrives

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, Request, Uri, Version};
use axum::response::{IntoResponse, Response};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::correlation::{spawn_expiry, RegistryHandle, ReplyId};
use crate::error::{ProxyError, ProxyResult};
use crate::protocol::{parse_timeout, X_REPLY_TIMEOUT};

/// Outbound HTTP client shared by the forwarder and the simulator.
pub type HttpClient = Client<HttpConnector, Body>;

/// Build the shared outbound client.
pub fn http_client() -> HttpClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// How the downstream answered a forwarded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Return the reply to the client unchanged.
    Final,
    /// The real answer comes later through a completion call.
    Deferred { id: ReplyId, window: Duration },
}

/// Which kind of answer reached the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Final,
    Deferred,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Final => "final",
            Outcome::Deferred => "deferred",
        }
    }
}

/// Forwards client requests to the downstream service.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: HttpClient,
    base_url: String,
    deadline: Duration,
    reply_id_header: HeaderName,
}

impl Forwarder {
    pub fn new(
        client: HttpClient,
        base_url: &str,
        deadline: Duration,
        reply_id_header: HeaderName,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            deadline,
            reply_id_header,
        }
    }

    /// Forward `request` and produce the client-visible response.
    pub async fn forward(
        &self,
        registry: &RegistryHandle,
        request: Request<Body>,
    ) -> ProxyResult<(Outcome, Response)> {
        let outbound = self.outbound_request(request)?;
        let reply = self.send(outbound).await?;

        match self.classify(reply.headers())? {
            Classification::Final => {
                let (parts, body) = reply.into_parts();
                Ok((Outcome::Final, Response::from_parts(parts, Body::new(body))))
            }
            Classification::Deferred { id, window } => {
                // The deferred reply carries nothing but headers; dropping it
                // closes the downstream exchange.
                drop(reply);
                tracing::debug!(reply_id = %id, window = ?window, "Downstream deferred reply");
                let rx = registry.wait(id.clone());
                spawn_expiry(registry.clone(), id.clone(), window);
                let pending = rx
                    .await
                    .map_err(|_| ProxyError::WaiterClosed(id.to_string()))?;
                tracing::debug!(
                    reply_id = %id,
                    status = pending.status.as_u16(),
                    "Deferred request completed"
                );
                Ok((Outcome::Deferred, pending.into_response()))
            }
        }
    }

    /// Rebuild an inbound request for the downstream.
    ///
    /// Method, path, query, headers and body carry over; `Host` is left for
    /// the client to fill in from the downstream authority.
    pub fn outbound_request(&self, request: Request<Body>) -> ProxyResult<Request<Body>> {
        let (parts, body) = request.into_parts();
        let path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let uri: Uri = format!("{}{}", self.base_url, path)
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| ProxyError::Upstream(e.to_string()))?;

        let mut headers: HeaderMap = parts.headers;
        headers.remove(header::HOST);

        let mut outbound = Request::builder()
            .method(parts.method)
            .uri(uri)
            // The pooled client speaks HTTP/1.1 to the downstream.
            .version(Version::HTTP_11)
            .body(body)
            .map_err(|e| ProxyError::Upstream(e.to_string()))?;
        *outbound.headers_mut() = headers;
        Ok(outbound)
    }

    async fn send(&self, request: Request<Body>) -> ProxyResult<Response<Incoming>> {
        match tokio::time::timeout(self.deadline, self.client.request(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(ProxyError::Upstream(e.to_string())),
            Err(_) => Err(ProxyError::UpstreamTimeout(self.deadline.as_secs())),
        }
    }

    /// Decide from its headers whether a downstream reply is final or deferred.
    pub fn classify(&self, headers: &HeaderMap) -> ProxyResult<Classification> {
        let id = headers.get(&self.reply_id_header).and_then(ReplyId::from_header);

        let Some(id) = id else {
            return Ok(Classification::Final);
        };

        let raw = headers
            .get(X_REPLY_TIMEOUT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let window = parse_timeout(raw)?;
        Ok(Classification::Deferred { id, window })
    }
}
