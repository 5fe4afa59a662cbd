//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router for the configured mode
//! - Wire up middleware (request ID, tracing)
//! - Own the correlation registry loop in proxy mode
//! - Dispatch POSTs to the forwarder or the completion endpoint
//! - Serve the admin API on its own listener when enabled

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Method, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::admin::{setup_admin_router, AdminState};
use crate::config::{Mode, ProxyConfig};
use crate::correlation::{Registry, RegistryHandle};
use crate::error::{ProxyError, ServerError};
use crate::forward::{complete, completion_id, http_client, Forwarder};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::lifecycle::shutdown::wait_for_shutdown;
use crate::observability::metrics;
use crate::simulator::{self, SimulatorState};

/// Application state injected into proxy handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub registry: RegistryHandle,
    pub reply_id_header: HeaderName,
    pub max_body_bytes: usize,
}

/// HTTP server for either the proxy or the downstream simulator.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    registry: Option<Registry>,
    registry_handle: Option<RegistryHandle>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let reply_id_header = HeaderName::from_bytes(config.protocol.reply_id_header.as_bytes())
            .map_err(|_| ServerError::InvalidHeader(config.protocol.reply_id_header.clone()))?;
        let client = http_client();

        match config.mode {
            Mode::Proxy => {
                let (registry, handle) = Registry::new();
                let forwarder = Forwarder::new(
                    client,
                    &config.downstream_url,
                    Duration::from_secs(config.timeouts.downstream_secs),
                    reply_id_header.clone(),
                );
                let state = AppState {
                    forwarder: Arc::new(forwarder),
                    registry: handle.clone(),
                    reply_id_header,
                    max_body_bytes: config.limits.max_body_bytes,
                };
                let router = Self::build_router(
                    Router::new()
                        .route("/{*path}", any(proxy_handler))
                        .route("/", any(proxy_handler))
                        .with_state(state),
                );
                Ok(Self {
                    router,
                    config,
                    registry: Some(registry),
                    registry_handle: Some(handle),
                })
            }
            Mode::Simulator => {
                let state = SimulatorState::new(&config, client, reply_id_header)
                    .map_err(ServerError::Simulator)?;
                let router = Self::build_router(simulator::router(state));
                Ok(Self {
                    router,
                    config,
                    registry: None,
                    registry_handle: None,
                })
            }
        }
    }

    /// Add the middleware stack shared by both modes.
    fn build_router(routes: Router) -> Router {
        routes
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id(request.headers()),
                )
            }))
            .layer(set_request_id_layer())
    }

    /// Handle to the correlation registry (proxy mode only).
    pub fn registry(&self) -> Option<RegistryHandle> {
        self.registry_handle.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            mode = %self.config.mode,
            "HTTP server starting"
        );

        if let Some(registry) = self.registry {
            tokio::spawn(registry.run());
        }

        if self.config.admin.enabled {
            let admin_addr = &self.config.admin.bind_address;
            let admin_listener = TcpListener::bind(admin_addr)
                .await
                .map_err(|source| ServerError::Bind {
                    address: admin_addr.clone(),
                    source,
                })?;
            let admin = setup_admin_router(AdminState::new(
                self.config.mode,
                self.registry_handle.clone(),
                &self.config.admin.api_key,
            ));
            let admin_shutdown = shutdown.resubscribe();
            tracing::info!(address = %admin_addr, "Admin API listening");
            tokio::spawn(async move {
                if let Err(e) = axum::serve(admin_listener, admin)
                    .with_graceful_shutdown(wait_for_shutdown(admin_shutdown))
                    .await
                {
                    tracing::error!(error = %e, "Admin server failed");
                }
            });
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Proxy-mode entry point for every inbound request.
///
/// Only POST is accepted. A POST with the reply-id header is a completion
/// call; any other POST is forwarded downstream.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();

    if request.method() != Method::POST {
        return ProxyError::BadMethod(request.method().to_string()).into_response();
    }

    if let Some(id) = completion_id(request.headers(), &state.reply_id_header) {
        return match complete(
            &state.registry,
            id,
            &state.reply_id_header,
            state.max_body_bytes,
            request,
        )
        .await
        {
            Ok(ack) => {
                metrics::record_request("completion", start);
                ack
            }
            Err(e) => e.into_response(),
        };
    }

    match state.forwarder.forward(&state.registry, request).await {
        Ok((outcome, response)) => {
            tracing::debug!(
                outcome = outcome.as_str(),
                status = response.status().as_u16(),
                elapsed = ?start.elapsed(),
                "Request answered"
            );
            metrics::record_request(outcome.as_str(), start);
            response
        }
        Err(e) => e.into_response(),
    }
}
