//! Operator API on a separate listener.
//!
//! Kept off the proxy listener, which only accepts POST.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use crate::config::Mode;
use crate::correlation::RegistryHandle;
use self::auth::admin_auth_middleware;
use self::handlers::{get_pending, get_status};

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub mode: Mode,
    pub registry: Option<RegistryHandle>,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(mode: Mode, registry: Option<RegistryHandle>, api_key: &str) -> Self {
        Self {
            mode,
            registry,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/pending", get(get_pending))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
