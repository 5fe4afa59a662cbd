use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::config::Mode;
use crate::correlation::RegistryStats;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub mode: Mode,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        mode: state.mode,
    })
}

/// Registry occupancy. 404 in simulator mode, which has no registry.
pub async fn get_pending(
    State(state): State<AdminState>,
) -> Result<Json<RegistryStats>, StatusCode> {
    let registry = state.registry.ok_or(StatusCode::NOT_FOUND)?;
    registry
        .stats()
        .await
        .map(Json)
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::setup_admin_router;
    use crate::correlation::{Registry, ReplyId};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn get(path: &str, key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(key) = key {
            builder = builder.header("authorization", format!("Bearer {}", key));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn requires_api_key() {
        let app = setup_admin_router(AdminState::new(Mode::Proxy, None, "secret"));
        let res = app.clone().oneshot(get("/admin/status", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let res = app.oneshot(get("/admin/status", Some("wrong"))).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn reports_pending_waiters() {
        let registry = Registry::spawn();
        let _rx = registry.wait(ReplyId::new("held").unwrap());
        let app = setup_admin_router(AdminState::new(Mode::Proxy, Some(registry), "secret"));

        let res = app.oneshot(get("/admin/pending", Some("secret"))).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), 4096).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["pending_ids"], 1);
        assert_eq!(json["pending_waiters"], 1);
        assert_eq!(json["timed_out"], 0);
    }

    #[tokio::test]
    async fn simulator_has_no_registry() {
        let app = setup_admin_router(AdminState::new(Mode::Simulator, None, "secret"));
        let res = app.oneshot(get("/admin/pending", Some("secret"))).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let app = setup_admin_router(AdminState::new(Mode::Simulator, None, "secret"));
        let res = app.oneshot(get("/admin/status", Some("secret"))).await.unwrap();
        let body = to_bytes(res.into_body(), 4096).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["mode"], "simulator");
    }
}
