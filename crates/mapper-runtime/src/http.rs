//! # Admin Endpoints
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /__health` | health report JSON, always 200 |
//! | `GET /__gtg` | 200 `OK` or 503 with the failure, never cached |
//! | `GET /__build-info` | version JSON |
//! | `GET /metrics` | Prometheus text format |

use annotations_mapper::HealthService;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Build information served by `/__build-info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub version: &'static str,
    pub system_code: String,
    pub name: String,
}

#[derive(Clone)]
struct AppState {
    health: Arc<HealthService>,
    build_info: Arc<BuildInfo>,
}

/// Build the admin router.
pub fn router(health: Arc<HealthService>) -> Router {
    let info = health.info();
    let build_info = Arc::new(BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        system_code: info.system_code.clone(),
        name: info.name.clone(),
    });

    Router::new()
        .route("/__health", get(health_check))
        .route("/__gtg", get(good_to_go))
        .route("/__build-info", get(build_info_handler))
        .route("/metrics", get(metrics))
        .with_state(AppState { health, build_info })
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let report = state.health.run_checks().await;
    if !report.ok {
        let failing: Vec<&str> = report
            .checks
            .iter()
            .filter(|c| !c.ok)
            .map(|c| c.id.as_str())
            .collect();
        warn!(checks = ?failing, "Health checks failing");
    }
    Json(report)
}

async fn good_to_go(State(state): State<AppState>) -> Response {
    let status = state.health.gtg().await;
    let code = if status.good_to_go {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (code, [(header::CACHE_CONTROL, "no-cache")], status.message).into_response()
}

async fn build_info_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.build_info.as_ref().clone())
}

async fn metrics() -> Response {
    match mapper_telemetry::encode_metrics() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
