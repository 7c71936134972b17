use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;

use kith_shared::{ApiResponse, HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

// --- GET / ---

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
}

pub async fn index() -> Json<ApiResponse<ServiceInfo>> {
    Json(ApiResponse::ok(ServiceInfo {
        service: "kith-feed",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

// --- GET /health ---

/// Health check that pings the database pool.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Response {
    let postgres = match state.db.get() {
        Ok(mut conn) => match diesel::sql_query("SELECT 1").execute(&mut conn) {
            Ok(_) => HealthCheck {
                name: "postgres".to_string(),
                status: HealthStatus::Healthy,
                message: None,
            },
            Err(e) => HealthCheck {
                name: "postgres".to_string(),
                status: HealthStatus::Unhealthy,
                message: Some(format!("{e}")),
            },
        },
        Err(e) => HealthCheck {
            name: "postgres".to_string(),
            status: HealthStatus::Unhealthy,
            message: Some(format!("{e}")),
        },
    };

    let response = HealthResponse::healthy("kith-feed", env!("CARGO_PKG_VERSION"))
        .with_checks(vec![postgres]);

    let status = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(response)).into_response()
}

// --- GET /metrics ---

/// Returns Prometheus metrics.
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}
