use axum::{extract::State, response::IntoResponse, Extension, Json};
use std::sync::Arc;

use crate::clock::MonotonicClock;
use crate::guard::AdmissionGuard;
use crate::health::HealthChecker;
use crate::middleware::RequestId;
use crate::response::HelloResponse;

/// Shared application state
pub type SharedState = Arc<AppState>;

/// Guard for the protected route and the health checker observing it
pub struct AppState {
    pub guard: AdmissionGuard<MonotonicClock>,
    pub health: HealthChecker<MonotonicClock>,
}

impl AppState {
    pub fn new(guard: AdmissionGuard<MonotonicClock>) -> Self {
        Self {
            health: HealthChecker::new(guard.clone()),
            guard,
        }
    }
}

/// The guarded endpoint. Only reached once the rate limit layer admits it.
pub async fn hello(request_id: Option<Extension<RequestId>>) -> impl IntoResponse {
    let request_id = request_id.map(|Extension(RequestId(id))| id);
    Json(HelloResponse::new(request_id))
}

/// Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.health.check_health())
}

/// Admission counters for the guarded endpoint
pub async fn metrics(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.guard.metrics())
}
