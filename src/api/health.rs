use axum::Json;

use crate::models::{HealthResponse, WelcomeResponse};

/// GET / - Service identity
pub async fn root() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to Commit Detective API".to_string(),
    })
}

/// GET /api/health - Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}
