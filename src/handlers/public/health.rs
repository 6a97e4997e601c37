// handlers/public/health.rs - GET /api/v1/health

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::middleware::ApiResponse;
use crate::state::AppState;

/// Reports service status, environment, version and database reachability.
pub async fn health_get(State(state): State<AppState>) -> axum::response::Response {
    let env = state.config.environment.as_str();
    let version = env!("CARGO_PKG_VERSION");

    match state.store.health.ping().await {
        Ok(()) => ApiResponse::success(json!({
            "status": "ok",
            "env": env,
            "version": version,
            "database": "ok"
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "env": env,
                        "version": version,
                        "database": e.to_string()
                    }
                })),
            )
                .into_response()
        }
    }
}
