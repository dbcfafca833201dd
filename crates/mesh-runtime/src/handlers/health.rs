//! `GET /health` — returns 200 with `{status:"healthy", ...}` iff the
//! process is ready to serve; otherwise non-2xx.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use crate::runtime::ComponentRuntime;

pub async fn health(State(runtime): State<ComponentRuntime>) -> impl IntoResponse {
    if runtime.is_ready() {
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "id": runtime.id(),
                "namespace": runtime.namespace(),
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "starting",
                "id": runtime.id(),
                "namespace": runtime.namespace(),
            })),
        )
    }
}
