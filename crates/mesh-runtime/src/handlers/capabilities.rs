//! `GET /api/capabilities`, `GET /api/capabilities/{name}/schema`, and
//! `POST /api/capabilities/{name}`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};

use crate::capability::input_summary;
use crate::envelope::{error_status, ToolResponse};
use crate::runtime::ComponentRuntime;

pub async fn list(State(runtime): State<ComponentRuntime>) -> impl IntoResponse {
    let caps: Vec<_> = runtime
        .capabilities()
        .map(|entry| {
            serde_json::json!({
                "name": entry.descriptor.name,
                "description": entry.descriptor.description,
                "input_summary": input_summary(&entry.descriptor),
                "input_media_type": entry.descriptor.input_media_type,
                "output_media_type": entry.descriptor.output_media_type,
            })
        })
        .collect();
    Json(caps)
}

pub async fn schema(
    State(runtime): State<ComponentRuntime>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match runtime.capability(&name) {
        Some(entry) => Json(serde_json::json!({
            "name": entry.descriptor.name,
            "input_fields": entry.descriptor.input_fields,
            "input_media_type": entry.descriptor.input_media_type,
            "output_media_type": entry.descriptor.output_media_type,
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ToolResponse::err(&mesh_domain::Error::NotFound(format!(
                "unknown capability '{name}'"
            )))),
        )
            .into_response(),
    }
}

pub async fn invoke(
    State(runtime): State<ComponentRuntime>,
    Path(name): Path<String>,
    Json(input): Json<serde_json::Value>,
) -> impl IntoResponse {
    let Some(entry) = runtime.capability(&name) else {
        let err = mesh_domain::Error::NotFound(format!("unknown capability '{name}'"));
        return (StatusCode::NOT_FOUND, Json(ToolResponse::err(&err))).into_response();
    };

    match entry.handler.invoke(input).await {
        Ok(data) => (StatusCode::OK, Json(ToolResponse::ok(data))).into_response(),
        Err(e) => {
            let status = error_status(&e);
            (status, Json(ToolResponse::err(&e))).into_response()
        }
    }
}
