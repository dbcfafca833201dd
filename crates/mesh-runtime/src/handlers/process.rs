//! `POST /process` — agents only. Plain-text instruction in, plain-text
//! response out; no envelope, since this is the natural-language channel
//! rather than the structured tool-invocation one.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::envelope::error_status;
use crate::runtime::ComponentRuntime;

pub async fn process(State(runtime): State<ComponentRuntime>, body: String) -> impl IntoResponse {
    let Some(handler) = runtime.agent_handler() else {
        return (
            StatusCode::NOT_FOUND,
            "this component does not accept /process".to_string(),
        );
    };

    match handler.process(&body).await {
        Ok(response) => (StatusCode::OK, response),
        Err(e) => (error_status(&e), e.to_string()),
    }
}
