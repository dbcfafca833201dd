//! Axum wiring for the handful of routes the component HTTP surface
//! names. Routing, CORS, and other middleware plumbing beyond request
//! tracing is left to whatever embeds this crate.

use axum::extract::Request;
use axum::routing::{get, post};
use axum::Router;
use mesh_domain::registration::ComponentType;
use tower_http::trace::TraceLayer;

use crate::handlers::{capabilities, health, process};
use crate::runtime::ComponentRuntime;

/// Pull the propagation header set off an inbound request so the span
/// adopts the caller's trace id instead of minting its own, matching the
/// header conventions the communicator writes on the way out.
fn request_span(request: &Request) -> tracing::Span {
    let traceparent = request
        .headers()
        .get("traceparent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let originator_id = request
        .headers()
        .get("x-originator-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        traceparent,
        request_id,
        originator_id,
    )
}

pub fn build(runtime: ComponentRuntime) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health))
        .route("/api/capabilities", get(capabilities::list))
        .route("/api/capabilities/:name/schema", get(capabilities::schema))
        .route("/api/capabilities/:name", post(capabilities::invoke));

    if runtime.component_type() == ComponentType::Agent {
        router = router.route("/process", post(process::process));
    }

    router
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(runtime)
}
