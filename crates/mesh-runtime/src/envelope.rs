//! Wire shapes for the component HTTP surface: the tool response envelope
//! and the error-to-status-code mapping every handler shares.

use axum::http::StatusCode;
use mesh_domain::Error;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolErrorBody>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolErrorBody {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl ToolResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ToolErrorBody {
                code: error_code(error).to_string(),
                message: error.to_string(),
                retryable: error.is_retriable(),
            }),
        }
    }
}

/// Map an internal error to its HTTP status, per the error taxonomy:
/// validation -> 400, not-found -> 404, rate-limited -> 429,
/// upstream-degraded -> 503, cancelled/timeout -> 504, everything else -> 500.
pub fn error_status(error: &Error) -> StatusCode {
    match error {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        Error::UpstreamDegraded(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Cancelled(_) | Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_code(error: &Error) -> &'static str {
    match error {
        Error::Validation(_) => "validation",
        Error::NotFound(_) => "not_found",
        Error::RateLimited(_) => "rate_limited",
        Error::UpstreamDegraded(_) => "upstream_degraded",
        Error::Cancelled(_) => "cancelled",
        Error::Timeout(_) => "timeout",
        Error::Provider { .. } => "provider_error",
        Error::Http(_) => "http_error",
        Error::PartialCompletion { .. } => "partial_completion",
        Error::Auth(_) => "auth",
        Error::Config(_) => "config",
        Error::Io(_) | Error::Json(_) | Error::Other(_) => "internal",
    }
}
