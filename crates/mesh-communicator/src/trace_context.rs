//! Hand-rolled W3C `traceparent` header construction.
//!
//! The pack's tracing usage is span-based (`tracing`/`tracing-opentelemetry`);
//! there is no HTTP-header propagator crate in play here, so the header
//! itself is built as a plain string per the W3C Trace Context spec:
//! `{version}-{trace-id}-{parent-id}-{flags}`.

use uuid::Uuid;

const VERSION: &str = "00";
const SAMPLED_FLAGS: &str = "01";

/// A trace id (32 hex chars) and span id (16 hex chars) for one call.
pub struct TraceContext {
    pub trace_id: String,
    pub span_id: String,
}

impl TraceContext {
    pub fn new() -> Self {
        let trace_id = Uuid::new_v4().simple().to_string();
        let span_id = Uuid::new_v4().simple().to_string()[..16].to_string();
        Self { trace_id, span_id }
    }

    /// Render the `traceparent` header value.
    pub fn header_value(&self) -> String {
        format!(
            "{VERSION}-{}-{}-{SAMPLED_FLAGS}",
            self.trace_id, self.span_id
        )
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_value_has_four_dash_separated_fields() {
        let ctx = TraceContext::new();
        let header = ctx.header_value();
        let parts: Vec<&str> = header.split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "00");
        assert_eq!(parts[1].len(), 32);
        assert_eq!(parts[2].len(), 16);
        assert_eq!(parts[3], "01");
    }

    #[test]
    fn trace_ids_are_unique_per_context() {
        let a = TraceContext::new();
        let b = TraceContext::new();
        assert_ne!(a.trace_id, b.trace_id);
    }
}
