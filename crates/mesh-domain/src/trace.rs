use serde::Serialize;

/// Structured trace events emitted across every mesh crate. Each is logged
/// as a single `tracing::info!` line carrying the serialized event as a
/// field, so a log pipeline can index on `event` without parsing prose.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    ComponentRegistered {
        id: String,
        namespace: String,
        capability_count: usize,
    },
    HeartbeatSent {
        id: String,
    },
    ComponentDeregistered {
        id: String,
    },
    CacheFallback {
        operation: String,
        reason: String,
    },
    CircuitOpened {
        consecutive_failures: u32,
        cooldown_secs: u64,
    },
    CircuitClosed,
    AgentCallCompleted {
        identifier: String,
        status: u16,
        attempt: u32,
        duration_ms: u64,
    },
    LlmRequest {
        provider: String,
        model: String,
        role: String,
        streaming: bool,
        duration_ms: u64,
        prompt_tokens: Option<u32>,
        completion_tokens: Option<u32>,
    },
    LlmFallback {
        from_provider: String,
        from_model: String,
        to_provider: String,
        to_model: String,
        reason: String,
    },
    PlanGenerated {
        plan_id: String,
        step_count: usize,
        mode: String,
    },
    StepDispatched {
        plan_id: String,
        step_id: String,
        target: String,
    },
    StepCompleted {
        plan_id: String,
        step_id: String,
        success: bool,
        attempts: u32,
        duration_ms: u64,
    },
    SynthesisCompleted {
        plan_id: String,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "mesh_event");
    }
}
