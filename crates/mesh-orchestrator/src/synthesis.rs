//! Synthesis: compose the final user-facing answer from every executed
//! step's target, instruction, and raw response.

use mesh_domain::capability::ModelRole;
use mesh_domain::config::OrchestratorConfig;
use mesh_domain::plan::{RoutingStep, StepResult};
use mesh_domain::trace::TraceEvent;
use mesh_domain::Result;
use mesh_providers::{ChatRequest, LlmRouter};

use crate::prompts::synthesis_prompt;

pub async fn synthesize(
    router: &LlmRouter,
    config: &OrchestratorConfig,
    plan_id: &str,
    request: &str,
    steps: &[RoutingStep],
    results: &[StepResult],
) -> Result<String> {
    let started = chrono::Utc::now();

    let req = ChatRequest {
        messages: synthesis_prompt(request, steps, results),
        temperature: Some(config.synthesis_temperature),
        ..Default::default()
    };
    let response = router.chat_for_role(ModelRole::Summarizer, req).await?;

    let duration_ms = (chrono::Utc::now() - started).num_milliseconds().max(0) as u64;
    TraceEvent::SynthesisCompleted {
        plan_id: plan_id.to_string(),
        duration_ms,
    }
    .emit();

    Ok(response.content)
}
