//! Micro-resolution: a focused, low-temperature LLM call that fills in a
//! single step's missing or templated parameter values from the original
//! request and whatever prior steps have already produced.

use mesh_domain::capability::ModelRole;
use mesh_domain::config::OrchestratorConfig;
use mesh_domain::plan::{RoutingStep, StepResult};
use mesh_domain::{Error, Result};
use mesh_providers::{ChatRequest, LlmRouter};

use crate::prompts::micro_resolution_prompt;

/// Resolve `step`'s parameters in place, replacing them with the model's
/// concrete values. Leaves `step.parameters` untouched on parse failure,
/// since a best-effort template is better than no call at all.
pub async fn resolve_parameters(
    router: &LlmRouter,
    config: &OrchestratorConfig,
    request: &str,
    step: &mut RoutingStep,
    prior_results: &[StepResult],
) -> Result<()> {
    let req = ChatRequest {
        messages: micro_resolution_prompt(request, step, prior_results),
        json_mode: true,
        temperature: Some(config.micro_resolution_temperature),
        max_tokens: Some(config.micro_resolution_max_tokens),
        ..Default::default()
    };
    let response = router.chat_for_role(ModelRole::Planner, req).await?;

    let resolved: serde_json::Value = serde_json::from_str(&response.content).map_err(|e| {
        Error::Validation(format!(
            "micro-resolution for step '{}' returned non-JSON output: {e}",
            step.id
        ))
    })?;
    step.parameters = Some(resolved);
    Ok(())
}

/// A step needs micro-resolution when it has no fixed instruction and its
/// parameters are missing or still contain a `{{...}}` placeholder.
pub fn needs_resolution(step: &RoutingStep) -> bool {
    if step.instruction.is_some() {
        return false;
    }
    match &step.parameters {
        None => true,
        Some(value) => value.to_string().contains("{{"),
    }
}
