//! Autonomous plan generation: turn a natural-language request plus the
//! live catalog into a `RoutingPlan`, resolving each step's capability to
//! a concrete target via the registry.

use mesh_domain::capability::ModelRole;
use mesh_domain::config::OrchestratorConfig;
use mesh_domain::plan::{PlanMode, RoutingPlan, RoutingStep};
use mesh_domain::registration::{Health, Registration};
use mesh_domain::trace::TraceEvent;
use mesh_domain::{Error, Result};
use mesh_providers::{ChatRequest, LlmRouter};
use mesh_registry::RegistryService;
use serde::Deserialize;

use crate::prompts::{plan_correction_prompt, plan_generation_prompt};

/// Shape of a single step as the model emits it: a capability name plus
/// parameters, never a resolved target.
#[derive(Debug, Deserialize)]
struct RawStep {
    id: String,
    capability: String,
    #[serde(default)]
    parameters: Option<serde_json::Value>,
    #[serde(default = "d_order")]
    order: u32,
    #[serde(default)]
    parallel: bool,
    #[serde(default)]
    depends_on: Vec<String>,
    #[serde(default = "d_true")]
    required: bool,
}

fn d_order() -> u32 {
    1
}

fn d_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct RawPlan {
    routing_plan: RawRoutingPlan,
}

#[derive(Debug, Deserialize)]
struct RawRoutingPlan {
    steps: Vec<RawStep>,
}

/// Generate a routing plan for `request` against `catalog`, with one
/// corrective retry if the model's JSON fails to parse.
pub async fn generate_plan(
    router: &LlmRouter,
    registry: &RegistryService,
    config: &OrchestratorConfig,
    plan_id: &str,
    request: &str,
) -> Result<RoutingPlan> {
    let catalog = registry.catalog_for_llm();

    let first_req = ChatRequest {
        messages: plan_generation_prompt(request, &catalog),
        json_mode: true,
        temperature: Some(config.plan_temperature),
        ..Default::default()
    };
    let first_response = router.chat_for_role(ModelRole::Planner, first_req).await?;

    let raw = match parse_raw_plan(&first_response.content) {
        Ok(raw) => raw,
        Err(parse_err) => {
            let retry_req = ChatRequest {
                messages: plan_correction_prompt(request, &catalog, &first_response.content, &parse_err),
                json_mode: true,
                temperature: Some(config.plan_temperature),
                ..Default::default()
            };
            let retry_response = router.chat_for_role(ModelRole::Planner, retry_req).await?;
            parse_raw_plan(&retry_response.content)
                .map_err(|e| Error::Validation(format!("plan generation failed after correction: {e}")))?
        }
    };

    let mut steps = Vec::with_capacity(raw.routing_plan.steps.len());
    for raw_step in raw.routing_plan.steps {
        let target = resolve_target(registry, &raw_step.capability).await?;
        steps.push(RoutingStep {
            id: raw_step.id,
            target_name: target.name,
            target_namespace: Some(target.namespace),
            capability: Some(raw_step.capability),
            parameters: raw_step.parameters,
            instruction: None,
            order: raw_step.order,
            parallel: raw_step.parallel,
            depends_on: raw_step.depends_on,
            required: raw_step.required,
            timeout_ms: None,
            retry: None,
        });
    }

    let plan = RoutingPlan {
        id: plan_id.to_string(),
        mode: PlanMode::Autonomous,
        steps,
    };
    plan.validate().map_err(Error::Validation)?;

    TraceEvent::PlanGenerated {
        plan_id: plan.id.clone(),
        step_count: plan.steps.len(),
        mode: "autonomous".to_string(),
    }
    .emit();

    Ok(plan)
}

fn parse_raw_plan(content: &str) -> std::result::Result<RawPlan, String> {
    serde_json::from_str(content).map_err(|e| e.to_string())
}

/// Resolve a capability name to a concrete registration, preferring a
/// healthy match and falling back to the first match found.
async fn resolve_target(registry: &RegistryService, capability: &str) -> Result<Registration> {
    let candidates = registry.find_capability(capability).await?;
    if candidates.is_empty() {
        return Err(Error::NotFound(format!(
            "no registered component advertises capability '{capability}'"
        )));
    }
    let target = candidates
        .iter()
        .find(|r| r.health == Health::Healthy)
        .cloned()
        .unwrap_or_else(|| candidates[0].clone());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_valid_plan() {
        let json = r#"{"routing_plan": {"steps": [{"id": "s1", "capability": "get_forecast", "parameters": {"city": "Paris"}}]}}"#;
        let raw = parse_raw_plan(json).unwrap();
        assert_eq!(raw.routing_plan.steps.len(), 1);
        assert_eq!(raw.routing_plan.steps[0].order, 1);
        assert!(raw.routing_plan.steps[0].required);
    }

    #[test]
    fn rejects_malformed_json_with_a_readable_error() {
        let err = parse_raw_plan("{not json").unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn parses_explicit_ordering_and_dependencies() {
        let json = r#"{"routing_plan": {"steps": [
            {"id": "s1", "capability": "a", "order": 1},
            {"id": "s2", "capability": "b", "order": 2, "depends_on": ["s1"], "parallel": true, "required": false}
        ]}}"#;
        let raw = parse_raw_plan(json).unwrap();
        assert_eq!(raw.routing_plan.steps[1].depends_on, vec!["s1".to_string()]);
        assert!(!raw.routing_plan.steps[1].required);
    }
}
