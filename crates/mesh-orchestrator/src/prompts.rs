//! Prompt assembly for the three LLM-backed orchestrator calls: plan
//! generation, its corrective retry, micro-resolution, and synthesis.

use mesh_domain::plan::{RoutingStep, StepResult};
use mesh_domain::tool::{Message, MessageContent, Role};

const PLAN_SCHEMA_INSTRUCTION: &str = r#"Respond with valid JSON only, matching exactly this schema:
{"routing_plan": {"steps": [{"id": "string", "capability": "string", "parameters": {}, "order": 1, "parallel": false, "depends_on": [], "required": true}]}}
Omit "order"/"parallel"/"depends_on"/"required" only if the default (sequential, non-parallel, no dependencies, required) applies. Do not include any text outside the JSON object."#;

fn system(text: &str) -> Message {
    Message {
        role: Role::System,
        content: MessageContent::Text(text.to_string()),
    }
}

fn user(text: String) -> Message {
    Message {
        role: Role::User,
        content: MessageContent::Text(text),
    }
}

/// Build the prompt for initial plan generation against the live catalog.
pub fn plan_generation_prompt(request: &str, catalog: &str) -> Vec<Message> {
    vec![
        system(PLAN_SCHEMA_INSTRUCTION),
        user(format!(
            "User request:\n{request}\n\nAvailable capabilities:\n{catalog}"
        )),
    ]
}

/// Build the corrective-retry prompt, appending the parser error to the
/// original exchange so the model can see exactly what it got wrong.
pub fn plan_correction_prompt(request: &str, catalog: &str, prior_response: &str, parse_error: &str) -> Vec<Message> {
    let mut messages = plan_generation_prompt(request, catalog);
    messages.push(Message {
        role: Role::Assistant,
        content: MessageContent::Text(prior_response.to_string()),
    });
    messages.push(user(format!(
        "That response failed to parse as the required JSON schema: {parse_error}\n\
         Return corrected JSON only, with no other text."
    )));
    messages
}

/// Build the prompt for resolving a single step's incomplete parameters.
pub fn micro_resolution_prompt(request: &str, step: &RoutingStep, prior_results: &[StepResult]) -> Vec<Message> {
    let mut context = String::new();
    for result in prior_results {
        context.push_str(&format!("- step {}: {}\n", result.step_id, result.response));
    }
    let params = step
        .parameters
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "{}".to_string());

    vec![
        system(
            "Respond with valid JSON only: a flat object of parameter names to concrete \
             values for the requested capability call. No other text.",
        ),
        user(format!(
            "Original request:\n{request}\n\nPrior step results:\n{context}\n\
             Capability to invoke: {}\nKnown parameters so far: {params}\n\
             Fill in any missing or templated parameter values.",
            step.capability.as_deref().unwrap_or("(none)")
        )),
    ]
}

/// Build the synthesis prompt composing a final answer from every executed
/// step's target, instruction, and raw response.
pub fn synthesis_prompt(request: &str, steps: &[RoutingStep], results: &[StepResult]) -> Vec<Message> {
    let mut blocks = String::new();
    for result in results {
        let step = steps.iter().find(|s| s.id == result.step_id);
        let target = step.map(|s| s.target_name.as_str()).unwrap_or("unknown");
        let instruction = step
            .and_then(|s| s.instruction.as_deref())
            .unwrap_or("(capability invocation)");
        blocks.push_str(&format!(
            "Target: {target}\nInstruction: {instruction}\nResponse: {}\n\n",
            result.response
        ));
    }

    vec![
        system("Compose a clear, direct final answer for the user from the step results provided."),
        user(format!(
            "User request:\n{request}\n\nExecuted steps:\n{blocks}\nWrite the final answer."
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_domain::plan::BackoffKind;

    fn sample_step() -> RoutingStep {
        RoutingStep {
            id: "s1".into(),
            target_name: "weather".into(),
            target_namespace: None,
            capability: Some("get_forecast".into()),
            parameters: Some(serde_json::json!({"city": "{{city}}"})),
            instruction: None,
            order: 1,
            parallel: false,
            depends_on: vec![],
            required: true,
            timeout_ms: None,
            retry: None,
        }
    }

    #[test]
    fn plan_prompt_includes_request_and_catalog() {
        let messages = plan_generation_prompt("what's the weather", "weather.get_forecast");
        let rendered = format!("{messages:?}");
        assert!(rendered.contains("what's the weather"));
        assert!(rendered.contains("weather.get_forecast"));
    }

    #[test]
    fn correction_prompt_carries_parser_error() {
        let messages = plan_correction_prompt("req", "catalog", "{not json", "expected `{`");
        let rendered = format!("{messages:?}");
        assert!(rendered.contains("expected `{`"));
        assert_eq!(messages.len(), 4);
    }

    #[test]
    fn micro_resolution_prompt_names_the_capability() {
        let messages = micro_resolution_prompt("what's the weather in Paris", &sample_step(), &[]);
        let rendered = format!("{messages:?}");
        assert!(rendered.contains("get_forecast"));
    }

    #[test]
    fn synthesis_prompt_includes_step_targets_and_responses() {
        let steps = vec![sample_step()];
        let results = vec![StepResult {
            step_id: "s1".into(),
            response: "72F and sunny".into(),
            success: true,
            error: None,
            attempts: 1,
            start: chrono::Utc::now(),
            end: chrono::Utc::now(),
        }];
        let messages = synthesis_prompt("what's the weather", &steps, &results);
        let rendered = format!("{messages:?}");
        assert!(rendered.contains("weather"));
        assert!(rendered.contains("72F and sunny"));
        let _ = BackoffKind::Constant;
    }
}
