//! The top-level `Orchestrator`: converts a user request into a routing
//! plan (by one of three modes), executes it, and synthesises an answer.

use std::collections::HashMap;
use std::sync::Arc;

use mesh_domain::config::OrchestratorConfig;
use mesh_domain::plan::{ExecutionResult, PlanMode, RoutingPlan};
use mesh_domain::{Error, Result};
use mesh_executor::Executor;
use mesh_providers::LlmRouter;
use mesh_registry::RegistryService;
use tokio_util::sync::CancellationToken;

use crate::micro_resolve::{needs_resolution, resolve_parameters};
use crate::plan_gen::generate_plan;
use crate::synthesis::synthesize;
use crate::workflow::{load_workflow, require_workflow_dir, WorkflowTemplate};

/// A request's outcome: the synthesized answer, whether every required
/// step succeeded, and the raw per-step results for callers that want
/// the detail.
#[derive(Debug, Clone)]
pub struct OrchestrationOutcome {
    pub plan_id: String,
    pub answer: String,
    pub success: bool,
    pub execution: ExecutionResult,
}

/// How to turn the caller's request into a plan.
pub enum RequestMode {
    /// Generate the plan dynamically against the live catalog.
    Autonomous { request: String },
    /// Instantiate a named template with the given inputs; no plan-generation call.
    Workflow {
        template_name: String,
        inputs: HashMap<String, String>,
        request: String,
    },
    /// Instantiate a named template, then resolve each step's parameters
    /// by micro-resolution before dispatch.
    Hybrid {
        template_name: String,
        inputs: HashMap<String, String>,
        request: String,
    },
}

pub struct Orchestrator {
    router: Arc<LlmRouter>,
    executor: Arc<Executor>,
    registry: Arc<RegistryService>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        router: Arc<LlmRouter>,
        executor: Arc<Executor>,
        registry: Arc<RegistryService>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            router,
            executor,
            registry,
            config,
        }
    }

    /// Run a request end to end: build the plan, execute it, synthesize
    /// the final answer. A failed required step still produces an answer
    /// over the partial results, but `success` is flagged false.
    pub async fn run(&self, mode: RequestMode, cancel: CancellationToken) -> Result<OrchestrationOutcome> {
        let plan_id = uuid::Uuid::new_v4().to_string();

        let (mut plan, request) = match mode {
            RequestMode::Autonomous { request } => {
                let plan = generate_plan(&self.router, &self.registry, &self.config, &plan_id, &request).await?;
                (plan, request)
            }
            RequestMode::Workflow {
                template_name,
                inputs,
                request,
            } => {
                let template = self.load_template(&template_name)?;
                let plan = instantiate_template(&plan_id, PlanMode::Workflow, template, &inputs);
                (plan, request)
            }
            RequestMode::Hybrid {
                template_name,
                inputs,
                request,
            } => {
                let template = self.load_template(&template_name)?;
                let mut plan = instantiate_template(&plan_id, PlanMode::Hybrid, template, &inputs);
                self.micro_resolve_plan(&request, &mut plan).await?;
                (plan, request)
            }
        };
        plan.validate().map_err(Error::Validation)?;

        let execution = self.executor.execute(&plan, cancel).await?;

        let answer = synthesize(
            &self.router,
            &self.config,
            &plan_id,
            &request,
            &plan.steps,
            &execution.step_results,
        )
        .await?;

        Ok(OrchestrationOutcome {
            plan_id,
            success: execution.success,
            answer,
            execution,
        })
    }

    fn load_template(&self, name: &str) -> Result<WorkflowTemplate> {
        let dir = require_workflow_dir(&self.config.workflow_dir)?;
        load_workflow(dir, name)
    }

    /// Hybrid mode resolves each step's parameters upfront from the
    /// original request and the workflow's declared inputs, rather than
    /// from prior-step outputs: the executor dispatches a plan as a
    /// single unit and does not hand control back between steps.
    async fn micro_resolve_plan(&self, request: &str, plan: &mut RoutingPlan) -> Result<()> {
        for step in plan.steps.iter_mut() {
            if needs_resolution(step) {
                resolve_parameters(&self.router, &self.config, request, step, &[]).await?;
            }
        }
        Ok(())
    }
}

/// Substitute `{{input}}` placeholders in a template's steps with the
/// caller-provided inputs and stamp the plan id.
fn instantiate_template(
    plan_id: &str,
    mode: PlanMode,
    template: WorkflowTemplate,
    inputs: &HashMap<String, String>,
) -> RoutingPlan {
    let steps = template
        .steps
        .into_iter()
        .map(|mut step| {
            if let Some(instruction) = step.instruction.as_mut() {
                *instruction = substitute(instruction, inputs);
            }
            if let Some(params) = step.parameters.as_mut() {
                substitute_value(params, inputs);
            }
            step
        })
        .collect();

    RoutingPlan {
        id: plan_id.to_string(),
        mode,
        steps,
    }
}

fn substitute(text: &str, inputs: &HashMap<String, String>) -> String {
    let mut out = text.to_string();
    for (key, value) in inputs {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
    }
    out
}

fn substitute_value(value: &mut serde_json::Value, inputs: &HashMap<String, String>) {
    match value {
        serde_json::Value::String(s) => *s = substitute(s, inputs),
        serde_json::Value::Array(items) => {
            for item in items {
                substitute_value(item, inputs);
            }
        }
        serde_json::Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                substitute_value(v, inputs);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_domain::plan::RoutingStep;

    fn template_with_step(instruction: &str) -> WorkflowTemplate {
        WorkflowTemplate {
            name: "t".into(),
            description: String::new(),
            inputs: vec!["city".into()],
            steps: vec![RoutingStep {
                id: "s1".into(),
                target_name: "weather".into(),
                target_namespace: None,
                capability: None,
                parameters: Some(serde_json::json!({"city": "{{city}}"})),
                instruction: Some(instruction.to_string()),
                order: 1,
                parallel: false,
                depends_on: vec![],
                required: true,
                timeout_ms: None,
                retry: None,
            }],
        }
    }

    #[test]
    fn instantiation_substitutes_instruction_and_parameters() {
        let mut inputs = HashMap::new();
        inputs.insert("city".to_string(), "Paris".to_string());
        let plan = instantiate_template("p1", PlanMode::Workflow, template_with_step("weather for {{city}}"), &inputs);

        assert_eq!(plan.steps[0].instruction.as_deref(), Some("weather for Paris"));
        assert_eq!(plan.steps[0].parameters.as_ref().unwrap()["city"], "Paris");
    }

    #[test]
    fn instantiation_leaves_unmatched_placeholders_untouched() {
        let plan = instantiate_template(
            "p1",
            PlanMode::Workflow,
            template_with_step("weather for {{city}}"),
            &HashMap::new(),
        );
        assert_eq!(plan.steps[0].instruction.as_deref(), Some("weather for {{city}}"));
    }
}
