use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a routing plan was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    /// Generated dynamically by an LLM call against the live catalog.
    Autonomous,
    /// Instantiated from a named, externally stored step template.
    Workflow,
    /// A workflow template whose step instructions are resolved per-step
    /// by micro-resolution.
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    Constant,
    Exponential,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_ms: u64,
    pub backoff: BackoffKind,
}

impl RetryPolicy {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let ms = match self.backoff {
            BackoffKind::Constant => self.delay_ms,
            BackoffKind::Exponential => self.delay_ms.saturating_mul(attempt.max(1) as u64),
        };
        Duration::from_millis(ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            delay_ms: 500,
            backoff: BackoffKind::Constant,
        }
    }
}

/// A single step of a routing plan. Either `capability` + `parameters` is
/// set (direct capability invocation) or `instruction` is set (free-form
/// natural-language instruction to an agent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingStep {
    pub id: String,
    pub target_name: String,
    #[serde(default)]
    pub target_namespace: Option<String>,
    #[serde(default)]
    pub capability: Option<String>,
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
    #[serde(default)]
    pub instruction: Option<String>,
    pub order: u32,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default = "d_true")]
    pub required: bool,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
}

fn d_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingPlan {
    pub id: String,
    pub mode: PlanMode,
    pub steps: Vec<RoutingStep>,
}

impl RoutingPlan {
    /// Validate the structural invariants a plan must hold before execution:
    /// unique step ids, and dependencies only on strictly lower orders.
    pub fn validate(&self) -> Result<(), String> {
        use std::collections::{HashMap, HashSet};

        let mut seen = HashSet::new();
        let mut order_by_id = HashMap::new();
        for step in &self.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(format!("duplicate step id '{}'", step.id));
            }
            order_by_id.insert(step.id.as_str(), step.order);
        }

        for step in &self.steps {
            for dep in &step.depends_on {
                match order_by_id.get(dep.as_str()) {
                    None => return Err(format!("step '{}' depends on unknown step '{dep}'", step.id)),
                    Some(dep_order) if *dep_order >= step.order => {
                        return Err(format!(
                            "step '{}' depends on '{dep}' which is not at a strictly lower order",
                            step.id
                        ))
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Steps grouped by ascending `order`.
    pub fn groups(&self) -> Vec<(u32, Vec<&RoutingStep>)> {
        use std::collections::BTreeMap;
        let mut grouped: BTreeMap<u32, Vec<&RoutingStep>> = BTreeMap::new();
        for step in &self.steps {
            grouped.entry(step.order).or_default().push(step);
        }
        grouped.into_iter().collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    pub response: String,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    pub attempts: u32,
    pub start: chrono::DateTime<chrono::Utc>,
    pub end: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    pub total_agent_calls: u64,
    pub failed_agent_calls: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub plan_id: String,
    pub step_results: Vec<StepResult>,
    pub success: bool,
    pub total_duration_ms: u64,
    #[serde(default)]
    pub metrics: ExecutionMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: &str, order: u32, depends_on: Vec<&str>) -> RoutingStep {
        RoutingStep {
            id: id.into(),
            target_name: "tool".into(),
            target_namespace: None,
            capability: Some("cap".into()),
            parameters: None,
            instruction: None,
            order,
            parallel: false,
            depends_on: depends_on.into_iter().map(String::from).collect(),
            required: true,
            timeout_ms: None,
            retry: None,
        }
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let plan = RoutingPlan {
            id: "p1".into(),
            mode: PlanMode::Autonomous,
            steps: vec![step("s1", 1, vec![]), step("s1", 2, vec![])],
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn validate_rejects_same_or_higher_order_dependency() {
        let plan = RoutingPlan {
            id: "p1".into(),
            mode: PlanMode::Autonomous,
            steps: vec![step("s1", 1, vec![]), step("s2", 1, vec!["s1"])],
        };
        assert!(plan.validate().is_err());
    }

    #[test]
    fn validate_accepts_strictly_lower_order_dependency() {
        let plan = RoutingPlan {
            id: "p1".into(),
            mode: PlanMode::Autonomous,
            steps: vec![step("s1", 1, vec![]), step("s2", 2, vec!["s1"])],
        };
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn groups_orders_ascending() {
        let plan = RoutingPlan {
            id: "p1".into(),
            mode: PlanMode::Autonomous,
            steps: vec![step("s2", 2, vec![]), step("s1", 1, vec![])],
        };
        let groups = plan.groups();
        let orders: Vec<u32> = groups.iter().map(|(o, _)| *o).collect();
        assert_eq!(orders, vec![1, 2]);
    }

    #[test]
    fn exponential_backoff_scales_with_attempt() {
        let policy = RetryPolicy {
            max_attempts: 3,
            delay_ms: 100,
            backoff: BackoffKind::Exponential,
        };
        assert_eq!(policy.delay_for_attempt(1).as_millis(), 100);
        assert_eq!(policy.delay_for_attempt(3).as_millis(), 300);
    }

    #[test]
    fn constant_backoff_stays_flat() {
        let policy = RetryPolicy {
            max_attempts: 3,
            delay_ms: 100,
            backoff: BackoffKind::Constant,
        };
        assert_eq!(policy.delay_for_attempt(1).as_millis(), 100);
        assert_eq!(policy.delay_for_attempt(3).as_millis(), 100);
    }
}
