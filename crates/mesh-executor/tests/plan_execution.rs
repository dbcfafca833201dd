//! Black-box scenario tests against the public `Executor` API.

use async_trait::async_trait;
use mesh_domain::config::ExecutorConfig;
use mesh_domain::plan::{BackoffKind, PlanMode, RetryPolicy, RoutingPlan, RoutingStep};
use mesh_domain::{Error, Result};
use mesh_executor::{AgentCaller, Executor};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct ScriptedCaller {
    responses: Mutex<HashMap<String, Vec<Result<String>>>>,
}

impl ScriptedCaller {
    fn new(responses: HashMap<String, Vec<Result<String>>>) -> Self {
        Self {
            responses: Mutex::new(responses),
        }
    }
}

#[async_trait]
impl AgentCaller for ScriptedCaller {
    async fn call(&self, identifier: &str, _instruction: &str, _timeout: Duration) -> Result<String> {
        let mut responses = self.responses.lock().unwrap();
        let queue = responses
            .get_mut(identifier)
            .unwrap_or_else(|| panic!("unscripted call to {identifier}"));
        queue.remove(0)
    }
}

fn step(id: &str, order: u32, parallel: bool, depends_on: Vec<&str>) -> RoutingStep {
    RoutingStep {
        id: id.into(),
        target_name: id.into(),
        target_namespace: None,
        capability: None,
        parameters: None,
        instruction: Some(format!("do {id}")),
        order,
        parallel,
        depends_on: depends_on.into_iter().map(String::from).collect(),
        required: true,
        timeout_ms: Some(5_000),
        retry: Some(RetryPolicy {
            max_attempts: 2,
            delay_ms: 1,
            backoff: BackoffKind::Constant,
        }),
    }
}

/// Scenario: a plan with an initial step, a parallel pair where one member
/// fails once then succeeds on retry, and a final step that depends on both
/// parallel members. Expected: the plan succeeds and the retried step
/// reports two attempts.
#[tokio::test]
async fn scenario_parallel_retry_then_required_join_succeeds() {
    let mut responses = HashMap::new();
    responses.insert("s1".to_string(), vec![Ok("ok1".to_string())]);
    responses.insert(
        "s2".to_string(),
        vec![Err(Error::Http("503".into())), Ok("ok2".to_string())],
    );
    responses.insert("s3".to_string(), vec![Ok("ok3".to_string())]);
    responses.insert("s4".to_string(), vec![Ok("ok4".to_string())]);

    let plan = RoutingPlan {
        id: "scenario-d".into(),
        mode: PlanMode::Workflow,
        steps: vec![
            step("s1", 1, false, vec![]),
            step("s2", 2, true, vec![]),
            step("s3", 2, true, vec![]),
            step("s4", 3, false, vec!["s2", "s3"]),
        ],
    };

    let executor = Executor::new(Arc::new(ScriptedCaller::new(responses)), ExecutorConfig::default());
    let result = executor.execute(&plan, CancellationToken::new()).await.unwrap();

    assert!(result.success);
    assert_eq!(result.step_results.len(), 4);
    let s2 = result.step_results.iter().find(|r| r.step_id == "s2").unwrap();
    assert_eq!(s2.attempts, 2);
    assert!(result.metrics.total_agent_calls >= 5);
}

/// Scenario: same shape, but the final required step exhausts its retries.
/// Expected: the plan reports failure and never dispatches anything past
/// the failed step's order.
#[tokio::test]
async fn scenario_required_step_exhausts_retries_fails_the_plan() {
    let mut responses = HashMap::new();
    responses.insert("s1".to_string(), vec![Ok("ok1".to_string())]);
    responses.insert(
        "s2".to_string(),
        vec![Err(Error::Http("503".into())), Ok("ok2".to_string())],
    );
    responses.insert("s3".to_string(), vec![Ok("ok3".to_string())]);
    responses.insert(
        "s4".to_string(),
        vec![Err(Error::Http("500".into())), Err(Error::Http("500".into()))],
    );

    let plan = RoutingPlan {
        id: "scenario-e".into(),
        mode: PlanMode::Workflow,
        steps: vec![
            step("s1", 1, false, vec![]),
            step("s2", 2, true, vec![]),
            step("s3", 2, true, vec![]),
            step("s4", 3, false, vec!["s2", "s3"]),
        ],
    };

    let executor = Executor::new(Arc::new(ScriptedCaller::new(responses)), ExecutorConfig::default());
    let result = executor.execute(&plan, CancellationToken::new()).await.unwrap();

    assert!(!result.success);
    let s4 = result.step_results.iter().find(|r| r.step_id == "s4").unwrap();
    assert_eq!(s4.attempts, 2);
    assert!(!s4.success);
}
