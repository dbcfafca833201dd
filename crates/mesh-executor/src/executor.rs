//! Runs a `RoutingPlan` against whatever implements [`AgentCaller`],
//! honoring per-step order/parallel/depends_on/retry/timeout semantics.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use mesh_domain::config::ExecutorConfig;
use mesh_domain::plan::{ExecutionMetrics, ExecutionResult, RetryPolicy, RoutingPlan, RoutingStep, StepResult};
use mesh_domain::trace::TraceEvent;
use mesh_domain::{Error, Result};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::caller::AgentCaller;

#[derive(Default)]
struct Counters {
    total: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn record(&self, success: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> ExecutionMetrics {
        ExecutionMetrics {
            total_agent_calls: self.total.load(Ordering::Relaxed),
            failed_agent_calls: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Executes routing plans with bounded concurrency, per-step retry/timeout,
/// and strict dependency gating between order groups.
pub struct Executor {
    caller: Arc<dyn AgentCaller>,
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(caller: Arc<dyn AgentCaller>, config: ExecutorConfig) -> Self {
        Self { caller, config }
    }

    /// Run the plan to completion (or early abort), returning one
    /// `StepResult` per step that was actually dispatched. Steps whose
    /// `depends_on` were never satisfied are skipped and produce no result.
    pub async fn execute(&self, plan: &RoutingPlan, cancel: CancellationToken) -> Result<ExecutionResult> {
        plan.validate().map_err(Error::Validation)?;

        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let counters = Arc::new(Counters::default());
        let step_by_id: HashMap<&str, &RoutingStep> =
            plan.steps.iter().map(|s| (s.id.as_str(), s)).collect();

        let mut completed: HashMap<String, bool> = HashMap::new();
        let mut step_results = Vec::new();
        let mut success = true;

        for (_order, steps) in plan.groups() {
            if !success {
                break;
            }
            if cancel.is_cancelled() {
                break;
            }

            let (runnable, skipped): (Vec<&RoutingStep>, Vec<&RoutingStep>) = steps
                .into_iter()
                .partition(|step| step.depends_on.iter().all(|dep| completed.get(dep.as_str()) == Some(&true)));

            for step in &skipped {
                tracing::warn!(step_id = %step.id, "skipping step: dependency not satisfied");
            }

            let all_parallel = !runnable.is_empty() && runnable.iter().all(|s| s.parallel);
            let group_results = if all_parallel {
                let futures = runnable
                    .iter()
                    .map(|step| self.run_step_permitted(&plan.id, step, &semaphore, &cancel, &counters))
                    .collect::<Vec<_>>();
                join_all(futures).await
            } else {
                let mut out = Vec::with_capacity(runnable.len());
                for step in &runnable {
                    out.push(self.run_step_permitted(&plan.id, step, &semaphore, &cancel, &counters).await);
                }
                out
            };

            for result in &group_results {
                completed.insert(result.step_id.clone(), result.success);
                if let Some(step) = step_by_id.get(result.step_id.as_str()) {
                    if step.required && !result.success {
                        success = false;
                    }
                }
            }
            step_results.extend(group_results);
        }

        Ok(ExecutionResult {
            plan_id: plan.id.clone(),
            step_results,
            success,
            total_duration_ms: start.elapsed().as_millis() as u64,
            metrics: counters.snapshot(),
        })
    }

    async fn run_step_permitted(
        &self,
        plan_id: &str,
        step: &RoutingStep,
        semaphore: &Arc<Semaphore>,
        cancel: &CancellationToken,
        counters: &Arc<Counters>,
    ) -> StepResult {
        let _permit = semaphore.acquire().await.expect("semaphore never closed");
        self.run_step(plan_id, step, cancel, counters).await
    }

    async fn run_step(
        &self,
        plan_id: &str,
        step: &RoutingStep,
        cancel: &CancellationToken,
        counters: &Arc<Counters>,
    ) -> StepResult {
        let start = chrono::Utc::now();
        let attempts = Arc::new(AtomicU32::new(0));
        let timeout_dur = Duration::from_millis(step.timeout_ms.unwrap_or(self.config.default_step_timeout_ms));

        let instruction = match step_instruction(step) {
            Ok(instr) => instr,
            Err(e) => {
                return StepResult {
                    step_id: step.id.clone(),
                    response: String::new(),
                    success: false,
                    error: Some(e.to_string()),
                    attempts: 0,
                    start,
                    end: chrono::Utc::now(),
                };
            }
        };

        let target = match &step.target_namespace {
            Some(ns) => format!("{}.{ns}", step.target_name),
            None => step.target_name.clone(),
        };

        TraceEvent::StepDispatched {
            plan_id: plan_id.to_string(),
            step_id: step.id.clone(),
            target: target.clone(),
        }
        .emit();

        let policy = step.retry.unwrap_or(RetryPolicy {
            max_attempts: self.config.default_max_attempts,
            delay_ms: self.config.default_retry_delay_ms,
            backoff: mesh_domain::plan::BackoffKind::Constant,
        });

        let attempt_fut = self.retry_loop(&target, &instruction, &policy, timeout_dur, cancel, &attempts, counters);

        let outcome = match tokio::time::timeout(timeout_dur, attempt_fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "step '{}' timed out after {}ms",
                step.id,
                timeout_dur.as_millis()
            ))),
        };

        let end = chrono::Utc::now();
        let duration_ms = (end - start).num_milliseconds().max(0) as u64;
        let result = match outcome {
            Ok(response) => StepResult {
                step_id: step.id.clone(),
                response,
                success: true,
                error: None,
                attempts: attempts.load(Ordering::Relaxed),
                start,
                end,
            },
            Err(e) => StepResult {
                step_id: step.id.clone(),
                response: String::new(),
                success: false,
                error: Some(e.to_string()),
                attempts: attempts.load(Ordering::Relaxed),
                start,
                end,
            },
        };

        TraceEvent::StepCompleted {
            plan_id: plan_id.to_string(),
            step_id: result.step_id.clone(),
            success: result.success,
            attempts: result.attempts,
            duration_ms,
        }
        .emit();

        result
    }

    #[allow(clippy::too_many_arguments)]
    async fn retry_loop(
        &self,
        target: &str,
        instruction: &str,
        policy: &RetryPolicy,
        call_timeout: Duration,
        cancel: &CancellationToken,
        attempts: &Arc<AtomicU32>,
        counters: &Arc<Counters>,
    ) -> Result<String> {
        let mut last_err: Option<Error> = None;
        for attempt in 1..=policy.max_attempts.max(1) {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled(format!("step cancelled before attempt {attempt}")));
            }
            attempts.store(attempt, Ordering::Relaxed);

            let call_result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Error::Cancelled("step cancelled mid-call".into())),
                r = self.caller.call(target, instruction, call_timeout) => r,
            };

            match call_result {
                Ok(response) => {
                    counters.record(true);
                    return Ok(response);
                }
                Err(e) if matches!(e, Error::Cancelled(_)) => {
                    return Err(e);
                }
                Err(e) => {
                    counters.record(false);
                    let retriable = e.is_retriable();
                    last_err = Some(e);
                    if !retriable || attempt >= policy.max_attempts.max(1) {
                        break;
                    }
                    tokio::select! {
                        _ = tokio::time::sleep(policy.delay_for_attempt(attempt)) => {},
                        _ = cancel.cancelled() => {
                            return Err(Error::Cancelled("step cancelled during retry backoff".into()));
                        }
                    }
                }
            }
        }
        Err(last_err.unwrap_or_else(|| Error::Other("step exhausted retries with no recorded error".into())))
    }
}

fn step_instruction(step: &RoutingStep) -> Result<String> {
    if let Some(instruction) = &step.instruction {
        return Ok(instruction.clone());
    }
    if let Some(capability) = &step.capability {
        let params = step.parameters.clone().unwrap_or_else(|| serde_json::json!({}));
        return Ok(format!("Invoke capability '{capability}' with parameters: {params}"));
    }
    Err(Error::Validation(format!(
        "step '{}' has neither instruction nor capability",
        step.id
    )))
}
