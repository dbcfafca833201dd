//! Point-to-point natural-language RPC between mesh components.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mesh_domain::config::CommunicatorConfig;
use mesh_domain::error::{Error, Result};
use mesh_domain::registration::RegistrationSummary;
use mesh_domain::trace::TraceEvent;
use mesh_registry::RegistryService;
use reqwest::{Client, StatusCode};
use uuid::Uuid;

use crate::address::Address;
use crate::trace_context::TraceContext;

/// RPC client addressed by logical identifier (`name` or `name.namespace`).
///
/// One instance is created per process and reused for its lifetime; the
/// underlying `reqwest::Client` keeps its own connection pool.
pub struct Communicator {
    http: Client,
    config: CommunicatorConfig,
    originator_id: String,
    registry: Option<Arc<RegistryService>>,
    /// Per-identifier base URL overrides, bypassing cluster-DNS address
    /// resolution. Used for tests and alternate topologies.
    url_overrides: HashMap<String, String>,
}

impl Communicator {
    pub fn new(config: CommunicatorConfig, originator_id: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.default_timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            config,
            originator_id: originator_id.into(),
            registry: None,
            url_overrides: HashMap::new(),
        })
    }

    /// Attach a registry so [`get_available_agents`](Self::get_available_agents)
    /// can project its current snapshot.
    pub fn with_registry(mut self, registry: Arc<RegistryService>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Route calls to `identifier` at a literal base URL instead of
    /// resolving it through cluster DNS conventions. Intended for tests
    /// and alternate topologies.
    pub fn with_url_override(mut self, identifier: impl Into<String>, base_url: impl Into<String>) -> Self {
        self.url_overrides.insert(identifier.into(), base_url.into());
        self
    }

    fn base_url_for(&self, identifier: &str) -> String {
        match self.url_overrides.get(identifier) {
            Some(url) => url.clone(),
            None => Address::parse(identifier, &self.config).base_url(&self.config),
        }
    }

    /// Call `identifier` with a plain-text `instruction`, returning the raw
    /// response body. Retries up to `max_attempts` with linear backoff
    /// (`attempt * 1s`): network errors and 5xx are retried, 4xx fails
    /// immediately.
    pub async fn call_agent(
        &self,
        identifier: &str,
        instruction: &str,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let url = format!("{}/process", self.base_url_for(identifier));
        let request_id = Uuid::new_v4().to_string();
        let trace_ctx = TraceContext::new();
        let timeout = timeout.unwrap_or(Duration::from_millis(self.config.default_timeout_ms));

        let mut last_err: Option<Error> = None;

        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
            }

            let start = Instant::now();
            let result = self
                .http
                .post(&url)
                .header("content-type", "text/plain")
                .header("X-Originator-Id", &self.originator_id)
                .header("X-Request-Id", &request_id)
                .header("traceparent", trace_ctx.header_value())
                .timeout(timeout)
                .body(instruction.to_owned())
                .send()
                .await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(resp) => {
                    let status = resp.status();
                    TraceEvent::AgentCallCompleted {
                        identifier: identifier.to_string(),
                        status: status.as_u16(),
                        attempt: attempt + 1,
                        duration_ms,
                    }
                    .emit();

                    if status.is_success() {
                        return resp.text().await.map_err(crate::util::from_reqwest);
                    }
                    if status.is_server_error() {
                        let body = resp.text().await.unwrap_or_default();
                        last_err = Some(Error::Http(format!(
                            "{identifier} returned {status}: {body}"
                        )));
                        continue;
                    }
                    // 4xx — permanent, fail immediately
                    let body = resp.text().await.unwrap_or_default();
                    return Err(Error::Http(format!(
                        "{identifier} returned {status}: {body}"
                    )));
                }
                Err(e) => {
                    TraceEvent::AgentCallCompleted {
                        identifier: identifier.to_string(),
                        status: 0,
                        attempt: attempt + 1,
                        duration_ms,
                    }
                    .emit();
                    last_err = Some(crate::util::from_reqwest(e));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            Error::Http(format!("{identifier}: all retry attempts exhausted"))
        }))
    }

    /// GET `/health`; non-2xx or a transport error is reported as unhealthy.
    pub async fn ping(&self, identifier: &str) -> bool {
        let url = format!("{}/health", self.base_url_for(identifier));
        match self.http.get(&url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    /// Project the registry's current snapshot into lightweight summaries.
    /// Returns an empty list when no registry is attached.
    pub fn get_available_agents(&self) -> Vec<RegistrationSummary> {
        match &self.registry {
            Some(registry) => registry
                .full_catalog()
                .iter()
                .map(RegistrationSummary::from)
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Distinguishes retriable (4xx) client errors a caller might want to
/// special-case (e.g. "no such agent") from transport-level failures.
pub fn is_not_found(err: &Error) -> bool {
    matches!(err, Error::Http(msg) if msg.contains(&StatusCode::NOT_FOUND.to_string()))
}
