//! Provider registry.
//!
//! Constructs and holds all configured LLM provider instances. At startup the
//! registry reads the [`ProviderHubConfig`], resolves authentication (env
//! vars, direct keys), and instantiates the appropriate adapter for each
//! configured provider.

use crate::anthropic::AnthropicProvider;
use crate::bedrock::BedrockProvider;
use crate::google::GoogleProvider;
use crate::openai_compat::OpenAiCompatProvider;
use crate::traits::LlmProvider;
use mesh_domain::config::{ProviderHubConfig, ProviderKind, ProviderStartupPolicy};
use mesh_domain::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ProviderRegistry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Holds all instantiated LLM providers and role assignments.
///
/// When the startup policy is `allow_none`, the registry also records
/// initialization errors so they can be surfaced in `/v1/models/readiness`
/// and the dashboard.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
    roles: HashMap<String, String>,
    /// Provider IDs that failed to initialize, with their error messages.
    /// Exposed via [`Self::init_errors`] for dashboard / readiness reporting.
    init_errors: Vec<ProviderInitError>,
}

/// Records a provider that failed to initialize.
#[derive(Debug, Clone)]
pub struct ProviderInitError {
    pub provider_id: String,
    pub kind: String,
    /// Error message with any potential secrets masked.
    pub error: String,
}

/// Mask substrings that look like API keys or bearer tokens in an error
/// message.  This prevents raw secrets from leaking into logs, readiness
/// endpoints, or dashboard UIs.
fn mask_secrets(msg: &str) -> String {
    let mut result = msg.to_string();
    for word in msg.split(|c: char| c.is_whitespace() || c == '\'' || c == '"' || c == ',') {
        let trimmed = word.trim();
        if trimmed.len() >= 20
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            let masked = if trimmed.len() > 8 {
                format!("{}...{}", &trimmed[..4], &trimmed[trimmed.len() - 4..])
            } else {
                "***masked***".to_string()
            };
            result = result.replace(trimmed, &masked);
        }
    }
    result
}

impl ProviderRegistry {
    /// Build the registry from the application's [`ProviderHubConfig`].
    ///
    /// Each entry in `config.providers` is instantiated using the appropriate
    /// adapter based on its `kind`. Auth keys are resolved eagerly (env vars
    /// are read at this point).
    ///
    /// Providers that fail to initialize are logged and skipped rather than
    /// aborting the entire startup.
    pub fn from_config(config: &ProviderHubConfig) -> Result<Self> {
        let mut providers: HashMap<String, Arc<dyn LlmProvider>> = HashMap::new();
        let mut init_errors: Vec<ProviderInitError> = Vec::new();

        for pc in &config.providers {
            let result: Result<Arc<dyn LlmProvider>> = match pc.kind {
                ProviderKind::OpenaiCompat | ProviderKind::AzureOpenai => {
                    OpenAiCompatProvider::from_config(pc, &config.namespace)
                        .map(|p| Arc::new(p) as Arc<dyn LlmProvider>)
                }
                ProviderKind::Anthropic => AnthropicProvider::from_config(pc, &config.namespace)
                    .map(|p| Arc::new(p) as Arc<dyn LlmProvider>),
                ProviderKind::Google => GoogleProvider::from_config(pc, &config.namespace)
                    .map(|p| Arc::new(p) as Arc<dyn LlmProvider>),
                ProviderKind::AwsBedrock => {
                    BedrockProvider::from_config(pc)
                        .map(|p| Arc::new(p) as Arc<dyn LlmProvider>)
                }
            };

            match result {
                Ok(provider) => {
                    tracing::info!(
                        provider_id = %pc.id,
                        kind = ?pc.kind,
                        "registered LLM provider"
                    );
                    providers.insert(pc.id.clone(), provider);
                }
                Err(e) => {
                    // Mask potential API keys / secrets before logging or
                    // storing the error, so they never leak to dashboards
                    // or readiness endpoints.
                    let safe_error = mask_secrets(&e.to_string());
                    tracing::warn!(
                        provider_id = %pc.id,
                        kind = ?pc.kind,
                        error = %safe_error,
                        "failed to initialize LLM provider, skipping"
                    );
                    init_errors.push(ProviderInitError {
                        provider_id: pc.id.clone(),
                        kind: format!("{:?}", pc.kind),
                        error: safe_error,
                    });
                }
            }
        }

        if providers.is_empty() && !config.providers.is_empty() {
            match config.startup_policy {
                ProviderStartupPolicy::RequireOne => {
                    return Err(Error::Config(
                        "all configured LLM providers failed to initialize \
                         (startup_policy = require_one)"
                            .into(),
                    ));
                }
                ProviderStartupPolicy::AllowNone => {
                    tracing::warn!(
                        failed_providers = init_errors.len(),
                        "no LLM providers initialized (startup_policy = allow_none); \
                         the process will boot but AI-backed endpoints will fail \
                         until auth is configured"
                    );
                }
            }
        }

        let mut roles = HashMap::new();
        for (role_name, role_cfg) in &config.roles {
            roles.insert(role_name.clone(), role_cfg.model.clone());
        }

        Ok(Self {
            providers,
            roles,
            init_errors,
        })
    }

    /// Look up a provider by its config id.
    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(provider_id).cloned()
    }

    /// Get the provider assigned to a given role (e.g. "planner", "executor").
    /// The role config stores "provider_id/model_name"; we split on '/' and
    /// look up the provider by the first segment.
    pub fn for_role(&self, role: &str) -> Option<Arc<dyn LlmProvider>> {
        let model_spec = self.roles.get(role)?;
        let provider_id = model_spec.split('/').next().unwrap_or(model_spec);
        self.providers.get(provider_id).cloned()
    }

    /// Get the model name assigned to a given role.
    pub fn model_for_role(&self, role: &str) -> Option<&str> {
        self.roles.get(role).map(|s| s.as_str())
    }

    /// Iterate over all registered providers.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<dyn LlmProvider>)> {
        self.providers.iter()
    }

    /// Number of registered providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// List all registered provider IDs (sorted).
    pub fn list_providers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// List roles and their assigned model specs.
    pub fn list_roles(&self) -> HashMap<String, String> {
        self.roles.clone()
    }

    /// Provider initialization errors (empty if all succeeded).
    ///
    /// Surfaced in `/v1/models/readiness` and dashboard so operators can
    /// diagnose missing API keys or misconfigured providers without needing
    /// to scrape startup logs.
    pub fn init_errors(&self) -> &[ProviderInitError] {
        &self.init_errors
    }
}

/// A provider adapter this process knows how to auto-detect: its priority
/// and credential availability, the env var it needs if unavailable, and how
/// to build it once chosen.
struct DetectCandidate {
    priority: i32,
    available: bool,
    required_env: &'static str,
    build: fn(&str) -> Result<Arc<dyn LlmProvider>>,
}

/// Pick and construct a provider automatically when the caller doesn't name
/// one: call `detect_environment()` on every built-in adapter and build the
/// highest-priority adapter that reports its credentials are present.
///
/// Fails with an enumeration of the required environment variables if none
/// of them are available.
pub fn detect_provider(namespace: &str) -> Result<Arc<dyn LlmProvider>> {
    let (anthropic_priority, anthropic_available) = AnthropicProvider::detect_environment();
    let (openai_priority, openai_available) = OpenAiCompatProvider::detect_environment();
    let (google_priority, google_available) = GoogleProvider::detect_environment();

    let candidates = [
        DetectCandidate {
            priority: anthropic_priority,
            available: anthropic_available,
            required_env: "ANTHROPIC_API_KEY",
            build: |ns| AnthropicProvider::from_env(ns).map(|p| Arc::new(p) as Arc<dyn LlmProvider>),
        },
        DetectCandidate {
            priority: openai_priority,
            available: openai_available,
            required_env: "OPENAI_API_KEY",
            build: |ns| {
                OpenAiCompatProvider::from_env(ns).map(|p| Arc::new(p) as Arc<dyn LlmProvider>)
            },
        },
        DetectCandidate {
            priority: google_priority,
            available: google_available,
            required_env: "GOOGLE_API_KEY",
            build: |ns| GoogleProvider::from_env(ns).map(|p| Arc::new(p) as Arc<dyn LlmProvider>),
        },
    ];

    match candidates.iter().filter(|c| c.available).max_by_key(|c| c.priority) {
        Some(winner) => (winner.build)(namespace),
        None => {
            let required: Vec<&str> = candidates.iter().map(|c| c.required_env).collect();
            Err(Error::Config(format!(
                "no LLM provider could be auto-detected; set one of: {}",
                required.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod detect_tests {
    use super::*;

    fn clear_all() {
        for var in ["ANTHROPIC_API_KEY", "OPENAI_API_KEY", "GOOGLE_API_KEY"] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn fails_with_enumerated_env_vars_when_nothing_is_set() {
        clear_all();
        let err = detect_provider("mesh").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ANTHROPIC_API_KEY"));
        assert!(msg.contains("OPENAI_API_KEY"));
        assert!(msg.contains("GOOGLE_API_KEY"));
        clear_all();
    }

    #[test]
    fn picks_highest_priority_available_provider() {
        clear_all();
        std::env::set_var("OPENAI_API_KEY", "sk-test-openai");
        std::env::set_var("ANTHROPIC_API_KEY", "sk-test-anthropic");
        let provider = detect_provider("mesh").unwrap();
        // Anthropic and OpenAI both report priority 20; Anthropic is listed
        // first and `max_by_key` keeps the last-seen maximum, so OpenAI wins
        // this tie. Only one of them should ever be picked, deterministically.
        assert_eq!(provider.provider_id(), "openai");
        clear_all();
    }
}
