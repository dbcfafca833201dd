mod communicator;
mod executor;
mod logging;
mod orchestrator;
mod providers;
mod registry;

pub use communicator::CommunicatorConfig;
pub use executor::ExecutorConfig;
pub use logging::LoggingConfig;
pub use orchestrator::OrchestratorConfig;
pub use providers::{
    AuthConfig, AuthMode, FallbackConfig, ModelPricing, ProviderConfig, ProviderHubConfig,
    ProviderKind, ProviderStartupPolicy, RoleConfig,
};
pub use registry::{CircuitBreakerConfig, RegistryConfig};

use std::collections::HashSet;
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Top-level configuration for a mesh process, assembled from layered
/// sources (defaults, a TOML file, environment overrides) by the binary
/// that embeds this crate.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
pub struct MeshConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub providers: ProviderHubConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub communicator: CommunicatorConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl MeshConfig {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.registry.namespace.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "registry.namespace".into(),
                message: "namespace must not be empty".into(),
            });
        }

        if self.registry.store_url.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "registry.store_url".into(),
                message: "store_url must not be empty".into(),
            });
        }

        if self.registry.refresh_interval_secs * 2 >= self.registry.ttl_secs {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "registry.refresh_interval_secs".into(),
                message: format!(
                    "refresh_interval_secs ({}) should be well under ttl_secs ({}) to avoid spurious expiry",
                    self.registry.refresh_interval_secs, self.registry.ttl_secs
                ),
            });
        }

        if self.registry.cache_validity_window_secs < self.registry.ttl_secs {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "registry.cache_validity_window_secs".into(),
                message: "cache_validity_window_secs should be at least ttl_secs".into(),
            });
        }

        // Warn when no LLM providers are configured.
        if self.providers.providers.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "providers.providers".into(),
                message: "no LLM providers configured".into(),
            });
        }

        // Track seen provider IDs for duplicate detection.
        let mut seen_ids: HashSet<&str> = HashSet::new();

        for (i, provider) in self.providers.providers.iter().enumerate() {
            if provider.id.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("providers.providers[{i}].id"),
                    message: "provider id must not be empty".into(),
                });
            }
            if provider.base_url.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("providers.providers[{i}].base_url"),
                    message: "provider base_url must not be empty".into(),
                });
            }

            if !provider.base_url.is_empty()
                && !provider.base_url.starts_with("http://")
                && !provider.base_url.starts_with("https://")
            {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("providers.providers[{i}].base_url"),
                    message: format!(
                        "base_url must start with http:// or https:// (got \"{}\")",
                        provider.base_url
                    ),
                });
            }

            if !provider.id.is_empty() && !seen_ids.insert(&provider.id) {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Warning,
                    field: format!("providers.providers[{i}].id"),
                    message: format!(
                        "duplicate provider id \"{}\" — later provider will shadow earlier one",
                        provider.id
                    ),
                });
            }

            // Auth completeness: modes that require credentials must have
            // at least one of env, key, or a non-empty keys list.
            let needs_credentials =
                matches!(provider.auth.mode, AuthMode::ApiKey | AuthMode::QueryParam);
            if needs_credentials {
                let has_env = provider.auth.env.as_ref().is_some_and(|v| !v.is_empty());
                let has_key = provider.auth.key.as_ref().is_some_and(|v| !v.is_empty());
                let has_keys = !provider.auth.keys.is_empty();
                if !has_env && !has_key && !has_keys {
                    errors.push(ConfigError {
                        severity: ConfigSeverity::Error,
                        field: format!("providers.providers[{i}].auth"),
                        message: format!(
                            "provider \"{}\" uses {:?} auth mode but has no auth.env, auth.key, or auth.keys configured",
                            provider.id, provider.auth.mode
                        ),
                    });
                }
            }
        }

        if self.executor.max_concurrency == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "executor.max_concurrency".into(),
                message: "max_concurrency must be greater than 0".into(),
            });
        }

        if self.communicator.default_port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "communicator.default_port".into(),
                message: "default_port must be greater than 0".into(),
            });
        }

        errors
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> MeshConfig {
        MeshConfig {
            providers: ProviderHubConfig {
                providers: vec![ProviderConfig {
                    id: "openai".into(),
                    kind: ProviderKind::OpenaiCompat,
                    base_url: "https://api.openai.com/v1".into(),
                    auth: AuthConfig {
                        mode: AuthMode::ApiKey,
                        env: Some("OPENAI_API_KEY".into()),
                        ..AuthConfig::default()
                    },
                    default_model: None,
                }],
                ..ProviderHubConfig::default()
            },
            ..MeshConfig::default()
        }
    }

    fn find_issue<'a>(issues: &'a [ConfigError], field_prefix: &str) -> Option<&'a ConfigError> {
        issues.iter().find(|e| e.field.starts_with(field_prefix))
    }

    #[test]
    fn valid_config_passes() {
        let issues = valid_config().validate();
        let errors: Vec<_> = issues
            .iter()
            .filter(|e| e.severity == ConfigSeverity::Error)
            .collect();
        assert!(errors.is_empty(), "expected no errors, got: {errors:?}");
    }

    #[test]
    fn empty_namespace_is_error() {
        let mut cfg = valid_config();
        cfg.registry.namespace = String::new();
        let issues = cfg.validate();
        let issue = find_issue(&issues, "registry.namespace").expect("expected namespace error");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn provider_base_url_invalid_scheme_is_error() {
        let mut cfg = valid_config();
        cfg.providers.providers[0].base_url = "ws://localhost:1234".into();
        let issues = cfg.validate();
        let issue = find_issue(&issues, "providers.providers[0].base_url")
            .expect("expected provider base_url error");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn provider_api_key_mode_no_credentials_is_error() {
        let mut cfg = valid_config();
        cfg.providers.providers[0].auth = AuthConfig {
            mode: AuthMode::ApiKey,
            env: None,
            key: None,
            ..AuthConfig::default()
        };
        let issues = cfg.validate();
        let issue =
            find_issue(&issues, "providers.providers[0].auth").expect("expected auth error");
        assert_eq!(issue.severity, ConfigSeverity::Error);
        assert!(issue.message.contains("no auth.env"));
    }

    #[test]
    fn provider_none_auth_mode_no_credentials_is_ok() {
        let mut cfg = valid_config();
        cfg.providers.providers[0].auth = AuthConfig {
            mode: AuthMode::None,
            env: None,
            key: None,
            ..AuthConfig::default()
        };
        let issues = cfg.validate();
        assert!(find_issue(&issues, "providers.providers[0].auth").is_none());
    }

    #[test]
    fn duplicate_provider_ids_is_warning() {
        let mut cfg = valid_config();
        let mut second = cfg.providers.providers[0].clone();
        second.auth.env = Some("OPENAI_API_KEY_2".into());
        cfg.providers.providers.push(second);
        let issues = cfg.validate();
        let dup_issues: Vec<_> = issues
            .iter()
            .filter(|e| e.message.contains("duplicate provider id"))
            .collect();
        assert_eq!(dup_issues.len(), 1);
        assert_eq!(dup_issues[0].severity, ConfigSeverity::Warning);
    }

    #[test]
    fn no_providers_is_warning() {
        let mut cfg = valid_config();
        cfg.providers.providers.clear();
        let issues = cfg.validate();
        let issue =
            find_issue(&issues, "providers.providers").expect("expected no-providers warning");
        assert_eq!(issue.severity, ConfigSeverity::Warning);
    }

    #[test]
    fn zero_concurrency_is_error() {
        let mut cfg = valid_config();
        cfg.executor.max_concurrency = 0;
        let issues = cfg.validate();
        let issue =
            find_issue(&issues, "executor.max_concurrency").expect("expected concurrency error");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn config_error_display_format() {
        let err = ConfigError {
            severity: ConfigSeverity::Error,
            field: "executor.max_concurrency".into(),
            message: "max_concurrency must be greater than 0".into(),
        };
        assert_eq!(
            format!("{err}"),
            "[ERROR] executor.max_concurrency: max_concurrency must be greater than 0"
        );
    }

    #[test]
    fn default_config_round_trips_through_json() {
        let cfg = MeshConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: MeshConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.registry.namespace, cfg.registry.namespace);
    }

    #[test]
    fn empty_object_deserializes_to_all_defaults() {
        let cfg: MeshConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.executor.max_concurrency, 5);
        assert_eq!(cfg.communicator.default_port, 8080);
    }
}
