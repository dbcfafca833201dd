use serde::{Deserialize, Serialize};

/// Configuration for the service-discovery registry client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Shared key-value store connection URL (e.g. a Redis URL).
    #[serde(default = "d_store_url")]
    pub store_url: String,
    /// Namespace prefix for all registry keys.
    #[serde(default = "d_namespace")]
    pub namespace: String,
    /// Registration TTL in seconds.
    #[serde(default = "d_ttl")]
    pub ttl_secs: u64,
    /// Heartbeat interval in seconds (should be well under `ttl_secs`).
    #[serde(default = "d_heartbeat")]
    pub heartbeat_interval_secs: u64,
    /// Background refresh interval in seconds.
    #[serde(default = "d_refresh")]
    pub refresh_interval_secs: u64,
    /// Window within which a cached entry is still considered valid
    /// once the shared store becomes unreachable.
    #[serde(default = "d_cache_window")]
    pub cache_validity_window_secs: u64,
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
    /// Optional path for cache snapshot persistence.
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            store_url: d_store_url(),
            namespace: d_namespace(),
            ttl_secs: d_ttl(),
            heartbeat_interval_secs: d_heartbeat(),
            refresh_interval_secs: d_refresh(),
            cache_validity_window_secs: d_cache_window(),
            circuit_breaker: CircuitBreakerConfig::default(),
            snapshot_path: None,
        }
    }
}

/// Circuit breaker guarding the background refresh loop and, transitively,
/// any caller that would otherwise hammer an unreachable shared store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    #[serde(default = "d_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "d_cooldown")]
    pub cooldown_secs: u64,
    #[serde(default = "d_backoff_initial")]
    pub initial_backoff_secs: u64,
    #[serde(default = "d_backoff_max")]
    pub max_backoff_secs: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: d_failure_threshold(),
            cooldown_secs: d_cooldown(),
            initial_backoff_secs: d_backoff_initial(),
            max_backoff_secs: d_backoff_max(),
        }
    }
}

fn d_store_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}
fn d_namespace() -> String {
    "default".to_string()
}
fn d_ttl() -> u64 {
    60
}
fn d_heartbeat() -> u64 {
    20
}
fn d_refresh() -> u64 {
    15
}
fn d_cache_window() -> u64 {
    120
}
fn d_failure_threshold() -> u32 {
    5
}
fn d_cooldown() -> u64 {
    120
}
fn d_backoff_initial() -> u64 {
    1
}
fn d_backoff_max() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_refresh_well_under_ttl() {
        let cfg = RegistryConfig::default();
        assert!(cfg.refresh_interval_secs * 2 < cfg.ttl_secs);
        assert!(cfg.cache_validity_window_secs >= cfg.ttl_secs);
    }

    #[test]
    fn deserializes_from_partial_json() {
        let json = r#"{"namespace": "prod"}"#;
        let cfg: RegistryConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.namespace, "prod");
        assert_eq!(cfg.ttl_secs, 60);
    }
}
