use serde::{Deserialize, Serialize};

/// Configuration for inter-component RPC addressing and retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunicatorConfig {
    #[serde(default = "d_scheme")]
    pub scheme: String,
    #[serde(default = "d_cluster_domain")]
    pub cluster_domain: String,
    #[serde(default = "d_port")]
    pub default_port: u16,
    #[serde(default = "d_namespace")]
    pub default_namespace: String,
    #[serde(default = "d_timeout_ms")]
    pub default_timeout_ms: u64,
    #[serde(default = "d_attempts")]
    pub max_attempts: u32,
}

impl Default for CommunicatorConfig {
    fn default() -> Self {
        Self {
            scheme: d_scheme(),
            cluster_domain: d_cluster_domain(),
            default_port: d_port(),
            default_namespace: d_namespace(),
            default_timeout_ms: d_timeout_ms(),
            max_attempts: d_attempts(),
        }
    }
}

fn d_scheme() -> String {
    "http".to_string()
}
fn d_cluster_domain() -> String {
    "cluster.local".to_string()
}
fn d_port() -> u16 {
    8080
}
fn d_namespace() -> String {
    "default".to_string()
}
fn d_timeout_ms() -> u64 {
    30_000
}
fn d_attempts() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_k8s_dns_conventions() {
        let cfg = CommunicatorConfig::default();
        assert_eq!(cfg.scheme, "http");
        assert_eq!(cfg.cluster_domain, "cluster.local");
        assert_eq!(cfg.max_attempts, 3);
    }
}
