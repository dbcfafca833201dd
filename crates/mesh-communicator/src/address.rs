//! Logical-identifier → URL resolution.

use mesh_domain::config::CommunicatorConfig;

/// A parsed `name` or `name.namespace` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub name: String,
    pub namespace: String,
}

impl Address {
    /// Parse an identifier. A bare `name` is resolved against
    /// `config.default_namespace`; `name.namespace` is used as-is.
    pub fn parse(identifier: &str, config: &CommunicatorConfig) -> Self {
        match identifier.split_once('.') {
            Some((name, namespace)) if !name.is_empty() && !namespace.is_empty() => Self {
                name: name.to_string(),
                namespace: namespace.to_string(),
            },
            _ => Self {
                name: identifier.to_string(),
                namespace: config.default_namespace.clone(),
            },
        }
    }

    /// Build the base URL for this address, e.g.
    /// `http://weather.demo.svc.cluster.local:8080`.
    pub fn base_url(&self, config: &CommunicatorConfig) -> String {
        format!(
            "{}://{}.{}.svc.{}:{}",
            config.scheme, self.name, self.namespace, config.cluster_domain, config.default_port
        )
    }
}
