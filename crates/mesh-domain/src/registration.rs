use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The role a registered component plays in the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentType {
    Tool,
    Agent,
}

/// Health of a registered component as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Healthy,
    Unhealthy,
}

/// A named operation a component can perform, described structurally for
/// discovery and for LLM-assisted routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub input_media_type: Option<String>,
    #[serde(default)]
    pub output_media_type: Option<String>,
    /// Named input fields the capability accepts (required/optional, with
    /// a type hint and an example), summarized for catalog rendering.
    #[serde(default)]
    pub input_fields: Vec<CapabilityField>,
    /// Short string the orchestrator's planning prompt can lean on when
    /// deciding whether this capability matches a user request.
    #[serde(default)]
    pub routing_hint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityField {
    pub name: String,
    pub required: bool,
    #[serde(default)]
    pub type_hint: Option<String>,
    #[serde(default)]
    pub example: Option<String>,
}

/// A component's network address, either a symbolic service name (resolved
/// by the communicator at call time) or a literal address/port pair.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Endpoint {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

/// A single component's registration as stored in the shared catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub component_type: ComponentType,
    pub endpoint: Endpoint,
    pub description: String,
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub health: Health,
    pub last_heartbeat: DateTime<Utc>,
}

impl Registration {
    /// Seconds elapsed since the last heartbeat, relative to `now`.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_heartbeat).num_seconds().max(0)
    }

    /// `true` iff the registration was still fresh (per `ttl_secs`) as of `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl_secs: u64) -> bool {
        self.elapsed_secs(now) < ttl_secs as i64
    }
}

/// A lightweight summary used by the catalog listing and communicator
/// projections — never the source of truth.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationSummary {
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub capabilities: Vec<String>,
    pub health: Health,
    pub last_seen: DateTime<Utc>,
}

impl From<&Registration> for RegistrationSummary {
    fn from(r: &Registration) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            namespace: r.namespace.clone(),
            capabilities: r.capabilities.iter().map(|c| c.name.clone()).collect(),
            health: r.health,
            last_seen: r.last_heartbeat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_registration(last_heartbeat: DateTime<Utc>) -> Registration {
        Registration {
            id: "t1".into(),
            name: "weather".into(),
            namespace: "demo".into(),
            component_type: ComponentType::Tool,
            endpoint: Endpoint {
                service: Some("weather".into()),
                address: None,
                port: Some(8080),
            },
            description: "weather lookups".into(),
            capabilities: vec![Capability {
                name: "get-weather".into(),
                description: "fetch current weather".into(),
                input_media_type: None,
                output_media_type: None,
                input_fields: vec![],
                routing_hint: None,
            }],
            metadata: HashMap::new(),
            health: Health::Healthy,
            last_heartbeat,
        }
    }

    #[test]
    fn is_fresh_within_ttl() {
        let now = Utc::now();
        let reg = sample_registration(now - Duration::seconds(10));
        assert!(reg.is_fresh(now, 60));
    }

    #[test]
    fn is_fresh_false_after_ttl() {
        let now = Utc::now();
        let reg = sample_registration(now - Duration::seconds(120));
        assert!(!reg.is_fresh(now, 60));
    }

    #[test]
    fn summary_collects_capability_names() {
        let now = Utc::now();
        let reg = sample_registration(now);
        let summary = RegistrationSummary::from(&reg);
        assert_eq!(summary.capabilities, vec!["get-weather".to_string()]);
    }
}
