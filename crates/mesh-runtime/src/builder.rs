//! Fluent builder for a component's identity, capabilities, and HTTP
//! surface — the way `node-sdk`'s client builder assembles a node's
//! identity before it ever opens a connection.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use mesh_domain::registration::{Capability, ComponentType, Endpoint};
use mesh_domain::{Error, Result};
use mesh_registry::RegistryService;

use crate::capability::CapabilityEntry;
use crate::runtime::{ComponentRuntime, ComponentRuntimeInner};
use crate::traits::{AgentHandler, CapabilityHandler};

/// Default heartbeat cadence, matching `RegistryConfig`'s own default
/// (`heartbeat_interval_secs`) so a component needs no tuning to stay
/// well under the registry's default TTL.
const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);

pub struct ComponentBuilder {
    registry: Arc<RegistryService>,
    id: Option<String>,
    name: Option<String>,
    namespace: String,
    description: String,
    component_type: ComponentType,
    host: String,
    port: Option<u16>,
    advertise_service: Option<String>,
    heartbeat_interval: Duration,
    metadata: HashMap<String, String>,
    capabilities: Vec<CapabilityEntry>,
    agent_handler: Option<Arc<dyn AgentHandler>>,
}

impl ComponentBuilder {
    pub fn new(registry: Arc<RegistryService>) -> Self {
        Self {
            registry,
            id: None,
            name: None,
            namespace: "default".to_string(),
            description: String::new(),
            component_type: ComponentType::Tool,
            host: "0.0.0.0".to_string(),
            port: None,
            advertise_service: None,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            metadata: HashMap::new(),
            capabilities: Vec::new(),
            agent_handler: None,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Marks this component as an agent rather than a tool; requires
    /// [`agent_handler`](Self::agent_handler) to be set before `build()`.
    pub fn agent(mut self) -> Self {
        self.component_type = ComponentType::Agent;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Advertise a symbolic service name (resolved by the communicator's
    /// cluster-DNS convention) instead of this process's literal host/port.
    pub fn advertise_service(mut self, service: impl Into<String>) -> Self {
        self.advertise_service = Some(service.into());
        self
    }

    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn capability(mut self, descriptor: Capability, handler: Arc<dyn CapabilityHandler>) -> Self {
        self.capabilities.push(CapabilityEntry { descriptor, handler });
        self
    }

    pub fn agent_handler(mut self, handler: Arc<dyn AgentHandler>) -> Self {
        self.agent_handler = Some(handler);
        self
    }

    pub fn build(self) -> Result<ComponentRuntime> {
        let id = self
            .id
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config("component id must be set and non-empty".into()))?;
        let name = self
            .name
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config("component name must be set and non-empty".into()))?;
        let port = self
            .port
            .ok_or_else(|| Error::Config("component port must be set".into()))?;
        if port == 0 {
            return Err(Error::Config("component port must be nonzero".into()));
        }
        if self.component_type == ComponentType::Agent && self.agent_handler.is_none() {
            return Err(Error::Config(
                "an agent component requires an agent handler for POST /process".into(),
            ));
        }

        let endpoint = match &self.advertise_service {
            Some(service) => Endpoint {
                service: Some(service.clone()),
                address: None,
                port: None,
            },
            None => Endpoint {
                service: None,
                address: Some(self.host.clone()),
                port: Some(port),
            },
        };

        let capabilities = self
            .capabilities
            .into_iter()
            .map(|entry| (entry.descriptor.name.clone(), entry))
            .collect();

        Ok(ComponentRuntime::new(ComponentRuntimeInner {
            id,
            name,
            namespace: self.namespace,
            description: self.description,
            component_type: self.component_type,
            endpoint,
            metadata: self.metadata,
            capabilities,
            agent_handler: self.agent_handler,
            registry: self.registry,
            host: self.host,
            port,
            heartbeat_interval: self.heartbeat_interval,
            ready: std::sync::atomic::AtomicBool::new(false),
        }))
    }
}
