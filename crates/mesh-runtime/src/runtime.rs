//! Component lifecycle: register on startup, heartbeat on a ticker, serve
//! the HTTP surface, deregister on shutdown — mirroring `node-sdk`'s
//! connect/ping/reconnect loop, adapted from a persistent socket to
//! periodic registry calls.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mesh_domain::registration::{ComponentType, Endpoint, Health, Registration};
use mesh_domain::{Error, Result};
use mesh_registry::RegistryService;
use tokio_util::sync::CancellationToken;

use crate::capability::CapabilityEntry;
use crate::traits::AgentHandler;

pub(crate) struct ComponentRuntimeInner {
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub description: String,
    pub component_type: ComponentType,
    pub endpoint: Endpoint,
    pub metadata: HashMap<String, String>,
    pub capabilities: HashMap<String, CapabilityEntry>,
    pub agent_handler: Option<Arc<dyn AgentHandler>>,
    pub registry: Arc<RegistryService>,
    pub host: String,
    pub port: u16,
    pub heartbeat_interval: Duration,
    pub ready: AtomicBool,
}

/// A component ready to register and serve. Cheap to clone — every clone
/// shares the same inner state, which is what axum's `State` extractor
/// needs to hand to every handler.
#[derive(Clone)]
pub struct ComponentRuntime(pub(crate) Arc<ComponentRuntimeInner>);

impl ComponentRuntime {
    pub(crate) fn new(inner: ComponentRuntimeInner) -> Self {
        Self(Arc::new(inner))
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }

    pub fn namespace(&self) -> &str {
        &self.0.namespace
    }

    pub fn is_ready(&self) -> bool {
        self.0.ready.load(Ordering::Relaxed)
    }

    pub fn component_type(&self) -> ComponentType {
        self.0.component_type
    }

    pub(crate) fn capability(&self, name: &str) -> Option<&CapabilityEntry> {
        self.0.capabilities.get(name)
    }

    pub(crate) fn capabilities(&self) -> impl Iterator<Item = &CapabilityEntry> {
        self.0.capabilities.values()
    }

    pub(crate) fn agent_handler(&self) -> Option<&Arc<dyn AgentHandler>> {
        self.0.agent_handler.as_ref()
    }

    fn registration(&self) -> Registration {
        Registration {
            id: self.0.id.clone(),
            name: self.0.name.clone(),
            namespace: self.0.namespace.clone(),
            component_type: self.0.component_type,
            endpoint: self.0.endpoint.clone(),
            description: self.0.description.clone(),
            capabilities: self
                .0
                .capabilities
                .values()
                .map(|e| e.descriptor.clone())
                .collect(),
            metadata: self.0.metadata.clone(),
            health: Health::Healthy,
            last_heartbeat: chrono::Utc::now(),
        }
    }

    /// Register with the shared registry, serve the HTTP surface, and run
    /// a heartbeat ticker until `shutdown` fires, then deregister. A
    /// heartbeat failure is logged and retried on the next tick rather
    /// than torn down — the registry's own cache-fallback window absorbs
    /// brief store outages.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        self.0.registry.register(self.registration()).await?;
        self.0.ready.store(true, Ordering::Relaxed);
        tracing::info!(id = %self.0.id, namespace = %self.0.namespace, "component registered");

        let heartbeat_task = {
            let runtime = self.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(runtime.0.heartbeat_interval);
                ticker.tick().await; // first tick fires immediately; registration already counts as "seen"
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            if let Err(e) = runtime.0.registry.heartbeat(&runtime.0.id).await {
                                tracing::warn!(id = %runtime.0.id, error = %e, "heartbeat failed");
                            }
                        }
                        _ = shutdown.cancelled() => break,
                    }
                }
            })
        };

        let addr: SocketAddr = format!("{}:{}", self.0.host, self.0.port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid bind address: {e}")))?;
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(Error::Io)?;
        tracing::info!(%addr, id = %self.0.id, "component listening");

        let router = crate::router::build(self.clone());
        let serve_result = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .await;

        heartbeat_task.abort();
        self.0.ready.store(false, Ordering::Relaxed);

        if let Err(e) = self.0.registry.unregister(&self.0.id).await {
            tracing::warn!(id = %self.0.id, error = %e, "deregistration failed");
        } else {
            tracing::info!(id = %self.0.id, "component deregistered");
        }

        serve_result.map_err(Error::Io)
    }
}
