//! The registry service: register/heartbeat/unregister/find, backed by a
//! [`RegistryStore`] with a local read-through cache and a circuit breaker
//! guarding the background refresh loop.

use crate::circuit::CircuitBreaker;
use crate::store::RegistryStore;
use chrono::Utc;
use mesh_domain::config::RegistryConfig;
use mesh_domain::error::{Error, Result};
use mesh_domain::registration::Registration;
use mesh_domain::trace::TraceEvent;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub struct HealthStatus {
    pub healthy: bool,
    pub store_reachable: bool,
    pub namespace: String,
    pub timestamp: chrono::DateTime<Utc>,
}

struct CacheEntry {
    registration: Registration,
}

pub struct RegistryService {
    store: Arc<dyn RegistryStore>,
    cache: RwLock<HashMap<String, CacheEntry>>,
    circuit: CircuitBreaker,
    config: RegistryConfig,
    last_refresh_at: RwLock<Option<Instant>>,
    sync_error_count: AtomicU64,
}

impl RegistryService {
    pub fn new(store: Arc<dyn RegistryStore>, config: RegistryConfig) -> Self {
        let cb = &config.circuit_breaker;
        let circuit = CircuitBreaker::new(
            cb.failure_threshold,
            std::time::Duration::from_secs(cb.cooldown_secs),
            std::time::Duration::from_secs(cb.initial_backoff_secs),
            std::time::Duration::from_secs(cb.max_backoff_secs),
        );
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
            circuit,
            config,
            last_refresh_at: RwLock::new(None),
            sync_error_count: AtomicU64::new(0),
        }
    }

    fn agent_key(&self, id: &str) -> String {
        format!("{}:agents:{}", self.config.namespace, id)
    }

    fn capability_key(&self, capability: &str) -> String {
        format!("{}:capabilities:{}", self.config.namespace, capability)
    }

    fn agent_prefix(&self) -> String {
        format!("{}:agents:", self.config.namespace)
    }

    fn insert_cache(&self, reg: Registration) {
        self.cache
            .write()
            .insert(reg.id.clone(), CacheEntry { registration: reg });
    }

    // ── Public operations ───────────────────────────────────────────

    /// Register a component. Writes the registration and every capability
    /// index entry in one atomic pipeline, then updates the local cache.
    pub async fn register(&self, registration: Registration) -> Result<()> {
        if registration.id.is_empty() || registration.name.is_empty() {
            return Err(Error::Validation(
                "registration requires a non-empty id and name".into(),
            ));
        }

        let key = self.agent_key(&registration.id);
        let value = serde_json::to_string(&registration)?;
        let capability_keys: Vec<(String, u64)> = registration
            .capabilities
            .iter()
            .map(|c| (self.capability_key(&c.name), self.config.ttl_secs + 10))
            .collect();

        self.store
            .write_registration(
                &key,
                &value,
                self.config.ttl_secs,
                &capability_keys,
                &registration.id,
            )
            .await?;

        TraceEvent::ComponentRegistered {
            id: registration.id.clone(),
            namespace: registration.namespace.clone(),
            capability_count: registration.capabilities.len(),
        }
        .emit();

        self.insert_cache(registration);
        Ok(())
    }

    /// Re-read the current registration (cache fallback), stamp a fresh
    /// heartbeat time, and re-write it with a renewed TTL.
    pub async fn heartbeat(&self, id: &str) -> Result<()> {
        let mut registration = self.find_agent(id).await?;
        registration.last_heartbeat = Utc::now();

        let key = self.agent_key(id);
        let value = serde_json::to_string(&registration)?;
        let capability_keys: Vec<(String, u64)> = registration
            .capabilities
            .iter()
            .map(|c| (self.capability_key(&c.name), self.config.ttl_secs + 10))
            .collect();

        self.store
            .write_registration(&key, &value, self.config.ttl_secs, &capability_keys, id)
            .await?;

        TraceEvent::HeartbeatSent {
            id: id.to_string(),
        }
        .emit();

        self.insert_cache(registration);
        Ok(())
    }

    /// Delete the registration and remove it from every capability set it
    /// belonged to. A missing id is not an error.
    pub async fn unregister(&self, id: &str) -> Result<()> {
        let key = self.agent_key(id);
        let capability_set_keys: Vec<String> = self
            .cache
            .read()
            .get(id)
            .map(|e| {
                e.registration
                    .capabilities
                    .iter()
                    .map(|c| self.capability_key(&c.name))
                    .collect()
            })
            .unwrap_or_default();

        self.store
            .delete_registration(&key, &capability_set_keys, id)
            .await?;

        TraceEvent::ComponentDeregistered { id: id.to_string() }.emit();

        self.cache.write().remove(id);
        Ok(())
    }

    /// Find all registrations advertising `capability`. On store failure,
    /// degrades to the cache, filtered to entries within the cache
    /// validity window.
    pub async fn find_capability(&self, capability: &str) -> Result<Vec<Registration>> {
        let set_key = self.capability_key(capability);
        match self.store.capability_members(&set_key).await {
            Ok(ids) => {
                let mut out = Vec::with_capacity(ids.len());
                for id in ids {
                    if let Ok(reg) = self.find_agent(&id).await {
                        out.push(reg);
                    }
                }
                Ok(out)
            }
            Err(e) => {
                tracing::warn!(capability = %capability, error = %e, "store unreachable, falling back to cache");
                TraceEvent::CacheFallback {
                    operation: "find_capability".into(),
                    reason: e.to_string(),
                }
                .emit();
                let matches = self
                    .cached_fresh_registrations()
                    .into_iter()
                    .filter(|r| r.capabilities.iter().any(|c| c.name == capability))
                    .collect();
                Ok(matches)
            }
        }
    }

    /// Find a single registration by id, falling back to cache on store
    /// failure or a cache miss in the store.
    pub async fn find_agent(&self, id: &str) -> Result<Registration> {
        let key = self.agent_key(id);
        match self.store.read_registration(&key).await {
            Ok(Some(raw)) => {
                let reg: Registration = serde_json::from_str(&raw)?;
                self.insert_cache(reg.clone());
                Ok(reg)
            }
            Ok(None) => self.cache_lookup(id),
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "store unreachable, falling back to cache");
                TraceEvent::CacheFallback {
                    operation: "find_agent".into(),
                    reason: e.to_string(),
                }
                .emit();
                self.cache_lookup(id)
            }
        }
    }

    fn cache_lookup(&self, id: &str) -> Result<Registration> {
        let now = Utc::now();
        let cache = self.cache.read();
        match cache.get(id) {
            Some(entry)
                if entry
                    .registration
                    .is_fresh(now, self.config.cache_validity_window_secs) =>
            {
                Ok(entry.registration.clone())
            }
            _ => Err(Error::NotFound(format!("component '{id}' not found"))),
        }
    }

    fn cached_fresh_registrations(&self) -> Vec<Registration> {
        let now = Utc::now();
        self.cache
            .read()
            .values()
            .filter(|e| {
                e.registration
                    .is_fresh(now, self.config.cache_validity_window_secs)
            })
            .map(|e| e.registration.clone())
            .collect()
    }

    /// Current in-process snapshot of the cache (every entry, regardless
    /// of freshness — callers filter as needed).
    pub fn full_catalog(&self) -> Vec<Registration> {
        self.cache
            .read()
            .values()
            .map(|e| e.registration.clone())
            .collect()
    }

    /// Deterministic text catalog suitable for an LLM prompt.
    pub fn catalog_for_llm(&self) -> String {
        let regs = self.full_catalog();
        let last_sync_elapsed = self
            .last_refresh_at
            .read()
            .as_ref()
            .map(|t| t.elapsed().as_secs() as i64)
            .unwrap_or(-1);
        crate::catalog::catalog_for_llm(
            &regs,
            Utc::now(),
            last_sync_elapsed,
            self.sync_error_count.load(Ordering::Relaxed),
        )
    }

    pub async fn health_status(&self) -> HealthStatus {
        let reachable = self.store.ping().await.is_ok();
        HealthStatus {
            healthy: reachable || !self.cache.read().is_empty(),
            store_reachable: reachable,
            namespace: self.config.namespace.clone(),
            timestamp: Utc::now(),
        }
    }

    // ── Background refresh ──────────────────────────────────────────

    /// Rebuild the cache from the shared store. Returns `Ok(())` on
    /// success (and resets the circuit breaker), or an error which the
    /// caller should feed into `circuit.record_failure()`.
    async fn refresh_once(&self) -> Result<()> {
        let prefix = self.agent_prefix();
        let keys = self.store.scan_registration_keys(&prefix).await?;

        let mut fresh = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Ok(Some(raw)) = self.store.read_registration(&key).await {
                if let Ok(reg) = serde_json::from_str::<Registration>(&raw) {
                    fresh.insert(reg.id.clone(), CacheEntry { registration: reg });
                }
            }
        }

        *self.cache.write() = fresh;
        *self.last_refresh_at.write() = Some(Instant::now());

        if let Some(ref path) = self.config.snapshot_path {
            self.write_snapshot(path);
        }

        Ok(())
    }

    fn write_snapshot(&self, path: &str) {
        let regs = self.full_catalog();
        match serde_json::to_vec(&regs) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(path, bytes) {
                    tracing::warn!(path = %path, error = %e, "failed to write registry snapshot");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize registry snapshot"),
        }
    }

    /// Pre-warm the cache from a snapshot file, if present. Call once at
    /// startup before the first refresh.
    pub fn load_snapshot(&self) {
        let Some(ref path) = self.config.snapshot_path else {
            return;
        };
        let Ok(bytes) = std::fs::read(path) else {
            return;
        };
        match serde_json::from_slice::<Vec<Registration>>(&bytes) {
            Ok(regs) => {
                let mut cache = self.cache.write();
                for reg in regs {
                    cache.insert(reg.id.clone(), CacheEntry { registration: reg });
                }
                tracing::info!(path = %path, "pre-warmed registry cache from snapshot");
            }
            Err(e) => tracing::warn!(path = %path, error = %e, "failed to parse registry snapshot"),
        }
    }

    /// Run the background refresh loop until cancelled. Intended to be
    /// spawned as its own Tokio task.
    pub async fn run_refresh_loop(self: Arc<Self>) {
        loop {
            let interval = if self.circuit.is_open() {
                self.circuit.next_backoff()
            } else {
                std::time::Duration::from_secs(self.config.refresh_interval_secs)
            };
            tokio::time::sleep(interval).await;

            if self.circuit.is_open() {
                continue;
            }

            match self.refresh_once().await {
                Ok(()) => {
                    self.circuit.record_success();
                }
                Err(e) => {
                    self.sync_error_count.fetch_add(1, Ordering::Relaxed);
                    let just_opened = self.circuit.record_failure();
                    tracing::warn!(error = %e, "registry background refresh failed");
                    if just_opened {
                        TraceEvent::CircuitOpened {
                            consecutive_failures: self.circuit.consecutive_failures(),
                            cooldown_secs: self.config.circuit_breaker.cooldown_secs,
                        }
                        .emit();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use mesh_domain::registration::{Capability, ComponentType, Endpoint, Health};
    use std::collections::HashMap as StdHashMap;

    fn sample(id: &str) -> Registration {
        Registration {
            id: id.into(),
            name: format!("{id}-name"),
            namespace: "default".into(),
            component_type: ComponentType::Tool,
            endpoint: Endpoint {
                service: Some(id.into()),
                address: None,
                port: None,
            },
            description: "desc".into(),
            capabilities: vec![Capability {
                name: "cap-a".into(),
                description: "does a".into(),
                input_media_type: None,
                output_media_type: None,
                input_fields: vec![],
                routing_hint: None,
            }],
            metadata: StdHashMap::new(),
            health: Health::Healthy,
            last_heartbeat: Utc::now(),
        }
    }

    fn service() -> (Arc<InMemoryStore>, RegistryService) {
        let store = Arc::new(InMemoryStore::new());
        let svc = RegistryService::new(store.clone(), RegistryConfig::default());
        (store, svc)
    }

    #[tokio::test]
    async fn register_then_find_agent() {
        let (_store, svc) = service();
        svc.register(sample("a1")).await.unwrap();
        let found = svc.find_agent("a1").await.unwrap();
        assert_eq!(found.id, "a1");
    }

    #[tokio::test]
    async fn register_rejects_empty_id() {
        let (_store, svc) = service();
        let mut reg = sample("");
        reg.id = String::new();
        let err = svc.register(reg).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn find_capability_returns_registered_member() {
        let (_store, svc) = service();
        svc.register(sample("a1")).await.unwrap();
        let found = svc.find_capability("cap-a").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a1");
    }

    #[tokio::test]
    async fn heartbeat_updates_last_seen() {
        let (_store, svc) = service();
        let mut reg = sample("a1");
        reg.last_heartbeat = Utc::now() - chrono::Duration::seconds(30);
        svc.register(reg).await.unwrap();
        let before = svc.find_agent("a1").await.unwrap().last_heartbeat;
        svc.heartbeat("a1").await.unwrap();
        let after = svc.find_agent("a1").await.unwrap().last_heartbeat;
        assert!(after > before);
    }

    #[tokio::test]
    async fn unregister_removes_from_cache_and_capability_set() {
        let (_store, svc) = service();
        svc.register(sample("a1")).await.unwrap();
        svc.unregister("a1").await.unwrap();
        assert!(svc.find_agent("a1").await.is_err());
        assert!(svc.find_capability("cap-a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unregister_missing_id_is_not_an_error() {
        let (_store, svc) = service();
        svc.unregister("ghost").await.unwrap();
    }

    #[tokio::test]
    async fn find_agent_falls_back_to_cache_on_store_failure() {
        let (store, svc) = service();
        svc.register(sample("a1")).await.unwrap();
        store.set_failing(true);
        let found = svc.find_agent("a1").await.unwrap();
        assert_eq!(found.id, "a1");
    }

    #[tokio::test]
    async fn find_agent_cache_fallback_respects_validity_window() {
        let (store, svc) = service();
        let mut reg = sample("a1");
        reg.last_heartbeat = Utc::now() - chrono::Duration::seconds(1000);
        svc.register(reg).await.unwrap();
        store.set_failing(true);
        let err = svc.find_agent("a1").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn full_catalog_reflects_registered_entries() {
        let (_store, svc) = service();
        svc.register(sample("a1")).await.unwrap();
        svc.register(sample("a2")).await.unwrap();
        assert_eq!(svc.full_catalog().len(), 2);
    }

    #[tokio::test]
    async fn health_status_reports_unreachable_store() {
        let (store, svc) = service();
        store.set_failing(true);
        let status = svc.health_status().await;
        assert!(!status.store_reachable);
    }
}
