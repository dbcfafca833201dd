//! Shared-store abstraction for the registry.
//!
//! [`RegistryStore`] is the seam between the registry service and whatever
//! backs the shared catalog. [`RedisStore`] is the production backend;
//! [`InMemoryStore`] is an in-process fake used by tests and by callers
//! that don't want a Redis dependency (single-node deployments).

use async_trait::async_trait;
use mesh_domain::error::{Error, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Operations the registry needs from a shared, TTL-capable key/value +
/// set store. A pipeline call is expected to apply atomically — either
/// all writes land or none do.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Liveness check used by `getHealthStatus()`.
    async fn ping(&self) -> Result<()>;

    /// Write a registration's serialized value under `key` with a TTL, and
    /// add `id` to every capability set in `capability_keys`, each with its
    /// own TTL. Must be atomic: either every write lands or none does.
    async fn write_registration(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
        capability_keys: &[(String, u64)],
        id: &str,
    ) -> Result<()>;

    /// Read a registration's serialized value, if present and unexpired.
    async fn read_registration(&self, key: &str) -> Result<Option<String>>;

    /// Delete a registration key and remove `id` from every capability set
    /// it belongs to.
    async fn delete_registration(&self, key: &str, capability_set_keys: &[String], id: &str) -> Result<()>;

    /// Members of a capability set (ids that advertise that capability).
    async fn capability_members(&self, set_key: &str) -> Result<Vec<String>>;

    /// All registration keys under a namespace, for the background refresh
    /// scan. `prefix` is `{namespace}:agents:`.
    async fn scan_registration_keys(&self, prefix: &str) -> Result<Vec<String>>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Redis-backed store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct RedisStore {
    manager: redis::aio::ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::Config(format!("invalid redis url: {e}")))?;
        let manager = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(|e| Error::Other(format!("redis connection failed: {e}")))?;
        Ok(Self { manager })
    }
}

fn redis_err(e: redis::RedisError) -> Error {
    Error::Other(format!("redis error: {e}"))
}

#[async_trait]
impl RegistryStore for RedisStore {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(redis_err)?;
        Ok(())
    }

    async fn write_registration(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
        capability_keys: &[(String, u64)],
        id: &str,
    ) -> Result<()> {
        let mut conn = self.manager.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.cmd("SET").arg(key).arg(value).arg("EX").arg(ttl_secs);
        for (set_key, ttl) in capability_keys {
            pipe.cmd("SADD").arg(set_key).arg(id);
            pipe.cmd("EXPIRE").arg(set_key).arg(*ttl);
        }
        pipe.query_async::<()>(&mut conn).await.map_err(redis_err)?;
        Ok(())
    }

    async fn read_registration(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(redis_err)
    }

    async fn delete_registration(&self, key: &str, capability_set_keys: &[String], id: &str) -> Result<()> {
        let mut conn = self.manager.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.cmd("DEL").arg(key);
        for set_key in capability_set_keys {
            pipe.cmd("SREM").arg(set_key).arg(id);
        }
        pipe.query_async::<()>(&mut conn).await.map_err(redis_err)?;
        Ok(())
    }

    async fn capability_members(&self, set_key: &str) -> Result<Vec<String>> {
        let mut conn = self.manager.clone();
        redis::cmd("SMEMBERS")
            .arg(set_key)
            .query_async(&mut conn)
            .await
            .map_err(redis_err)
    }

    async fn scan_registration_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut conn = self.manager.clone();
        let pattern = format!("{prefix}*");
        redis::cmd("KEYS")
            .arg(pattern)
            .query_async(&mut conn)
            .await
            .map_err(redis_err)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory fake, for tests and single-node deployments
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Entry {
    value: String,
}

#[derive(Default)]
pub struct InMemoryStore {
    registrations: Mutex<HashMap<String, Entry>>,
    capability_sets: Mutex<HashMap<String, HashSet<String>>>,
    /// When `true`, every call returns an error (simulates an unreachable
    /// shared store for circuit-breaker / cache-fallback tests).
    pub fail: std::sync::atomic::AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    fn check_failing(&self) -> Result<()> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            Err(Error::Other("simulated store outage".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RegistryStore for InMemoryStore {
    async fn ping(&self) -> Result<()> {
        self.check_failing()
    }

    async fn write_registration(
        &self,
        key: &str,
        value: &str,
        _ttl_secs: u64,
        capability_keys: &[(String, u64)],
        id: &str,
    ) -> Result<()> {
        self.check_failing()?;
        self.registrations.lock().unwrap().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
            },
        );
        let mut sets = self.capability_sets.lock().unwrap();
        for (set_key, _ttl) in capability_keys {
            sets.entry(set_key.clone())
                .or_default()
                .insert(id.to_string());
        }
        Ok(())
    }

    async fn read_registration(&self, key: &str) -> Result<Option<String>> {
        self.check_failing()?;
        Ok(self
            .registrations
            .lock()
            .unwrap()
            .get(key)
            .map(|e| e.value.clone()))
    }

    async fn delete_registration(&self, key: &str, capability_set_keys: &[String], id: &str) -> Result<()> {
        self.check_failing()?;
        self.registrations.lock().unwrap().remove(key);
        let mut sets = self.capability_sets.lock().unwrap();
        for set_key in capability_set_keys {
            if let Some(members) = sets.get_mut(set_key) {
                members.remove(id);
            }
        }
        Ok(())
    }

    async fn capability_members(&self, set_key: &str) -> Result<Vec<String>> {
        self.check_failing()?;
        Ok(self
            .capability_sets
            .lock()
            .unwrap()
            .get(set_key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn scan_registration_keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.check_failing()?;
        Ok(self
            .registrations
            .lock()
            .unwrap()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
