//! Service discovery and registry client: a TTL-backed capability catalog
//! shared across the mesh, with a local cache, a circuit breaker guarding
//! the background refresh loop, and snapshot persistence for cold starts.

pub mod catalog;
pub mod circuit;
pub mod service;
pub mod store;

pub use service::{HealthStatus, RegistryService};
pub use store::{InMemoryStore, RedisStore, RegistryStore};
