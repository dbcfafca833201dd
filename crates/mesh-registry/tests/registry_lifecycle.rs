//! Black-box lifecycle tests against the public `mesh-registry` API only.

use chrono::Utc;
use mesh_domain::config::RegistryConfig;
use mesh_domain::registration::{Capability, ComponentType, Endpoint, Health, Registration};
use mesh_registry::{InMemoryStore, RegistryService};
use std::collections::HashMap;
use std::sync::Arc;

fn weather_agent() -> Registration {
    Registration {
        id: "weather-1".into(),
        name: "weather".into(),
        namespace: "demo".into(),
        component_type: ComponentType::Tool,
        endpoint: Endpoint {
            service: Some("weather".into()),
            address: None,
            port: None,
        },
        description: "current weather by city".into(),
        capabilities: vec![Capability {
            name: "get-weather".into(),
            description: "fetch current conditions".into(),
            input_media_type: None,
            output_media_type: None,
            input_fields: vec![],
            routing_hint: Some("use when the user asks about weather".into()),
        }],
        metadata: HashMap::new(),
        health: Health::Healthy,
        last_heartbeat: Utc::now(),
    }
}

#[tokio::test]
async fn register_heartbeat_find_unregister_round_trip() {
    let store = Arc::new(InMemoryStore::new());
    let svc = RegistryService::new(store, RegistryConfig::default());

    svc.register(weather_agent()).await.unwrap();

    let found = svc.find_capability("get-weather").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "weather-1");

    svc.heartbeat("weather-1").await.unwrap();
    let refreshed = svc.find_agent("weather-1").await.unwrap();
    assert_eq!(refreshed.id, "weather-1");

    svc.unregister("weather-1").await.unwrap();
    assert!(svc.find_agent("weather-1").await.is_err());
    assert!(svc.find_capability("get-weather").await.unwrap().is_empty());
}

#[tokio::test]
async fn catalog_for_llm_reflects_registered_agent() {
    let store = Arc::new(InMemoryStore::new());
    let svc = RegistryService::new(store, RegistryConfig::default());
    svc.register(weather_agent()).await.unwrap();

    let text = svc.catalog_for_llm();
    assert!(text.contains("Namespace: demo"));
    assert!(text.contains("weather"));
    assert!(text.contains("get-weather"));
    assert!(text.contains("use when the user asks about weather"));
}

#[tokio::test]
async fn degraded_mode_serves_stale_reads_from_cache_during_outage() {
    let store = Arc::new(InMemoryStore::new());
    let svc = RegistryService::new(store.clone(), RegistryConfig::default());
    svc.register(weather_agent()).await.unwrap();

    store.set_failing(true);

    let still_found = svc.find_agent("weather-1").await.unwrap();
    assert_eq!(still_found.id, "weather-1");

    let status = svc.health_status().await;
    assert!(!status.store_reachable);
    assert!(status.healthy, "cache is non-empty, so overall health holds");

    store.set_failing(false);
    let recovered = svc.health_status().await;
    assert!(recovered.store_reachable);
}
