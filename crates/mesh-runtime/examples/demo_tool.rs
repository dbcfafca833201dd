//! A minimal standalone tool component: one capability, backed by
//! nothing but a static reply. Carries no business logic of its own —
//! it exists to show the handful of calls a real tool's `main` makes
//! into [`mesh_runtime`].

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use mesh_domain::config::{ConfigSeverity, MeshConfig};
use mesh_domain::registration::{Capability, CapabilityField};
use mesh_domain::Result;
use mesh_registry::{InMemoryStore, RegistryService, RegistryStore};
use mesh_runtime::{CapabilityHandler, ComponentBuilder};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "demo-tool", about = "Runs an example weather tool component")]
struct Cli {
    #[arg(long, default_value = "demo")]
    namespace: String,
    #[arg(long, default_value_t = 18080)]
    port: u16,
    #[arg(long)]
    redis_url: Option<String>,
}

struct WeatherForecast;

#[async_trait]
impl CapabilityHandler for WeatherForecast {
    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value> {
        let city = input
            .get("city")
            .and_then(|v| v.as_str())
            .ok_or_else(|| mesh_domain::Error::Validation("missing required field 'city'".into()))?;
        Ok(serde_json::json!({
            "city": city,
            "summary": "72F and sunny",
        }))
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = MeshConfig::default();
    config.registry.namespace = cli.namespace.clone();
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!("registry config validation failed");
    }

    let store: Arc<dyn RegistryStore> = match &cli.redis_url {
        Some(url) => Arc::new(
            mesh_registry::RedisStore::connect(url)
                .await
                .context("connecting to redis")?,
        ),
        None => Arc::new(InMemoryStore::new()),
    };
    let registry = Arc::new(RegistryService::new(store, config.registry));

    let runtime = ComponentBuilder::new(registry)
        .id(format!("weather-tool-{}", uuid::Uuid::new_v4()))
        .name("weather")
        .namespace(cli.namespace)
        .description("looks up the current weather for a city")
        .port(cli.port)
        .capability(
            Capability {
                name: "get_forecast".into(),
                description: "fetch the current weather for a named city".into(),
                input_media_type: Some("application/json".into()),
                output_media_type: Some("application/json".into()),
                input_fields: vec![CapabilityField {
                    name: "city".into(),
                    required: true,
                    type_hint: Some("string".into()),
                    example: Some("Paris".into()),
                }],
                routing_hint: None,
            },
            Arc::new(WeatherForecast),
        )
        .build()?;

    tracing::info!(id = runtime.id(), port = cli.port, "weather tool starting");

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown_signal.cancel();
    });

    runtime.run(shutdown).await?;
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install sigterm handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received sigterm, shutting down"),
    }
}
