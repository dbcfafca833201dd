//! A minimal standalone agent component: its `/process` handler asks the
//! weather tool for a forecast and answers in a sentence. Shows how an
//! agent built on [`mesh_runtime`] reaches other components through
//! [`mesh_communicator`]'s point-to-point RPC rather than bypassing it.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use mesh_communicator::Communicator;
use mesh_domain::config::{CommunicatorConfig, ConfigSeverity, MeshConfig};
use mesh_domain::Result;
use mesh_registry::{InMemoryStore, RegistryService, RegistryStore};
use mesh_runtime::{AgentHandler, ComponentBuilder};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "demo-agent", about = "Runs an example weather-concierge agent")]
struct Cli {
    #[arg(long, default_value = "demo")]
    namespace: String,
    #[arg(long, default_value_t = 18081)]
    port: u16,
    #[arg(long)]
    redis_url: Option<String>,
}

struct WeatherConcierge {
    communicator: Communicator,
}

#[async_trait]
impl AgentHandler for WeatherConcierge {
    async fn process(&self, instruction: &str) -> Result<String> {
        let city = instruction.trim();
        let forecast = self
            .communicator
            .call_agent("weather-tool", city, Some(Duration::from_secs(5)))
            .await?;
        Ok(format!("Here's the forecast for {city}: {forecast}"))
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

    let id = format!("weather-concierge-{}", uuid::Uuid::new_v4());
    let communicator = Communicator::new(CommunicatorConfig::default(), id.clone())?.with_registry(registry.clone());

    let runtime = ComponentBuilder::new(registry)
        .id(id)
        .name("weather-concierge")
        .namespace(cli.namespace)
        .description("answers natural-language weather questions by delegating to the weather tool")
        .port(cli.port)
        .agent()
        .agent_handler(Arc::new(WeatherConcierge { communicator }))
        .build()?;

    tracing::info!(id = runtime.id(), port = cli.port, "weather agent starting");

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
