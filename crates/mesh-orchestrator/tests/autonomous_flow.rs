//! End-to-end exercise of the autonomous mode: a mocked OpenAI-compatible
//! endpoint stands in for the LLM (plan generation + synthesis), an
//! in-memory registry supplies the catalog, and a scripted `AgentCaller`
//! stands in for the network hop to the target component.

use async_trait::async_trait;
use mesh_domain::config::{
    AuthConfig, AuthMode, ExecutorConfig, OrchestratorConfig, ProviderConfig, ProviderHubConfig, ProviderKind,
    RegistryConfig, RoleConfig,
};
use mesh_domain::registration::{Capability, ComponentType, Endpoint, Health, Registration};
use mesh_domain::{Error, Result};
use mesh_executor::{AgentCaller, Executor};
use mesh_orchestrator::{Orchestrator, RequestMode};
use mesh_providers::LlmRouter;
use mesh_registry::{InMemoryStore, RegistryService};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct StaticCaller;

#[async_trait]
impl AgentCaller for StaticCaller {
    async fn call(&self, identifier: &str, _instruction: &str, _timeout: Duration) -> Result<String> {
        match identifier {
            "weather-tool" => Ok("72F and sunny in Paris".to_string()),
            other => Err(Error::NotFound(format!("no fixture response for {other}"))),
        }
    }
}

fn openai_chat_completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "stub-model",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 10, "total_tokens": 20}
    })
}

async fn registry_with_weather_tool() -> RegistryService {
    let store = Arc::new(InMemoryStore::new());
    let registry = RegistryService::new(store, RegistryConfig::default());
    registry
        .register(Registration {
            id: "weather-tool".into(),
            name: "weather-tool".into(),
            namespace: "default".into(),
            component_type: ComponentType::Tool,
            endpoint: Endpoint {
                service: Some("weather-tool".into()),
                address: None,
                port: None,
            },
            description: "Looks up current weather".into(),
            capabilities: vec![Capability {
                name: "get_forecast".into(),
                description: "Current conditions for a city".into(),
                input_media_type: None,
                output_media_type: None,
                input_fields: vec![],
                routing_hint: Some("use for any weather question".into()),
            }],
            metadata: HashMap::new(),
            health: Health::Healthy,
            last_heartbeat: chrono::Utc::now(),
        })
        .await
        .unwrap();
    registry
}

#[tokio::test]
async fn autonomous_request_generates_plan_executes_and_synthesizes() {
    let mock_server = MockServer::start().await;

    let plan_json = json!({
        "routing_plan": {
            "steps": [{
                "id": "s1",
                "capability": "get_forecast",
                "parameters": {"city": "Paris"},
                "order": 1,
                "required": true
            }]
        }
    })
    .to_string();

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_chat_completion(&plan_json)))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(openai_chat_completion("It's 72F and sunny in Paris right now.")),
        )
        .mount(&mock_server)
        .await;

    let mut roles = HashMap::new();
    roles.insert(
        "planner".to_string(),
        RoleConfig {
            model: "primary/stub-model".into(),
            require_tools: false,
            require_json: false,
            require_streaming: false,
            fallbacks: vec![],
        },
    );
    roles.insert(
        "summarizer".to_string(),
        RoleConfig {
            model: "primary/stub-model".into(),
            require_tools: false,
            require_json: false,
            require_streaming: false,
            fallbacks: vec![],
        },
    );
    let provider_config = ProviderHubConfig {
        providers: vec![ProviderConfig {
            id: "primary".into(),
            kind: ProviderKind::OpenaiCompat,
            base_url: mock_server.uri(),
            auth: AuthConfig {
                mode: AuthMode::None,
                ..AuthConfig::default()
            },
            default_model: Some("stub-model".into()),
        }],
        roles,
        ..ProviderHubConfig::default()
    };

    let router = Arc::new(LlmRouter::from_config(&provider_config).unwrap());
    let registry = Arc::new(registry_with_weather_tool().await);
    let executor = Arc::new(Executor::new(Arc::new(StaticCaller), ExecutorConfig::default()));
    let orchestrator = Orchestrator::new(router, executor, registry, OrchestratorConfig::default());

    let outcome = orchestrator
        .run(
            RequestMode::Autonomous {
                request: "what's the weather in Paris?".to_string(),
            },
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.execution.step_results.len(), 1);
    assert!(outcome.answer.contains("72F"));
}
