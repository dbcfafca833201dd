//! Integration tests for the capability-driven LLM router.
//!
//! Uses the Bedrock stub adapter (no network calls, deterministic errors)
//! to exercise role resolution, capability gating, and fallback chains
//! without depending on any external service.

use mesh_domain::capability::ModelRole;
use mesh_domain::config::{
    AuthConfig, FallbackConfig, ProviderConfig, ProviderHubConfig, ProviderKind, RoleConfig,
};
use mesh_domain::tool::Message;
use mesh_providers::router::LlmRouter;
use mesh_providers::traits::ChatRequest;
use std::collections::HashMap;

fn stub_provider(id: &str) -> ProviderConfig {
    ProviderConfig {
        id: id.to_string(),
        kind: ProviderKind::AwsBedrock,
        base_url: "https://bedrock-runtime.us-east-1.amazonaws.com".into(),
        auth: AuthConfig::default(),
        default_model: Some("stub-model".into()),
    }
}

fn chat_request() -> ChatRequest {
    ChatRequest {
        model: None,
        messages: vec![Message::user("hello")],
        tools: vec![],
        temperature: None,
        max_tokens: None,
        json_mode: false,
    }
}

#[tokio::test]
async fn unknown_role_returns_config_error() {
    let config = ProviderHubConfig {
        providers: vec![stub_provider("primary")],
        ..ProviderHubConfig::default()
    };
    let router = LlmRouter::from_config(&config).unwrap();

    let err = router
        .chat_for_role(ModelRole::Planner, chat_request())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no role config"));
}

#[tokio::test]
async fn primary_and_fallback_exhausted_returns_aggregate_error() {
    let mut roles = HashMap::new();
    roles.insert(
        "planner".to_string(),
        RoleConfig {
            model: "primary/stub-model".into(),
            require_tools: false,
            require_json: false,
            require_streaming: false,
            fallbacks: vec![FallbackConfig {
                model: "secondary/stub-model".into(),
                require_tools: false,
                require_json: false,
            }],
        },
    );
    let config = ProviderHubConfig {
        providers: vec![stub_provider("primary"), stub_provider("secondary")],
        roles,
        ..ProviderHubConfig::default()
    };
    let router = LlmRouter::from_config(&config).unwrap();

    // Both stub providers return a non-retriable "not yet implemented"
    // error, so the router exhausts the fallback chain and surfaces the
    // router-level aggregate error.
    let err = router
        .chat_for_role(ModelRole::Planner, chat_request())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not yet implemented"));
}

#[tokio::test]
async fn fallback_requiring_tools_is_skipped_when_unsupported() {
    let mut roles = HashMap::new();
    roles.insert(
        "executor".to_string(),
        RoleConfig {
            model: "primary/stub-model".into(),
            require_tools: false,
            require_json: false,
            require_streaming: false,
            fallbacks: vec![FallbackConfig {
                model: "secondary/stub-model".into(),
                require_tools: true,
                require_json: false,
            }],
        },
    );
    let config = ProviderHubConfig {
        providers: vec![stub_provider("primary"), stub_provider("secondary")],
        roles,
        ..ProviderHubConfig::default()
    };
    let router = LlmRouter::from_config(&config).unwrap();

    // The bedrock stub's default capabilities support no tools, so the
    // fallback entry is skipped and the aggregate "all models failed"
    // error is returned.
    let err = router
        .chat_for_role(ModelRole::Executor, chat_request())
        .await
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("all models for role 'executor' failed"));
}

#[tokio::test]
async fn registry_exposes_role_model_assignment() {
    let mut roles = HashMap::new();
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
    let config = ProviderHubConfig {
        providers: vec![stub_provider("primary")],
        roles,
        ..ProviderHubConfig::default()
    };
    let router = LlmRouter::from_config(&config).unwrap();

    assert_eq!(router.registry().len(), 1);
    assert_eq!(
        router.registry().model_for_role("summarizer"),
        Some("primary/stub-model")
    );
}
