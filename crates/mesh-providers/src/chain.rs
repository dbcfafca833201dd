//! Fallback chain client.
//!
//! Wraps an ordered list of providers — built from portable model aliases
//! rather than role config — and tries each in turn until one answers. This
//! is orthogonal to [`crate::router::LlmRouter`]'s role/capability-based
//! fallback: the router picks among *configured roles*, while a chain client
//! is built ad hoc from a caller-supplied list of provider aliases (e.g.
//! `["openai", "anthropic", "gemini"]`) and used outside the role system.

use crate::anthropic::AnthropicProvider;
use crate::google::GoogleProvider;
use crate::openai_compat::OpenAiCompatProvider;
use crate::traits::{ChatRequest, ChatResponse, LlmProvider};
use mesh_domain::error::{Error, Result};
use mesh_domain::stream::{BoxStream, StreamEvent};
use std::sync::Arc;

/// Build a single provider from one of the portable aliases
/// (`"openai"`, `"anthropic"`, `"gemini"`/`"google"`) using the conventional
/// environment variable for that vendor.
fn build_from_alias(alias: &str, namespace: &str) -> Result<Arc<dyn LlmProvider>> {
    match alias {
        "anthropic" => AnthropicProvider::from_env(namespace).map(|p| Arc::new(p) as Arc<dyn LlmProvider>),
        "openai" => {
            OpenAiCompatProvider::from_env(namespace).map(|p| Arc::new(p) as Arc<dyn LlmProvider>)
        }
        "gemini" | "google" => {
            GoogleProvider::from_env(namespace).map(|p| Arc::new(p) as Arc<dyn LlmProvider>)
        }
        other => Err(Error::Config(format!(
            "'{}' is not a provider alias this process can build a fallback chain link from",
            other
        ))),
    }
}

/// Tries an ordered list of providers until one succeeds.
///
/// Construction never fails outright because some aliases couldn't be built
/// (e.g. the credential env var isn't set) — those links are just skipped,
/// with a warning. Only an empty resulting chain is an error.
pub struct FallbackChainClient {
    providers: Vec<Arc<dyn LlmProvider>>,
}

impl FallbackChainClient {
    fn from_providers(providers: Vec<Arc<dyn LlmProvider>>) -> Result<Self> {
        if providers.is_empty() {
            return Err(Error::Config(
                "fallback chain has no usable providers".into(),
            ));
        }
        Ok(Self { providers })
    }

    /// Build a chain from an ordered list of provider aliases, skipping any
    /// that can't be constructed (missing credentials, unknown alias).
    pub fn new(aliases: &[&str], namespace: &str) -> Result<Self> {
        let mut providers = Vec::with_capacity(aliases.len());
        for alias in aliases {
            match build_from_alias(alias, namespace) {
                Ok(provider) => providers.push(provider),
                Err(e) => {
                    tracing::warn!(alias = %alias, error = %e, "skipping unusable fallback chain link");
                }
            }
        }
        Self::from_providers(providers)
    }

    /// Send a chat request to each provider in order, returning the first
    /// success. If every link fails, returns the last link's error.
    pub async fn generate(&self, req: &ChatRequest) -> Result<ChatResponse> {
        let mut last_err: Option<Error> = None;
        for provider in &self.providers {
            match provider.chat(req).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    tracing::warn!(
                        provider = %provider.provider_id(),
                        error = %e,
                        "fallback chain link failed, trying next"
                    );
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| Error::Config("fallback chain has no usable providers".into())))
    }

    /// Stream from the first link in the chain that advertises streaming
    /// support. Unlike [`Self::generate`], streaming does not fail over
    /// mid-stream to the next link — once a stream has started, partial
    /// results belong to whichever provider opened it.
    pub async fn generate_stream(
        &self,
        req: &ChatRequest,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        let provider = self
            .providers
            .iter()
            .find(|p| p.capabilities().supports_streaming)
            .ok_or_else(|| {
                Error::Config("no streaming-capable provider in fallback chain".into())
            })?;
        provider.chat_stream(req).await
    }

    /// The providers in this chain, in try-order.
    pub fn providers(&self) -> &[Arc<dyn LlmProvider>] {
        &self.providers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_domain::capability::LlmCapabilities;

    struct FakeProvider {
        id: &'static str,
        capabilities: LlmCapabilities,
        fails: bool,
    }

    impl FakeProvider {
        fn ok(id: &'static str) -> Self {
            Self {
                id,
                capabilities: LlmCapabilities {
                    supports_streaming: true,
                    ..LlmCapabilities::default()
                },
                fails: false,
            }
        }

        fn failing(id: &'static str) -> Self {
            Self {
                id,
                capabilities: LlmCapabilities::default(),
                fails: true,
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for FakeProvider {
        async fn chat(&self, _req: &ChatRequest) -> Result<ChatResponse> {
            if self.fails {
                return Err(Error::Provider {
                    provider: self.id.to_string(),
                    message: "simulated outage".into(),
                });
            }
            Ok(ChatResponse {
                content: "hi".into(),
                tool_calls: Vec::new(),
                usage: None,
                model: "fake-model".into(),
                finish_reason: Some("stop".into()),
                provider: self.id.to_string(),
            })
        }

        async fn chat_stream(
            &self,
            _req: &ChatRequest,
        ) -> Result<BoxStream<'static, Result<StreamEvent>>> {
            Err(Error::Config("fake provider does not stream".into()))
        }

        async fn embeddings(
            &self,
            _req: crate::traits::EmbeddingsRequest,
        ) -> Result<crate::traits::EmbeddingsResponse> {
            unimplemented!()
        }

        fn capabilities(&self) -> &LlmCapabilities {
            &self.capabilities
        }

        fn provider_id(&self) -> &str {
            self.id
        }
    }

    fn chain_of(providers: Vec<Arc<dyn LlmProvider>>) -> FallbackChainClient {
        FallbackChainClient::from_providers(providers).unwrap()
    }

    #[tokio::test]
    async fn first_success_wins_and_reports_its_own_provider_id() {
        let chain = chain_of(vec![
            Arc::new(FakeProvider::failing("openai")),
            Arc::new(FakeProvider::ok("anthropic")),
            Arc::new(FakeProvider::ok("gemini")),
        ]);
        let resp = chain.generate(&ChatRequest::default()).await.unwrap();
        assert_eq!(resp.provider, "anthropic");
    }

    #[tokio::test]
    async fn every_link_failing_surfaces_the_last_error() {
        let chain = chain_of(vec![
            Arc::new(FakeProvider::failing("openai")),
            Arc::new(FakeProvider::failing("anthropic")),
        ]);
        let err = chain.generate(&ChatRequest::default()).await.unwrap_err();
        assert!(matches!(err, Error::Provider { provider, .. } if provider == "anthropic"));
    }

    #[test]
    fn empty_chain_is_rejected_at_construction() {
        let err = FallbackChainClient::from_providers(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
