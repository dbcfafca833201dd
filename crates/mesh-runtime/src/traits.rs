//! The seam between the HTTP surface and whatever actually answers a
//! capability invocation or an agent instruction. Application code
//! implements these and hands `Arc`s of them to a [`ComponentBuilder`](crate::builder::ComponentBuilder).

use async_trait::async_trait;
use mesh_domain::Result;

/// Answers one capability's `POST /api/capabilities/{name}` calls.
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    async fn invoke(&self, input: serde_json::Value) -> Result<serde_json::Value>;
}

/// Answers an agent's `POST /process` calls.
#[async_trait]
pub trait AgentHandler: Send + Sync {
    async fn process(&self, instruction: &str) -> Result<String>;
}
