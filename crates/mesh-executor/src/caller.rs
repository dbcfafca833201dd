//! The seam between the executor and however a step's instruction actually
//! reaches a component. `Communicator` is the real implementation; tests
//! substitute a fake that never touches the network.

use async_trait::async_trait;
use mesh_communicator::Communicator;
use mesh_domain::Result;
use std::time::Duration;

#[async_trait]
pub trait AgentCaller: Send + Sync {
    async fn call(&self, identifier: &str, instruction: &str, timeout: Duration) -> Result<String>;
}

#[async_trait]
impl AgentCaller for Communicator {
    async fn call(&self, identifier: &str, instruction: &str, timeout: Duration) -> Result<String> {
        self.call_agent(identifier, instruction, Some(timeout)).await
    }
}
