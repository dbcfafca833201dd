//! Per-process HTTP surface and lifecycle (register, heartbeat, serve,
//! deregister) for a mesh tool or agent. Capability and instruction
//! handling itself is supplied by whatever embeds this crate.

pub mod builder;
pub mod capability;
pub mod envelope;
pub mod handlers;
pub mod router;
pub mod runtime;
pub mod traits;

pub use builder::ComponentBuilder;
pub use capability::CapabilityEntry;
pub use envelope::{ToolErrorBody, ToolResponse};
pub use runtime::ComponentRuntime;
pub use traits::{AgentHandler, CapabilityHandler};
