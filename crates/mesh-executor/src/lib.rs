pub mod caller;
pub mod executor;

pub use caller::AgentCaller;
pub use executor::Executor;
