mod scheduler;
mod shutdown;

pub use scheduler::{AgentRuntime, RunSummary, StopReason};
pub use shutdown::ShutdownTrigger;
pub use crate::types::RuntimeStatus;
