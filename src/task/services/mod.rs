//! Application services that admit, run and track project tasks.

mod executor;
mod queue;

pub use executor::CommandExecutor;
pub use queue::{ProjectQueue, QueueError};
