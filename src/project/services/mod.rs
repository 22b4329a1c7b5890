//! Project registry, Git snapshot cache and the orchestrator facade.

mod cache;
mod error;
mod orchestrator;
mod registry;

pub use cache::GitInfoCache;
pub use error::{OrchestratorError, OrchestratorResult};
pub use orchestrator::{CommandRequest, Orchestrator};
pub use registry::{ProjectHandle, ProjectRegistry};
