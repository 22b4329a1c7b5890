//! Shipyard: release orchestration for projects mirrored across Git,
//! Subversion and FTP.
//!
//! Each managed project owns a Git working copy, a Subversion working copy
//! and an FTP endpoint. Mutating commands (regenerate and commit to Git,
//! commit to Subversion, package and upload to FTP) are queued per project
//! and run by a single worker, so commands for one project never overlap
//! while different projects proceed in parallel. Read-only queries bypass
//! the queues.
//!
//! # Architecture
//!
//! Shipyard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for Git, Subversion, FTP and the
//!   task ledger
//! - **Adapters**: Concrete implementations of ports (command line tools,
//!   mounted directories, in-memory fakes)
//!
//! # Modules
//!
//! - [`config`]: Static project configuration
//! - [`project`]: Project registry, backends and the orchestrator facade
//! - [`task`]: Commands, tasks, the task ledger and per-project queues

pub mod config;
pub mod project;
pub mod task;
