//! Task tracking and per-project command queues.
//!
//! A mutating command becomes a task when its project's queue admits it.
//! Tasks move through `Pending`, `Running` and then `Succeeded` or `Failed`,
//! and every transition is recorded in the project's task ledger. The
//! module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - The task ledger port in [`ports`]
//! - The in-memory ledger in [`adapters`]
//! - The queue, its worker and the command executor in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
