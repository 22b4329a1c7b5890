//! Managed projects and the release pipeline around their working copies.
//!
//! A project owns one Git working copy, one Subversion working copy and one
//! FTP endpoint. This module holds everything that is project-scoped rather
//! than task-scoped:
//!
//! - Domain types in [`domain`]
//! - Backend port contracts (Git, Subversion, FTP) in [`ports`]
//! - CLI and in-memory backend adapters in [`adapters`]
//! - The project registry and orchestrator facade in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
