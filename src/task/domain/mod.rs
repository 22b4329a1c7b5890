//! Domain model for queued release tasks.
//!
//! A [`Command`] describes a mutating operation; a [`Task`] records how the
//! project's worker executed it. Task status only moves forward through
//! `pending → running → succeeded | failed`.

mod command;
mod error;
mod ids;
mod task;

pub use command::{Command, CommandAction, CommandKind};
pub use error::{ParseCommandKindError, ParseTaskStatusError, TaskDomainError};
pub use ids::TaskId;
pub use task::{Task, TaskStatus};
