//! Port contracts for task tracking.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod ledger;

pub use ledger::{TaskLedger, TaskLedgerError, TaskLedgerResult};
