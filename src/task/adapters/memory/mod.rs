//! In-memory adapters for task ports.

mod ledger;

pub use ledger::InMemoryTaskLedger;
