//! Backend adapters for project ports.

pub mod cli;
pub mod memory;
