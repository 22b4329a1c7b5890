//! In-memory backends for tests and dry runs.

mod backend;

pub use backend::{BackendOperation, ConcurrencyProbe, InMemoryBackend, InMemoryBackendProvider};
