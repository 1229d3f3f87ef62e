//! Instance registry interface used by the authorization gate.
use async_trait::async_trait;

pub mod instance;
pub mod memory;

pub use instance::{Instance, InstanceHandle};
pub use memory::InMemoryRegistry;

/// Read-only lookup of instances by identity key.
///
/// The gate only depends on this capability, so the backing store can be
/// swapped (in-memory, database, test double) without touching it.
#[async_trait]
pub trait InstanceRegistry: Send + Sync {
    /// Returns the current record for `key`, or `None` if no such instance exists.
    async fn lookup(&self, key: &str) -> Option<InstanceHandle>;
}
