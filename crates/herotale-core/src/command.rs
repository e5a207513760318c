//! Player action abstractions.

use uuid::Uuid;

/// Trait that all player actions implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// The type name for this action (for logging).
    fn command_type(&self) -> &'static str;

    /// Correlation ID to trace this action through its fetches and writes.
    fn correlation_id(&self) -> Uuid;
}
