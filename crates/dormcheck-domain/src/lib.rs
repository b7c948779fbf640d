// Domain layer - Pure business logic
// No dependencies on infrastructure or application layers

pub mod check_in;
pub mod notification;
pub mod platform;
pub mod session;
pub mod shared;
pub mod task;

// Re-exports for convenience
pub use shared::{AccountId, DomainError, OwnerId, TaskId};
