//! Repository layer - Data access abstraction
//!
//! [`Repository`] is the generic unit of work over one audited entity.
//! Resource repositories such as [`CategoryStore`] sit on top of it and are
//! what services depend on.

mod base;
mod category_repository;
pub mod entities;

pub use base::{
    AuditColumns, AuditedEntity, ChangeState, Committed, Include, ListQuery, PendingChange,
    Repository, SaveHook,
};
pub use category_repository::{CategoryRepository, CategoryStore};

// Export mock for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use category_repository::MockCategoryRepository;
