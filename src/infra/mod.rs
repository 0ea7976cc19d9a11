//! Infrastructure layer - External systems integration
//!
//! This module handles all storage concerns:
//! - Database connection
//! - Generic and resource repositories
//! - Audit stamping and soft-delete conversion
//! - Unit of Work, transactions and retry

pub mod audit;
pub mod db;
pub mod repositories;
pub mod unit_of_work;

pub use audit::{
    AuditHook, AuditStamp, CallerIdentity, Clock, FixedClock, IdentityProvider, NoCascade,
    SoftDeleteCascade, SystemClock,
};
pub use db::Database;
pub use repositories::{CategoryRepository, CategoryStore, ListQuery, Repository};
pub use unit_of_work::{ExecutionStrategy, Persistence, Session};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::MockCategoryRepository;
