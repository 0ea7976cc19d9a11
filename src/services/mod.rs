//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain rules and repositories to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion.

mod auth_service;
mod category_service;
pub mod container;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use auth_service::{AuthService, Authenticator, Claims};
pub use category_service::{CategoryManager, CategoryService};

#[cfg(any(test, feature = "test-utils"))]
pub use category_service::MockCategoryService;

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
