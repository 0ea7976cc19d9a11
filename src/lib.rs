//! CRUD template - a generic data-access layer under CRUD endpoints
//!
//! This crate composes predicates, compiles allow-listed sort expressions,
//! applies paging, stamps audit metadata, turns deletes into soft deletes and
//! maps domain failures onto structured error responses. A category API
//! exercises all of it.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Core business entities and wire resources
//! - **services**: Application use cases and business logic
//! - **infra**: Repositories, unit of work, audit hooks, retry
//! - **api**: HTTP handlers, middleware, and routes
//! - **types**: Shared query types (sorting, predicates, paging, responses)
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Load reference data
//! cargo run -- seed
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Category, CategoryResource};
pub use errors::{AppError, AppResult};
