//! API middleware.

mod auth;
mod error;

pub use auth::{auth_middleware, CurrentUser};
pub use error::error_mapping_middleware;
