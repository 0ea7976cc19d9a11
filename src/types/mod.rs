//! Shared query and response types.

mod list_filter;
pub mod messages;
pub mod order_by;
mod predicates;
mod response;

pub use list_filter::{ListFilter, Paging};
pub use order_by::{compile as compile_order_by, Direction, OrderBy, SortableField, SortableResource};
pub use predicates::Predicates;
pub use response::{Created, NoContent, ResourceCollection};
