//! Domain layer - Core business entities and logic
//!
//! This module contains the domain models that represent business concepts
//! independent of infrastructure concerns, plus the wire resources and
//! request models built from them.

pub mod category;

pub use category::{Category, CategoryListFilter, CategoryModel, CategoryResource};
