//! Category service - Handles category-related business logic.
//!
//! Every rule that can fail is checked before anything is written: empty
//! names, then length limits, then existence, then name uniqueness among
//! live categories.

use async_trait::async_trait;
use std::sync::Arc;
use validator::Validate;

use crate::domain::{Category, CategoryListFilter, CategoryModel, CategoryResource};
use crate::errors::{AppError, AppResult, ErrorDetails, OptionExt};
use crate::infra::repositories::entities::category::Column;
use crate::infra::{CallerIdentity, CategoryRepository};
use crate::types::{compile_order_by, messages, ListFilter, OrderBy};

const ENTITY: &str = "Category";

/// Category service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait CategoryService: Send + Sync {
    /// Get a live category by id
    async fn get_category(&self, id: i32) -> AppResult<Category>;

    /// Page through live categories, ordered by `Id` unless the filter asks
    /// otherwise
    async fn list_categories(
        &self,
        filter: ListFilter,
        business: CategoryListFilter,
    ) -> AppResult<Vec<Category>>;

    async fn create_category(
        &self,
        identity: CallerIdentity,
        model: CategoryModel,
    ) -> AppResult<Category>;

    async fn update_category(
        &self,
        identity: CallerIdentity,
        id: i32,
        model: CategoryModel,
    ) -> AppResult<Category>;

    /// Soft delete
    async fn delete_category(&self, identity: CallerIdentity, id: i32) -> AppResult<()>;
}

/// Concrete implementation of CategoryService.
pub struct CategoryManager {
    categories: Arc<dyn CategoryRepository>,
}

impl CategoryManager {
    pub fn new(categories: Arc<dyn CategoryRepository>) -> Self {
        Self { categories }
    }

    async fn load(&self, id: i32) -> AppResult<Category> {
        let found = if id < 1 {
            None
        } else {
            self.categories.find_by_id(id).await?
        };
        found.ok_or_not_found("Id", messages::not_found(ENTITY, id))
    }

    async fn ensure_unique_name(&self, name: &str, exclude_id: Option<i32>) -> AppResult<()> {
        if self.categories.name_exists(name.to_string(), exclude_id).await? {
            return Err(AppError::conflict(
                "Name",
                messages::already_exists("name", name),
            ));
        }
        Ok(())
    }
}

/// Empty fields first, then length limits.
fn check_model(model: &CategoryModel) -> AppResult<()> {
    let mut details = ErrorDetails::new(crate::config::VALIDATION_FAILED_MESSAGE);
    if model.name.trim().is_empty() {
        details.push("Name", messages::not_empty("Name"));
    }
    if model.other_name.trim().is_empty() {
        details.push("OtherName", messages::not_empty("OtherName"));
    }
    if !details.is_empty() {
        return Err(AppError::InvalidModel(details));
    }

    model.validate()?;
    Ok(())
}

#[async_trait]
impl CategoryService for CategoryManager {
    async fn get_category(&self, id: i32) -> AppResult<Category> {
        self.load(id).await
    }

    async fn list_categories(
        &self,
        filter: ListFilter,
        business: CategoryListFilter,
    ) -> AppResult<Vec<Category>> {
        let paging = filter.paging()?;
        let order = compile_order_by::<CategoryResource>(filter.order_by(), &[])?
            .or(OrderBy::ascending(Column::Id));

        self.categories.list(business, order, paging).await
    }

    async fn create_category(
        &self,
        identity: CallerIdentity,
        model: CategoryModel,
    ) -> AppResult<Category> {
        check_model(&model)?;
        self.ensure_unique_name(&model.name, None).await?;

        let category = self
            .categories
            .create(identity, model.name, model.other_name)
            .await?;
        tracing::info!(id = category.id, "Category created");
        Ok(category)
    }

    async fn update_category(
        &self,
        identity: CallerIdentity,
        id: i32,
        model: CategoryModel,
    ) -> AppResult<Category> {
        check_model(&model)?;
        let mut category = self.load(id).await?;
        self.ensure_unique_name(&model.name, Some(id)).await?;

        category.name = model.name;
        category.other_name = model.other_name;
        if let Some(version) = model.version {
            category.version = version;
        }

        self.categories.update(identity, category).await
    }

    async fn delete_category(&self, identity: CallerIdentity, id: i32) -> AppResult<()> {
        let category = self.load(id).await?;
        self.categories.delete(identity, category).await?;
        tracing::info!(id, "Category deleted");
        Ok(())
    }
}
