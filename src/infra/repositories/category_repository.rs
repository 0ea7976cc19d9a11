//! Category repository.
//!
//! Every call runs in its own unit of work built by [`Persistence`]; writes
//! are stamped with the caller identity handed in by the service.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::ActiveValue::{NotSet, Set, Unchanged};
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{ColumnTrait, Condition};

use super::entities::category::{self, Column, Entity as CategoryEntity};
use super::{ListQuery, Repository};
use crate::domain::{Category, CategoryListFilter};
use crate::errors::{AppError, AppResult};
use crate::infra::audit::CallerIdentity;
use crate::infra::unit_of_work::Persistence;
use crate::types::{OrderBy, Paging, Predicates};

/// Category repository trait for dependency injection.
///
/// Soft-deleted categories are invisible to every method.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Find a live category by id
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Category>>;

    /// Filter, sort, then page
    async fn list(
        &self,
        filter: CategoryListFilter,
        order: OrderBy<Column>,
        paging: Paging,
    ) -> AppResult<Vec<Category>>;

    /// Find a live category by exact name
    async fn find_by_name(&self, name: String) -> AppResult<Option<Category>>;

    /// Whether a live category other than `exclude_id` already uses `name`
    async fn name_exists(&self, name: String, exclude_id: Option<i32>) -> AppResult<bool>;

    async fn create(
        &self,
        identity: CallerIdentity,
        name: String,
        other_name: String,
    ) -> AppResult<Category>;

    /// Write `category` back, expecting storage to still hold its version
    async fn update(&self, identity: CallerIdentity, category: Category) -> AppResult<Category>;

    /// Soft delete, expecting storage to still hold the category's version
    async fn delete(&self, identity: CallerIdentity, category: Category) -> AppResult<()>;
}

/// Storage-backed [`CategoryRepository`].
#[derive(Clone)]
pub struct CategoryStore {
    persistence: Persistence,
}

impl CategoryStore {
    pub fn new(persistence: Persistence) -> Self {
        Self { persistence }
    }

    fn repository(&self, identity: CallerIdentity) -> Repository<CategoryEntity> {
        self.persistence.repository(Arc::new(identity))
    }

    fn reader(&self) -> Repository<CategoryEntity> {
        self.repository(CallerIdentity::system())
    }
}

/// Only the key and the concurrency token are carried as loaded; everything
/// else is written.
fn tracked(category: &Category) -> category::ActiveModel {
    category::ActiveModel {
        id: Unchanged(category.id),
        version: Unchanged(category.version),
        ..Default::default()
    }
}

/// Literal substring match on either name; `%`, `_` and `\` in the input
/// match only themselves.
fn name_filter(filter: CategoryListFilter) -> Predicates {
    let name = filter.name.filter(|n| !n.trim().is_empty());
    Predicates::new().and_then(name, |name| {
        let pattern = format!("%{}%", escape_like(&name));
        Condition::any()
            .add(Expr::col((CategoryEntity, Column::Name)).like(contains(&pattern)))
            .add(Expr::col((CategoryEntity, Column::OtherName)).like(contains(&pattern)))
    })
}

fn contains(pattern: &str) -> LikeExpr {
    LikeExpr::new(pattern).escape(LIKE_ESCAPE)
}

const LIKE_ESCAPE: char = '\\';

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

fn single(mut models: Vec<category::Model>) -> AppResult<Category> {
    models
        .pop()
        .map(Category::from)
        .ok_or_else(|| AppError::internal("Save completed without returning the category"))
}

#[async_trait]
impl CategoryRepository for CategoryStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Category>> {
        let model = self.reader().get_by_id(id, None).await?;
        Ok(model.map(Category::from))
    }

    async fn list(
        &self,
        filter: CategoryListFilter,
        order: OrderBy<Column>,
        paging: Paging,
    ) -> AppResult<Vec<Category>> {
        let query = ListQuery::new()
            .filter(name_filter(filter))
            .order(order)
            .paging(paging);

        let models = self.reader().list(query).await?;
        Ok(models.into_iter().map(Category::from).collect())
    }

    async fn find_by_name(&self, name: String) -> AppResult<Option<Category>> {
        let query = ListQuery::new()
            .filter(Predicates::new().and(Column::Name.eq(name)))
            .order(OrderBy::ascending(Column::Id))
            .paging(Paging::new(0, 1));

        let mut models = self.reader().list(query).await?;
        Ok(models.pop().map(Category::from))
    }

    async fn name_exists(&self, name: String, exclude_id: Option<i32>) -> AppResult<bool> {
        let predicates = Predicates::new()
            .and(Column::Name.eq(name))
            .and_then(exclude_id, |id| Column::Id.ne(id));

        self.reader().exists(predicates).await
    }

    async fn create(
        &self,
        identity: CallerIdentity,
        name: String,
        other_name: String,
    ) -> AppResult<Category> {
        let mut repo = self.repository(identity);
        repo.add(category::ActiveModel {
            id: NotSet,
            name: Set(name),
            other_name: Set(other_name),
            ..Default::default()
        });

        single(repo.save().await?.models)
    }

    async fn update(&self, identity: CallerIdentity, category: Category) -> AppResult<Category> {
        let mut model = tracked(&category);
        model.name = Set(category.name);
        model.other_name = Set(category.other_name);

        let mut repo = self.repository(identity);
        repo.update(model);

        single(repo.save().await?.models)
    }

    async fn delete(&self, identity: CallerIdentity, category: Category) -> AppResult<()> {
        let mut repo = self.repository(identity);
        repo.delete(tracked(&category));
        repo.save().await?;
        Ok(())
    }
}
