//! Category handlers.

use std::time::Instant;

use axum::{
    extract::State,
    response::Json,
    routing::get,
    Router,
};

use crate::api::extractors::{FilterQuery, IdPath, ValidatedJson};
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{CategoryListFilter, CategoryModel, CategoryResource};
use crate::errors::AppResult;
use crate::types::{Created, ListFilter, NoContent, ResourceCollection};

/// Create category routes
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}

/// List categories
pub async fn list_categories(
    State(state): State<AppState>,
    FilterQuery(filter): FilterQuery<ListFilter>,
    FilterQuery(business): FilterQuery<CategoryListFilter>,
) -> AppResult<Json<ResourceCollection<CategoryResource>>> {
    let started = Instant::now();
    let (skip, take) = (filter.skip, filter.take);

    let items = state
        .category_service
        .list_categories(filter, business)
        .await?
        .into_iter()
        .map(CategoryResource::from)
        .collect();

    let elapsed = started.elapsed().as_millis() as u64;
    Ok(Json(ResourceCollection::new(items, elapsed, skip, take)))
}

/// Get category by ID
pub async fn get_category(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<Json<CategoryResource>> {
    let category = state.category_service.get_category(id).await?;
    Ok(Json(CategoryResource::from(category)))
}

/// Create a category
pub async fn create_category(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<CategoryModel>,
) -> AppResult<Created<CategoryResource>> {
    let category = state
        .category_service
        .create_category(user.identity(), payload)
        .await?;

    Ok(Created(CategoryResource::from(category)))
}

/// Update a category
pub async fn update_category(
    State(state): State<AppState>,
    user: CurrentUser,
    IdPath(id): IdPath,
    ValidatedJson(payload): ValidatedJson<CategoryModel>,
) -> AppResult<Json<CategoryResource>> {
    let category = state
        .category_service
        .update_category(user.identity(), id, payload)
        .await?;

    Ok(Json(CategoryResource::from(category)))
}

/// Soft delete a category
pub async fn delete_category(
    State(state): State<AppState>,
    user: CurrentUser,
    IdPath(id): IdPath,
) -> AppResult<NoContent> {
    state
        .category_service
        .delete_category(user.identity(), id)
        .await?;

    Ok(NoContent)
}
