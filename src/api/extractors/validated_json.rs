//! Validated JSON extractor - Combines deserialization with validation.
//!
//! Also holds the query and path extractors so every malformed request
//! surfaces as the same field-keyed `InvalidModel` error.

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::errors::AppError;

/// Validated JSON extractor that automatically validates requests.
///
/// # Example
///
/// ```rust,ignore
/// use crud_template::api::extractors::ValidatedJson;
/// use crud_template::domain::CategoryModel;
///
/// async fn create(ValidatedJson(payload): ValidatedJson<CategoryModel>) {
///     // payload is already validated
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::invalid_model("body", e.body_text()))?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

/// Query string extractor. Range and pattern checks are left to the
/// consumer so they can be reported together with cross-field checks.
pub struct FilterQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for FilterQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e: QueryRejection| AppError::invalid_model("query", e.body_text()))?;

        Ok(FilterQuery(value))
    }
}

/// Integer id from the path.
pub struct IdPath(pub i32);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for IdPath {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|e: PathRejection| AppError::invalid_model("id", e.body_text()))?;

        Ok(IdPath(id))
    }
}
