use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// List response wrapper with timing and the paging window echoed back
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCollection<T: Serialize> {
    pub items: Vec<T>,
    pub total_results: u64,
    pub elapsed_milliseconds: u64,
    pub skip: Option<i32>,
    pub take: Option<i32>,
}

impl<T: Serialize> ResourceCollection<T> {
    pub fn new(items: Vec<T>, elapsed_milliseconds: u64, skip: Option<i32>, take: Option<i32>) -> Self {
        Self {
            total_results: items.len() as u64,
            items,
            elapsed_milliseconds,
            skip,
            take,
        }
    }
}

/// Created response helper (common pattern for POST endpoints)
pub struct Created<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

/// No content response helper (common pattern for DELETE endpoints)
pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> axum::response::Response {
        StatusCode::NO_CONTENT.into_response()
    }
}
