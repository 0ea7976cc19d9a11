//! Centralized error handling.
//!
//! Domain failures (`NotFound`, `InvalidModel`, `Conflict`, `Forbidden`) carry a
//! field-keyed message bag. Everything else is a fault that renders without
//! field messages. The HTTP status and log severity of every variant are fixed
//! here so handlers never pick them by hand.

use std::collections::{BTreeMap, BTreeSet};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::VALIDATION_FAILED_MESSAGE;

/// Field name -> distinct messages for that field.
pub type ErrorBag = BTreeMap<String, BTreeSet<String>>;

/// Message text returned in place of the real one outside diagnostic mode.
pub const GENERIC_ERROR_MESSAGE: &str =
    "An error has occurred and has been logged. Use the traceId value for any inquiries.";

/// Payload of a domain error: a top-level message plus the field bag.
///
/// The bag is never absent; an error without field messages has an empty map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorDetails {
    pub message: String,
    pub errors: ErrorBag,
}

impl ErrorDetails {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: ErrorBag::new(),
        }
    }

    /// Add a message for `field`. Repeated messages collapse.
    pub fn with(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.push(field, message);
        self
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .insert(message.into());
    }

    /// Merge another bag into this one.
    pub fn extend(&mut self, other: ErrorBag) {
        for (field, messages) in other {
            self.errors.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Domain errors
    #[error("{}", .0.message)]
    NotFound(ErrorDetails),

    #[error("{}", .0.message)]
    InvalidModel(ErrorDetails),

    #[error("{}", .0.message)]
    Conflict(ErrorDetails),

    #[error("{}", .0.message)]
    Forbidden(ErrorDetails),

    // Authentication
    #[error("Authentication required")]
    Unauthorized,

    #[error("Authentication error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    // Storage
    #[error("Concurrency conflict: {0}")]
    Concurrency(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Operation failed after {attempts} attempts")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<AppError>,
    },

    // Internal
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Coarse classification used for status mapping and log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidModel,
    Conflict,
    Forbidden,
    Unauthorized,
    Concurrency,
    Fault,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::InvalidModel(_) => ErrorKind::InvalidModel,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::Unauthorized | AppError::Jwt(_) => ErrorKind::Unauthorized,
            AppError::Concurrency(_) => ErrorKind::Concurrency,
            AppError::Database(_) | AppError::RetriesExhausted { .. } | AppError::Internal(_) => {
                ErrorKind::Fault
            }
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidModel => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict | ErrorKind::Concurrency => StatusCode::CONFLICT,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Fault => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Domain errors are expected outcomes of a request.
    pub fn is_domain(&self) -> bool {
        self.details().is_some()
    }

    /// Logged at warning level rather than error level.
    pub fn is_warning(&self) -> bool {
        self.is_domain() || self.kind() == ErrorKind::Unauthorized
    }

    /// Failures worth replaying: the storage connection dropped or could not
    /// be acquired.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::Database(sea_orm::DbErr::Conn(_))
                | AppError::Database(sea_orm::DbErr::ConnectionAcquire(_))
        )
    }

    pub fn details(&self) -> Option<&ErrorDetails> {
        match self {
            AppError::NotFound(d)
            | AppError::InvalidModel(d)
            | AppError::Conflict(d)
            | AppError::Forbidden(d) => Some(d),
            _ => None,
        }
    }

    /// Field messages exposed to the client.
    pub fn error_bag(&self) -> ErrorBag {
        match self {
            AppError::Concurrency(_) => ErrorDetails::default()
                .with("version", "Version value is not valid.")
                .errors,
            _ => self
                .details()
                .map(|d| d.errors.clone())
                .unwrap_or_default(),
        }
    }

    /// Build the wire body for this error.
    pub fn to_error_response(&self, trace_id: &str, diagnostics: bool) -> ErrorResponse {
        ErrorReport::from(self).render(trace_id, diagnostics)
    }
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub trace_id: String,
    pub message: String,
    pub error_details: ErrorBag,
    pub stack_trace: String,
}

/// Snapshot of an error taken when it becomes a response.
///
/// Stored in the response extensions so the error-mapping middleware can log
/// it and re-render the body with the trace id and the diagnostic setting.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub warning: bool,
    pub message: String,
    pub detail: String,
    pub error_details: ErrorBag,
}

impl ErrorReport {
    pub fn render(&self, trace_id: &str, diagnostics: bool) -> ErrorResponse {
        let (message, stack_trace) = if diagnostics {
            (self.message.clone(), self.detail.clone())
        } else {
            (GENERIC_ERROR_MESSAGE.to_string(), String::new())
        };

        ErrorResponse {
            trace_id: trace_id.to_string(),
            message,
            error_details: self.error_details.clone(),
            stack_trace,
        }
    }
}

impl From<&AppError> for ErrorReport {
    fn from(error: &AppError) -> Self {
        Self {
            status: error.status(),
            warning: error.is_warning(),
            message: error.to_string(),
            detail: format!("{:?}", error),
            error_details: error.error_bag(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let report = ErrorReport::from(&self);
        let body = report.render("", false);
        let mut response = (report.status, Json(body)).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details = ErrorDetails::new(VALIDATION_FAILED_MESSAGE);
        details.extend(validation_bag(&errors));
        AppError::InvalidModel(details)
    }
}

/// Flatten field-level validator failures into a bag keyed by wire names.
pub fn validation_bag(errors: &validator::ValidationErrors) -> ErrorBag {
    let mut bag = ErrorBag::new();
    for (field, errs) in errors.field_errors() {
        let key = camel_case(field);
        let messages = bag.entry(key.clone()).or_default();
        for err in errs {
            let message = err
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("The {} field is invalid.", key));
            messages.insert(message);
        }
    }
    bag
}

/// `order_by` -> `orderBy`, matching the wire names of request fields.
pub(crate) fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self, field: &str, message: impl Into<String>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, field: &str, message: impl Into<String>) -> AppResult<T> {
        self.ok_or_else(|| AppError::not_found(field, message))
    }
}

/// Convenience constructors
impl AppError {
    pub fn not_found(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::NotFound(ErrorDetails::new("The requested item was not found.").with(field, message))
    }

    pub fn invalid_model(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::InvalidModel(ErrorDetails::new(VALIDATION_FAILED_MESSAGE).with(field, message))
    }

    pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Conflict(
            ErrorDetails::new("The request conflicts with the current state of the item.")
                .with(field, message),
        )
    }

    pub fn forbidden(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Forbidden(
            ErrorDetails::new("The operation is not allowed.").with(field, message),
        )
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn test_status_table() {
        assert_eq!(AppError::not_found("Id", "x").status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::invalid_model("Name", "x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::conflict("Name", "x").status(), StatusCode::CONFLICT);
        assert_eq!(AppError::forbidden("Id", "x").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Concurrency("stale".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::internal("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Database(sea_orm::DbErr::Custom("db".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_severity() {
        assert!(AppError::not_found("Id", "x").is_warning());
        assert!(AppError::conflict("Name", "x").is_warning());
        assert!(AppError::Unauthorized.is_warning());
        let jwt = jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidToken);
        assert!(AppError::from(jwt).is_warning());
        assert!(!AppError::Concurrency("stale".into()).is_warning());
        assert!(!AppError::internal("boom").is_warning());
    }

    #[test]
    fn test_fault_has_no_field_messages() {
        let response = AppError::internal("boom").to_error_response("t-1", true);
        assert!(response.error_details.is_empty());
        assert_eq!(response.trace_id, "t-1");
    }

    #[test]
    fn test_concurrency_error_names_version() {
        let bag = AppError::Concurrency("stale".into()).error_bag();
        assert!(bag.contains_key("version"));
    }

    #[test]
    fn test_production_hides_message_and_trace() {
        let err = AppError::not_found("Id", "Category with Id: 3 is not found.");
        let response = err.to_error_response("abc", false);

        assert_eq!(response.message, GENERIC_ERROR_MESSAGE);
        assert!(response.stack_trace.is_empty());
        assert_eq!(
            response.error_details["Id"].iter().next().unwrap(),
            "Category with Id: 3 is not found."
        );
    }

    #[test]
    fn test_diagnostics_expose_message_and_chain() {
        let err = AppError::RetriesExhausted {
            attempts: 5,
            source: Box::new(AppError::Database(sea_orm::DbErr::Conn(
                sea_orm::RuntimeErr::Internal("refused".into()),
            ))),
        };
        let response = err.to_error_response("abc", true);

        assert_eq!(response.message, "Operation failed after 5 attempts");
        assert!(response.stack_trace.contains("refused"));
    }

    #[test]
    fn test_transient_detection() {
        let conn = AppError::Database(sea_orm::DbErr::Conn(sea_orm::RuntimeErr::Internal(
            "reset".into(),
        )));
        assert!(conn.is_transient());
        assert!(!AppError::Database(sea_orm::DbErr::RecordNotFound("x".into())).is_transient());
        assert!(!AppError::conflict("Name", "x").is_transient());
    }

    #[test]
    fn test_duplicate_messages_collapse() {
        let details = ErrorDetails::new("m").with("Name", "a").with("Name", "a");
        assert_eq!(details.errors["Name"].len(), 1);
    }

    #[test]
    fn test_validation_errors_use_wire_names() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("regex");
        err.message = Some("bad order".into());
        errors.add("order_by", err);

        let app: AppError = errors.into();
        let details = app.details().unwrap();
        assert!(details.errors.contains_key("orderBy"));
        assert!(matches!(app, AppError::InvalidModel(_)));
    }

    #[test]
    fn test_into_response_attaches_report() {
        let response = AppError::conflict("Name", "taken").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert!(report.warning);
    }
}
