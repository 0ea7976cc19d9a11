//! Error mapping middleware.
//!
//! Turns any error response produced further in (handlers, extractors, auth)
//! into the final error body carrying the request's trace id, and logs it at
//! the severity its status calls for.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tower_http::request_id::RequestId;

use crate::api::AppState;
use crate::errors::ErrorReport;

/// Trace id assigned by the request-id layer, if it is readable as text.
fn trace_id(request: &Request) -> String {
    request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .map(str::to_string)
        .unwrap_or_default()
}

pub async fn error_mapping_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let trace_id = trace_id(&request);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;

    if let Some(report) = response.extensions_mut().remove::<ErrorReport>() {
        log_report(&report, &trace_id, method.as_str(), &path);
        let body = report.render(&trace_id, state.config.diagnostics_enabled());
        response = (report.status, Json(body)).into_response();
    }

    response
}

fn log_report(report: &ErrorReport, trace_id: &str, method: &str, path: &str) {
    let status = report.status.as_u16();
    if report.warning {
        tracing::warn!(
            trace_id,
            status,
            method,
            path,
            error = %report.message,
            errors = ?report.error_details,
            "Request rejected"
        );
    } else {
        tracing::error!(
            trace_id,
            status,
            method,
            path,
            error = %report.detail,
            "Request failed"
        );
    }
}
