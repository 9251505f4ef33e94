//! Mapping of domain failures onto HTTP responses

use axum::http::StatusCode;
use axum::Json;
use tracing::error;

use super::ApiResponse;
use crate::domain::{DomainError, ErrorKind};

/// Error half of every handler result; `data` is always `null`.
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

/// Handler result: enveloped payload or an error envelope with its status.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Like [`ApiResult`] for handlers that answer `201 Created`.
pub type CreatedResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

pub fn status_for(e: &DomainError) -> StatusCode {
    match e.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn domain_error(e: DomainError) -> ApiError {
    let status = status_for(&e);
    if e.is_storage() {
        error!(error = %e, "Request failed on storage");
    }
    (status, Json(ApiResponse::error(e.to_string())))
}

/// Parse the connector path segment. Range is checked by the domain.
pub fn parse_connector(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!(
                "Connector ID must be an integer, got '{}'",
                raw
            ))),
        )
    })
}
