use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use lustre_core::DomainError;
use lustre_infra::LifecycleError;

pub fn lifecycle_error_to_response(err: LifecycleError) -> axum::response::Response {
    match err {
        LifecycleError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        LifecycleError::NotFound(what) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
        }
        LifecycleError::InvalidTransition(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_transition", msg)
        }
        LifecycleError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        LifecycleError::Forbidden => json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden"),
        LifecycleError::Store(e) => {
            error!(error = %e, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "storage failure")
        }
        LifecycleError::Credential(e) => {
            error!(error = %e, "credential failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
        }
    }
}

/// Bad path ids and unparseable enum values in requests.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        other => lifecycle_error_to_response(other.into()),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
