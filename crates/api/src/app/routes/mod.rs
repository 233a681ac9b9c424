use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::Response,
    routing::get,
};

use lustre_core::OrderId;

use crate::app::errors;

pub mod admin;
pub mod orders;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/orders", orders::router().nest("/admin", admin::router()))
}

pub(crate) fn parse_order_id(id: &str) -> Result<OrderId, Response> {
    id.parse::<OrderId>().map_err(errors::domain_error_to_response)
}

/// Malformed or incomplete JSON bodies are reported as validation errors.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    body.map(|Json(value)| value).map_err(|rejection| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            rejection.body_text(),
        )
    })
}
