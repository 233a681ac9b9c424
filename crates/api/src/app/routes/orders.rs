//! Customer-facing order routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use lustre_auth::Permission;

use crate::app::routes::{json_body, parse_order_id};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order))
        .route("/mine", get(list_my_orders))
        .route("/mine/:id", get(get_my_order))
        .route("/mine/:id/cancel", put(cancel_my_order))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::CreateOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(res) = authz::require(&principal, &Permission::ORDERS_CREATE) {
        return res;
    }
    let body = match json_body(body) {
        Ok(b) => b,
        Err(res) => return res,
    };
    let command = match body.into_command() {
        Ok(c) => c,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .lifecycle
        .place_order(principal.user_id(), command)
        .await
    {
        Ok(detail) => (
            StatusCode::CREATED,
            Json(dto::OrderSummary::from(&detail.order)),
        )
            .into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn list_my_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(res) = authz::require(&principal, &Permission::ORDERS_OWN) {
        return res;
    }

    match services.lifecycle.customer_orders(principal.user_id()).await {
        Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn get_my_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(res) = authz::require(&principal, &Permission::ORDERS_OWN) {
        return res;
    }
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services
        .lifecycle
        .customer_order(principal.user_id(), order_id)
        .await
    {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn cancel_my_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::CancelOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(res) = authz::require(&principal, &Permission::ORDERS_OWN) {
        return res;
    }
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    // A bodyless request carries no content type; anything else must parse.
    let body = match body {
        Err(JsonRejection::MissingJsonContentType(_)) => dto::CancelOrderRequest::default(),
        other => match json_body(other) {
            Ok(v) => v,
            Err(res) => return res,
        },
    };

    match services
        .lifecycle
        .cancel_by_customer(order_id, principal.user_id(), body.reason)
        .await
    {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}
