//! Back-office order routes (staff/admin).

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use lustre_auth::Permission;
use lustre_orders::{FulfillmentStatus, PaymentStatus};

use crate::app::routes::{json_body, parse_order_id};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/all", get(list_orders))
        .route("/offline", post(create_offline_order))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_status))
        .route("/:id/payment", put(update_payment))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<dto::ListOrdersQuery>,
) -> axum::response::Response {
    if let Err(res) = authz::require(&principal, &Permission::ORDERS_ADMIN_READ) {
        return res;
    }
    let (filter, pagination) = match query.into_parts() {
        Ok(parts) => parts,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.lifecycle.list_orders(filter, pagination).await {
        Ok(page) => {
            let total_pages = page.total_pages();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "items": page.items,
                    "total": page.total,
                    "page": page.page,
                    "limit": page.limit,
                    "total_pages": total_pages,
                })),
            )
                .into_response()
        }
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(res) = authz::require(&principal, &Permission::ORDERS_ADMIN_READ) {
        return res;
    }
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.lifecycle.order_detail(order_id).await {
        Ok(detail) => (StatusCode::OK, Json(detail)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateStatusRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(res) = authz::require(&principal, &Permission::ORDERS_ADMIN_STATUS) {
        return res;
    }
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let body = match json_body(body) {
        Ok(b) => b,
        Err(res) => return res,
    };
    let next: FulfillmentStatus = match body.status.parse() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .lifecycle
        .update_status(order_id, next, body.notes, principal.user_id())
        .await
    {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn update_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdatePaymentRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(res) = authz::require(&principal, &Permission::ORDERS_ADMIN_PAYMENT) {
        return res;
    }
    let order_id = match parse_order_id(&id) {
        Ok(v) => v,
        Err(res) => return res,
    };
    let body = match json_body(body) {
        Ok(b) => b,
        Err(res) => return res,
    };
    let next: PaymentStatus = match body.payment_status.parse() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.lifecycle.update_payment(order_id, next).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}

pub async fn create_offline_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<dto::OfflineOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    if let Err(res) = authz::require(&principal, &Permission::ORDERS_ADMIN_OFFLINE) {
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
        .place_offline_order(principal.user_id(), command)
        .await
    {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(dto::offline_outcome_to_json(&outcome)),
        )
            .into_response(),
        Err(e) => errors::lifecycle_error_to_response(e),
    }
}
