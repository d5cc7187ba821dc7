use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use storefront_core::OrderId;
use storefront_infra::OrderServiceError;
use storefront_orders::PlaceOrder;

use crate::app::{dto, errors, services::AppServices};
use crate::context::UserContext;

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    body: Result<Json<dto::CreateOrderRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_input", rejection.body_text());
        }
    };

    let (address, items) = match body.into_domain() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let cmd = PlaceOrder {
        order_id: OrderId::new(),
        user_id: user.user_id(),
        address,
        items,
        occurred_at: Utc::now(),
    };

    match services.orders.place_order(cmd, Some(services.deadline())).await {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> Response {
    match services.orders.list_orders(user.user_id()).await {
        Ok(orders) => Json(orders).into_response(),
        Err(e) => errors::order_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Response {
    let order_id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };

    match services.orders.get_order(order_id, user.user_id()).await {
        Ok(order) => Json(order).into_response(),
        Err(OrderServiceError::NotFound(_) | OrderServiceError::Forbidden) => errors::order_not_found(),
        Err(e) => errors::order_error_to_response(e),
    }
}
