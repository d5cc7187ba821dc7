use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use storefront_infra::{OrderServiceError, StoreError};

pub fn order_error_to_response(err: OrderServiceError) -> Response {
    match err {
        OrderServiceError::InvalidInput(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_input", msg),
        OrderServiceError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        OrderServiceError::Conflict { product_id, message } => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "conflict",
                "message": message,
                "product_id": product_id,
            })),
        )
            .into_response(),
        // Same body as a missing order so ownership does not leak existence.
        OrderServiceError::Forbidden => order_not_found(),
        OrderServiceError::Storage(e) => store_error_to_response(e),
        OrderServiceError::DeadlineExceeded => json_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "deadline_exceeded",
            "request deadline exceeded",
        ),
    }
}

/// Storage failures are logged with their cause but rendered opaquely.
pub fn store_error_to_response(err: StoreError) -> Response {
    tracing::error!(error = %err, "storage failure");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "storage_error",
        "internal storage error",
    )
}

pub fn order_not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "order not found")
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_core::ProductId;

    #[test]
    fn maps_service_errors_to_statuses() {
        let cases = [
            (OrderServiceError::InvalidInput("empty cart".into()), StatusCode::BAD_REQUEST),
            (OrderServiceError::NotFound("product".into()), StatusCode::NOT_FOUND),
            (
                OrderServiceError::Conflict {
                    product_id: Some(ProductId::new()),
                    message: "out of stock".into(),
                },
                StatusCode::CONFLICT,
            ),
            (OrderServiceError::Forbidden, StatusCode::NOT_FOUND),
            (
                OrderServiceError::Storage(StoreError::backend("db down")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (OrderServiceError::DeadlineExceeded, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, status) in cases {
            assert_eq!(order_error_to_response(err).status(), status);
        }
    }
}
