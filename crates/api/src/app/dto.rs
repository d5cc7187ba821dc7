use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;

use storefront_core::ProductId;
use storefront_orders::{CartItem, ShippingAddress};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Free-form address payload, stored verbatim.
    #[serde(default)]
    pub address: serde_json::Value,
    #[serde(default)]
    pub items: Vec<CartItemRequest>,
}

#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

impl CreateOrderRequest {
    /// Parse ids; everything else is validated by the order service.
    pub fn into_domain(self) -> Result<(ShippingAddress, Vec<CartItem>), Response> {
        let items = self
            .items
            .into_iter()
            .map(|item| {
                let product_id: ProductId = item.product_id.parse().map_err(|_| {
                    errors::json_error(
                        StatusCode::BAD_REQUEST,
                        "invalid_id",
                        format!("invalid product id '{}'", item.product_id),
                    )
                })?;
                Ok(CartItem::new(product_id, item.quantity))
            })
            .collect::<Result<Vec<_>, Response>>()?;

        Ok((ShippingAddress::new(self.address), items))
    }
}
