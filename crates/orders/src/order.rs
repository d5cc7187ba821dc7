use std::collections::HashMap;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use storefront_catalog::{Product, ProductSnapshot};
use storefront_core::{
    DomainError, DomainResult, Entity, OrderId, OrderItemId, ProductId, UserId, ValueObject,
};

/// Order status lifecycle. Placement only ever produces `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!(
                "unknown order status '{other}'"
            ))),
        }
    }
}

/// Shipping address as submitted by the client, stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShippingAddress(pub serde_json::Value);

impl ShippingAddress {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

impl ValueObject for ShippingAddress {}

/// One requested cart line. Never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

impl CartItem {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

impl ValueObject for CartItem {
    fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "quantity for product {} must be positive (got {})",
                self.product_id, self.quantity
            )));
        }
        Ok(())
    }
}

/// Command: PlaceOrder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub address: ShippingAddress,
    pub items: Vec<CartItem>,
    pub occurred_at: DateTime<Utc>,
}

impl PlaceOrder {
    /// Checks that need no catalog data: a non-empty cart with positive quantities.
    pub fn validate(&self) -> DomainResult<()> {
        if self.items.is_empty() {
            return Err(DomainError::validation("empty cart"));
        }
        for item in &self.items {
            item.validate()?;
        }
        Ok(())
    }

    /// Product ids in first-seen cart order, without repeats.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut seen = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.contains(&item.product_id) {
                seen.push(item.product_id);
            }
        }
        seen
    }
}

/// A persisted order line.
///
/// `price` is the unit price captured when the order was placed. `product` is a
/// display annotation filled in by readers and never feeds back into pricing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub price: i64,
    pub created_at: DateTime<Utc>,
    pub product: Option<ProductSnapshot>,
}

impl OrderItem {
    pub fn line_total(&self) -> Option<i64> {
        self.price.checked_mul(self.quantity)
    }
}

/// Order: immutable snapshot of a checkout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    total_amount: i64,
    status: OrderStatus,
    address: ShippingAddress,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    order_items: Vec<OrderItem>,
}

impl Order {
    /// Price a validated cart against the catalog records fetched for it.
    ///
    /// Lines keep cart order; a product repeated in the cart yields one line per
    /// occurrence. Every referenced product must be present in `products`.
    /// Timestamps are truncated to microseconds, the precision storage keeps.
    pub fn place(cmd: PlaceOrder, products: &HashMap<ProductId, Product>) -> DomainResult<Self> {
        cmd.validate()?;
        let placed_at = cmd.occurred_at.trunc_subsecs(6);

        for item in &cmd.items {
            if !products.contains_key(&item.product_id) {
                return Err(DomainError::not_found(format!(
                    "product {}",
                    item.product_id
                )));
            }
        }

        for item in &cmd.items {
            let product = &products[&item.product_id];
            if !product.can_supply(item.quantity) {
                return Err(DomainError::InsufficientStock {
                    product_id: item.product_id,
                    requested: item.quantity,
                    available: product.stock,
                });
            }
        }

        let mut total: i64 = 0;
        let mut order_items = Vec::with_capacity(cmd.items.len());
        for item in cmd.items {
            let product = &products[&item.product_id];
            let line = OrderItem {
                id: OrderItemId::new(),
                order_id: cmd.order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: product.price,
                created_at: placed_at,
                product: Some(product.snapshot()),
            };
            total = line
                .line_total()
                .and_then(|line_total| total.checked_add(line_total))
                .ok_or_else(|| DomainError::validation("order total exceeds the supported range"))?;
            order_items.push(line);
        }

        let order = Self {
            id: cmd.order_id,
            user_id: cmd.user_id,
            total_amount: total,
            status: OrderStatus::Pending,
            address: cmd.address,
            created_at: placed_at,
            updated_at: placed_at,
            order_items,
        };
        // Summed per-product demand must fit too; the stores decrement by it.
        order.quantities_by_product()?;
        Ok(order)
    }

    /// Rebuild an order read back from storage, re-checking the total.
    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        id: OrderId,
        user_id: UserId,
        total_amount: i64,
        status: OrderStatus,
        address: ShippingAddress,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        order_items: Vec<OrderItem>,
    ) -> DomainResult<Self> {
        let order = Self {
            id,
            user_id,
            total_amount,
            status,
            address,
            created_at,
            updated_at,
            order_items,
        };
        match order.computed_total() {
            Some(sum) if sum == total_amount => Ok(order),
            _ => Err(DomainError::invariant(format!(
                "order {id} total {total_amount} does not match its line items"
            ))),
        }
    }

    pub fn order_id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn total_amount(&self) -> i64 {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn address(&self) -> &ShippingAddress {
        &self.address
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.order_items
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Σ price × quantity over the lines, `None` on overflow.
    pub fn computed_total(&self) -> Option<i64> {
        self.order_items
            .iter()
            .try_fold(0i64, |acc, line| acc.checked_add(line.line_total()?))
    }

    /// Total quantity requested per product (repeated cart lines summed),
    /// sorted by product id.
    ///
    /// Writers lock product rows in this order, so two carts naming the same
    /// products never wait on each other in a cycle.
    pub fn quantities_by_product(&self) -> DomainResult<Vec<(ProductId, i64)>> {
        let mut out: Vec<(ProductId, i64)> = Vec::new();
        for line in &self.order_items {
            match out.iter_mut().find(|(id, _)| *id == line.product_id) {
                Some((_, qty)) => {
                    *qty = qty.checked_add(line.quantity).ok_or_else(|| {
                        DomainError::validation(format!(
                            "total quantity for product {} exceeds the supported range",
                            line.product_id
                        ))
                    })?;
                }
                None => out.push((line.product_id, line.quantity)),
            }
        }
        out.sort_by_key(|(id, _)| *id);
        Ok(out)
    }

    /// Replace the display snapshots on every line. Prices are left untouched.
    pub fn attach_snapshots(&mut self, snapshots: &HashMap<ProductId, ProductSnapshot>) {
        for line in &mut self.order_items {
            line.product = snapshots.get(&line.product_id).cloned();
        }
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
