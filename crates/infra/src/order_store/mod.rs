//! Order Store boundary.
//!
//! Durable home of orders and their line items. Orders are written once, as a
//! unit, and never updated or deleted through this trait.

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;

use std::sync::Arc;

use storefront_core::{OrderId, UserId};
use storefront_orders::Order;

use crate::store_error::StoreError;

/// Persistence contract for orders.
///
/// ## `create`
///
/// All-or-nothing: the order row, every line item and the per-product stock
/// decrements commit together or not at all. A product that vanished or no
/// longer has enough stock at commit time leaves no trace and is reported as
/// [`StoreError::ProductMissing`] / [`StoreError::InsufficientStock`].
///
/// ## Reads
///
/// Returned orders carry their line items in placement order, each annotated
/// with a snapshot of the product's current record.
#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, order: &Order) -> Result<(), StoreError>;

    /// `Ok(None)` when no order has this id.
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// The user's orders, newest `created_at` first (ties: higher id first).
    async fn find_all_by_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError>;
}

#[async_trait::async_trait]
impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        (**self).create(order).await
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        (**self).find_by_id(id).await
    }

    async fn find_all_by_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        (**self).find_all_by_user(user_id).await
    }
}
