//! Order placement and retrieval (application-level orchestration).
//!
//! ```text
//! PlaceOrder
//!   ↓
//! 1. Shape checks (non-empty cart, positive quantities)
//!   ↓
//! 2. Catalog lookups, in cart order (first missing product wins)
//!   ↓
//! 3. Pure pricing + per-line stock check (`Order::place`)
//!   ↓
//! 4. One atomic `OrderStore::create`, bounded by the caller's deadline
//! ```
//!
//! Nothing is written unless steps 1-3 all pass. The service holds no locks;
//! atomicity of step 4 is the store's job.
//!
//! If the deadline cuts step 4 off, the store may still have committed (the
//! cut can land while the commit is in flight). The service then reads the
//! order back and reports success if it is there, so `DeadlineExceeded` always
//! means the order was not stored as far as the service could tell.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::time::Instant;
use tracing::instrument;

use storefront_catalog::Product;
use storefront_core::{DomainError, OrderId, ProductId, UserId};
use storefront_orders::{Order, PlaceOrder, authorize};

use crate::catalog::CatalogStore;
use crate::order_store::OrderStore;
use crate::store_error::StoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderServiceError {
    /// Malformed request (empty cart, bad quantity, arithmetic overflow).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// State prevents the operation, typically insufficient stock.
    #[error("conflict: {message}")]
    Conflict {
        product_id: Option<ProductId>,
        message: String,
    },

    /// The requester may not see this order.
    #[error("forbidden")]
    Forbidden,

    #[error("storage failure: {0}")]
    Storage(StoreError),

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl OrderServiceError {
    fn insufficient_stock(product_id: ProductId, detail: String) -> Self {
        OrderServiceError::Conflict {
            product_id: Some(product_id),
            message: detail,
        }
    }
}

impl From<DomainError> for OrderServiceError {
    fn from(value: DomainError) -> Self {
        let message = value.to_string();
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                OrderServiceError::InvalidInput(msg)
            }
            DomainError::NotFound(what) => OrderServiceError::NotFound(what),
            DomainError::InsufficientStock { product_id, .. } => {
                OrderServiceError::insufficient_stock(product_id, message)
            }
            DomainError::Forbidden => OrderServiceError::Forbidden,
            // Only reachable from inconsistent stored data.
            DomainError::InvariantViolation(msg) => {
                OrderServiceError::Storage(StoreError::Backend(msg))
            }
        }
    }
}

impl From<StoreError> for OrderServiceError {
    fn from(value: StoreError) -> Self {
        let message = value.to_string();
        match value {
            StoreError::InsufficientStock { product_id, .. } => {
                OrderServiceError::insufficient_stock(product_id, message)
            }
            StoreError::ProductMissing(product_id) => {
                OrderServiceError::NotFound(format!("product {product_id}"))
            }
            other => OrderServiceError::Storage(other),
        }
    }
}

/// Order placement engine plus owner-scoped reads.
#[derive(Clone)]
pub struct OrderService {
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
}

impl OrderService {
    pub fn new(catalog: Arc<dyn CatalogStore>, orders: Arc<dyn OrderStore>) -> Self {
        Self { catalog, orders }
    }

    /// Validate, price and durably store a new `pending` order.
    ///
    /// Validation runs in a fixed order and the first failure wins: empty cart,
    /// non-positive quantity, unknown product (in cart order), insufficient
    /// stock. Any failure means zero writes. `deadline` bounds the whole call;
    /// once it has passed the store is not touched. A write cut off by the
    /// deadline is settled by reading the order back.
    #[instrument(
        skip(self, cmd, deadline),
        fields(order_id = %cmd.order_id, user_id = %cmd.user_id, lines = cmd.items.len()),
        err
    )]
    pub async fn place_order(
        &self,
        cmd: PlaceOrder,
        deadline: Option<Instant>,
    ) -> Result<Order, OrderServiceError> {
        if let Err(e) = cmd.validate() {
            tracing::info!(reason = %e, "order rejected");
            return Err(e.into());
        }

        let products = bounded(deadline, self.fetch_products(&cmd)).await??;

        let order = match Order::place(cmd, &products) {
            Ok(order) => order,
            Err(e) => {
                tracing::info!(reason = %e, "order rejected");
                return Err(e.into());
            }
        };

        if deadline.is_some_and(|d| Instant::now() >= d) {
            tracing::warn!("deadline passed before order write");
            return Err(OrderServiceError::DeadlineExceeded);
        }

        match bounded(deadline, self.orders.create(&order)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                match &e {
                    StoreError::InsufficientStock { .. } | StoreError::ProductMissing(_) => {
                        tracing::info!(reason = %e, "order rejected at commit");
                    }
                    _ => tracing::error!(error = %e, "order write failed"),
                }
                return Err(e.into());
            }
            Err(_) => return self.settle_cut_off_write(order).await,
        }

        tracing::info!(
            order_id = %order.order_id(),
            total_amount = order.total_amount(),
            "order placed"
        );
        Ok(order)
    }

    /// Fetch an order for `requester`. Fails with `Forbidden` if they do not own it.
    #[instrument(skip(self), err)]
    pub async fn get_order(
        &self,
        id: OrderId,
        requester: UserId,
    ) -> Result<Order, OrderServiceError> {
        let order = self
            .orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| OrderServiceError::NotFound(format!("order {id}")))?;

        authorize(&order, requester)?;
        Ok(order)
    }

    /// All orders placed by `user`, newest first.
    #[instrument(skip(self), err)]
    pub async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, OrderServiceError> {
        Ok(self.orders.find_all_by_user(user).await?)
    }

    /// Decide the outcome of a `create` abandoned at the deadline.
    async fn settle_cut_off_write(&self, order: Order) -> Result<Order, OrderServiceError> {
        match self.orders.find_by_id(order.order_id()).await {
            Ok(Some(_)) => {
                tracing::warn!(
                    order_id = %order.order_id(),
                    "order write completed after the deadline"
                );
                Ok(order)
            }
            Ok(None) => {
                tracing::warn!("deadline passed during order write; nothing stored");
                Err(OrderServiceError::DeadlineExceeded)
            }
            Err(e) => {
                tracing::error!(error = %e, "could not settle order write cut off by deadline");
                Err(OrderServiceError::DeadlineExceeded)
            }
        }
    }

    async fn fetch_products(
        &self,
        cmd: &PlaceOrder,
    ) -> Result<HashMap<ProductId, Product>, OrderServiceError> {
        let mut products = HashMap::with_capacity(cmd.items.len());
        for product_id in cmd.product_ids() {
            match self.catalog.get(product_id).await? {
                Some(product) => {
                    products.insert(product_id, product);
                }
                None => {
                    tracing::info!(%product_id, "order rejected: unknown product");
                    return Err(OrderServiceError::NotFound(format!("product {product_id}")));
                }
            }
        }
        Ok(products)
    }
}

/// Run `fut`, giving up with `DeadlineExceeded` once `deadline` passes.
async fn bounded<F: Future>(
    deadline: Option<Instant>,
    fut: F,
) -> Result<F::Output, OrderServiceError> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| OrderServiceError::DeadlineExceeded),
        None => Ok(fut.await),
    }
}
