//! Catalog Store boundary.
//!
//! Read access to product records. The order subsystem never edits products
//! through this trait; the only product mutation it performs is the stock
//! decrement inside an order store's `create`.

pub mod in_memory;
pub mod postgres;
pub mod seed;

pub use in_memory::InMemoryCatalog;
pub use postgres::PostgresCatalog;

use std::sync::Arc;

use storefront_catalog::Product;
use storefront_core::ProductId;

use crate::store_error::StoreError;

#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Look up one product. `Ok(None)` means it does not exist.
    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// All products, newest first.
    async fn list(&self) -> Result<Vec<Product>, StoreError>;
}

#[async_trait::async_trait]
impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list().await
    }
}
