use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use storefront_catalog::Product;
use storefront_core::ProductId;

use super::{CatalogStore, seed};
use crate::store_error::StoreError;

pub(crate) type SharedProducts = Arc<RwLock<HashMap<ProductId, Product>>>;

/// In-memory catalog for tests/dev.
///
/// Cloning shares the underlying map. [`crate::InMemoryOrderStore`] holds the
/// same map so stock decrements are visible here.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: SharedProducts,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from already-validated products.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let map = products.into_iter().map(|p| (p.id, p)).collect();
        Self {
            products: Arc::new(RwLock::new(map)),
        }
    }

    /// Parse a JSON array of product records, rejecting invalid ones.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(Self::with_products(seed::parse(json)?))
    }

    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let catalog = Self::with_products(seed::read_file(path)?);
        tracing::info!(path = %path.display(), products = catalog.len(), "catalog seeded");
        Ok(catalog)
    }

    /// Insert or replace a product record.
    pub fn insert(&self, product: Product) -> Result<(), StoreError> {
        let mut map = self.products.write().map_err(|_| StoreError::poisoned())?;
        map.insert(product.id, product);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.products.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn shared(&self) -> SharedProducts {
        self.products.clone()
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let map = self.products.read().map_err(|_| StoreError::poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let map = self.products.read().map_err(|_| StoreError::poisoned())?;
        let mut out: Vec<Product> = map.values().cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn list_is_newest_first() {
        let now = Utc::now();
        let older = Product::new(ProductId::new(), "Old", 100, 1, now - Duration::days(1)).unwrap();
        let newer = Product::new(ProductId::new(), "New", 100, 1, now).unwrap();
        let catalog = InMemoryCatalog::with_products([older.clone(), newer.clone()]);

        let ids: Vec<_> = catalog.list().await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[tokio::test]
    async fn get_unknown_is_none() {
        let catalog = InMemoryCatalog::new();
        assert_eq!(catalog.get(ProductId::new()).await.unwrap(), None);
    }

    #[test]
    fn seed_rejects_negative_stock() {
        let json = format!(
            r#"[{{"id":"{}","name":"Broken","price":10,"stock":-1,
                 "created_at":"2024-01-01T00:00:00Z","updated_at":"2024-01-01T00:00:00Z"}}]"#,
            ProductId::new()
        );
        assert!(matches!(
            InMemoryCatalog::from_json(&json),
            Err(StoreError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn seed_loads_products() {
        let id = ProductId::new();
        let json = format!(
            r#"[{{"id":"{id}","name":"Carrot","price":250,"stock":40,"category":"veg",
                 "created_at":"2024-01-01T00:00:00Z","updated_at":"2024-01-01T00:00:00Z"}}]"#
        );
        let catalog = InMemoryCatalog::from_json(&json).unwrap();
        let product = catalog.get(id).await.unwrap().unwrap();
        assert_eq!(product.price, 250);
        assert_eq!(product.category, "veg");
    }
}
