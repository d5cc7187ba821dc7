use std::collections::HashMap;
use std::sync::RwLock;

use storefront_catalog::ProductSnapshot;
use storefront_core::{Entity, OrderId, ProductId, UserId};
use storefront_orders::Order;

use super::OrderStore;
use crate::catalog::InMemoryCatalog;
use crate::catalog::in_memory::SharedProducts;
use crate::store_error::StoreError;

/// In-memory order store for tests/dev.
///
/// Shares the product map with the [`InMemoryCatalog`] it was built from.
/// `create` holds the product write lock and then the order write lock for its
/// whole duration, which makes it atomic with respect to other writers.
#[derive(Debug)]
pub struct InMemoryOrderStore {
    products: SharedProducts,
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new(catalog: &InMemoryCatalog) -> Self {
        Self {
            products: catalog.shared(),
            orders: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored orders (all users).
    pub fn len(&self) -> usize {
        self.orders.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_current_snapshots(&self, mut orders: Vec<Order>) -> Result<Vec<Order>, StoreError> {
        let products = self.products.read().map_err(|_| StoreError::poisoned())?;
        let snapshots: HashMap<ProductId, ProductSnapshot> = orders
            .iter()
            .flat_map(|o| o.items().iter().map(|line| line.product_id))
            .filter_map(|id| products.get(&id).map(|p| (id, p.snapshot())))
            .collect();
        for order in &mut orders {
            order.attach_snapshots(&snapshots);
        }
        Ok(orders)
    }
}

#[async_trait::async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        let wanted = order
            .quantities_by_product()
            .map_err(|e| StoreError::backend(e.to_string()))?;

        let mut products = self.products.write().map_err(|_| StoreError::poisoned())?;
        let mut orders = self.orders.write().map_err(|_| StoreError::poisoned())?;

        if orders.contains_key(&order.order_id()) {
            return Err(StoreError::DuplicateOrder(order.order_id()));
        }

        // Check everything before touching anything.
        for (product_id, qty) in &wanted {
            let product = products
                .get(product_id)
                .ok_or(StoreError::ProductMissing(*product_id))?;
            if !product.can_supply(*qty) {
                return Err(StoreError::InsufficientStock {
                    product_id: *product_id,
                    requested: *qty,
                });
            }
        }

        for (product_id, qty) in wanted {
            if let Some(product) = products.get_mut(&product_id) {
                product.stock -= qty;
                product.updated_at = order.created_at();
            }
        }
        orders.insert(order.order_id(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let found = {
            let orders = self.orders.read().map_err(|_| StoreError::poisoned())?;
            orders.get(&id).cloned()
        };
        match found {
            Some(order) => Ok(self.with_current_snapshots(vec![order])?.pop()),
            None => Ok(None),
        }
    }

    async fn find_all_by_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let mut mine: Vec<Order> = {
            let orders = self.orders.read().map_err(|_| StoreError::poisoned())?;
            orders
                .values()
                .filter(|o| o.user_id() == user_id)
                .cloned()
                .collect()
        };
        mine.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then(b.order_id().cmp(&a.order_id()))
        });
        self.with_current_snapshots(mine)
    }
}
