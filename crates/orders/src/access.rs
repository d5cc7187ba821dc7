//! Owner-only access to orders.

use storefront_core::{DomainError, DomainResult, UserId};

use crate::order::Order;

/// Allow `requester` to see `order` only if they placed it.
///
/// Callers rendering the failure to clients should not distinguish it from a
/// missing order.
pub fn authorize(order: &Order, requester: UserId) -> DomainResult<()> {
    if order.is_owned_by(requester) {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use storefront_catalog::Product;
    use storefront_core::{OrderId, ProductId};

    use super::*;
    use crate::order::{CartItem, PlaceOrder, ShippingAddress};

    fn order_for(user: UserId) -> Order {
        let product = Product::new(ProductId::new(), "Mug", 100, 3, Utc::now()).unwrap();
        let cmd = PlaceOrder {
            order_id: OrderId::new(),
            user_id: user,
            address: ShippingAddress::new(serde_json::json!({})),
            items: vec![CartItem::new(product.id, 1)],
            occurred_at: Utc::now(),
        };
        Order::place(cmd, &HashMap::from([(product.id, product)])).unwrap()
    }

    #[test]
    fn owner_is_allowed() {
        let user = UserId::new();
        assert!(authorize(&order_for(user), user).is_ok());
    }

    #[test]
    fn other_user_is_forbidden() {
        let order = order_for(UserId::new());
        assert_eq!(authorize(&order, UserId::new()), Err(DomainError::Forbidden));
    }
}
