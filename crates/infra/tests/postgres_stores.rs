//! Postgres store tests. Need a reachable database:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/storefront_test cargo test -p storefront-infra -- --ignored
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use storefront_catalog::Product;
use storefront_core::{Entity, OrderId, ProductId, UserId};
use storefront_infra::{
    CatalogStore, OrderService, OrderServiceError, OrderStore, PostgresCatalog, PostgresOrderStore,
    StoreError, db,
};
use storefront_orders::{CartItem, Order, PlaceOrder, ShippingAddress};

async fn setup() -> (PostgresCatalog, PostgresOrderStore) {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests");
    let pool = db::connect(&url, 5).await.unwrap();
    db::ensure_schema(&pool).await.unwrap();
    (PostgresCatalog::new(pool.clone()), PostgresOrderStore::new(pool))
}

async fn seeded(catalog: &PostgresCatalog, price: i64, stock: i64) -> Product {
    let product = Product::new(ProductId::new(), "Carrot", price, stock, Utc::now()).unwrap();
    catalog.upsert(&product).await.unwrap();
    product
}

fn place(user_id: UserId, items: Vec<CartItem>) -> PlaceOrder {
    PlaceOrder {
        order_id: OrderId::new(),
        user_id,
        address: ShippingAddress::new(serde_json::json!({"city": "Kyoto", "zip": "600-0000"})),
        items,
        occurred_at: Utc::now(),
    }
}

#[tokio::test]
#[ignore]
async fn create_then_find_round_trips_with_snapshots() {
    let (catalog, orders) = setup().await;
    let p1 = seeded(&catalog, 1000, 5).await;
    let p2 = seeded(&catalog, 500, 1).await;
    let user = UserId::new();

    let service = OrderService::new(Arc::new(catalog.clone()), Arc::new(orders.clone()));
    let placed = service
        .place_order(
            place(user, vec![CartItem::new(p1.id, 2), CartItem::new(p2.id, 1)]),
            None,
        )
        .await
        .unwrap();
    assert_eq!(placed.total_amount(), 2500);

    let fetched = orders.find_by_id(placed.order_id()).await.unwrap().unwrap();
    assert_eq!(fetched.total_amount(), 2500);
    assert_eq!(fetched.address(), placed.address());
    let lines: Vec<_> = fetched
        .items()
        .iter()
        .map(|l| (l.product_id, l.quantity, l.price))
        .collect();
    assert_eq!(lines, vec![(p1.id, 2, 1000), (p2.id, 1, 500)]);
    assert_eq!(fetched.items()[0].product.as_ref().unwrap().name, "Carrot");
    assert_eq!(fetched.created_at(), placed.created_at());
    assert_eq!(fetched.updated_at(), placed.updated_at());
    for (stored, returned) in fetched.items().iter().zip(placed.items()) {
        assert_eq!(stored.created_at, returned.created_at);
    }

    assert_eq!(catalog.get(p1.id).await.unwrap().unwrap().stock, 3);
    assert_eq!(catalog.get(p2.id).await.unwrap().unwrap().stock, 0);
}

#[tokio::test]
#[ignore]
async fn stock_shortfall_at_commit_rolls_back_everything() {
    let (catalog, orders) = setup().await;
    let p1 = seeded(&catalog, 100, 5).await;
    let p2 = seeded(&catalog, 100, 1).await;

    // Price against the current catalog, then drain p2 before the write.
    let products = [(p1.id, p1.clone()), (p2.id, p2.clone())].into_iter().collect();
    let order = Order::place(
        place(UserId::new(), vec![CartItem::new(p1.id, 1), CartItem::new(p2.id, 1)]),
        &products,
    )
    .unwrap();
    let mut drained = p2.clone();
    drained.stock = 0;
    catalog.upsert(&drained).await.unwrap();

    let err = orders.create(&order).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::InsufficientStock {
            product_id: p2.id,
            requested: 1
        }
    );
    assert!(orders.find_by_id(order.order_id()).await.unwrap().is_none());
    assert_eq!(catalog.get(p1.id).await.unwrap().unwrap().stock, 5);
}

#[tokio::test]
#[ignore]
async fn duplicate_order_id_is_rejected() {
    let (catalog, orders) = setup().await;
    let p1 = seeded(&catalog, 100, 5).await;
    let products = [(p1.id, p1.clone())].into_iter().collect();
    let order = Order::place(place(UserId::new(), vec![CartItem::new(p1.id, 1)]), &products).unwrap();

    orders.create(&order).await.unwrap();
    assert_eq!(
        orders.create(&order).await.unwrap_err(),
        StoreError::DuplicateOrder(order.order_id())
    );
}

#[tokio::test]
#[ignore]
async fn list_by_user_is_newest_first() {
    let (catalog, orders) = setup().await;
    let p1 = seeded(&catalog, 100, 50).await;
    let user = UserId::new();
    let service = OrderService::new(Arc::new(catalog.clone()), Arc::new(orders.clone()));

    let mut older = place(user, vec![CartItem::new(p1.id, 1)]);
    older.occurred_at = Utc::now() - Duration::hours(1);
    let older = service.place_order(older, None).await.unwrap();
    let newer = service
        .place_order(place(user, vec![CartItem::new(p1.id, 1)]), None)
        .await
        .unwrap();

    let ids: Vec<_> = orders
        .find_all_by_user(user)
        .await
        .unwrap()
        .iter()
        .map(|o| o.order_id())
        .collect();
    assert_eq!(ids, vec![newer.order_id(), older.order_id()]);
    assert!(orders.find_all_by_user(UserId::new()).await.unwrap().is_empty());

    let err = service
        .get_order(newer.order_id(), UserId::new())
        .await
        .unwrap_err();
    assert_eq!(err, OrderServiceError::Forbidden);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn opposite_cart_orders_commit_concurrently() {
    let (catalog, orders) = setup().await;
    let a = seeded(&catalog, 100, 1000).await;
    let b = seeded(&catalog, 100, 1000).await;
    let products: std::collections::HashMap<_, _> =
        [(a.id, a.clone()), (b.id, b.clone())].into_iter().collect();

    for _ in 0..50 {
        let ab = Order::place(
            place(UserId::new(), vec![CartItem::new(a.id, 1), CartItem::new(b.id, 1)]),
            &products,
        )
        .unwrap();
        let ba = Order::place(
            place(UserId::new(), vec![CartItem::new(b.id, 1), CartItem::new(a.id, 1)]),
            &products,
        )
        .unwrap();

        let (first, second) = {
            let (s1, s2) = (orders.clone(), orders.clone());
            let h1 = tokio::spawn(async move { s1.create(&ab).await });
            let h2 = tokio::spawn(async move { s2.create(&ba).await });
            (h1.await.unwrap(), h2.await.unwrap())
        };
        assert_eq!(first, Ok(()));
        assert_eq!(second, Ok(()));
    }

    assert_eq!(catalog.get(a.id).await.unwrap().unwrap().stock, 900);
    assert_eq!(catalog.get(b.id).await.unwrap().unwrap().stock, 900);
}

#[tokio::test]
#[ignore]
async fn seeding_keeps_existing_rows() {
    let (catalog, _) = setup().await;
    let existing = seeded(&catalog, 100, 5).await;
    let fresh = Product::new(ProductId::new(), "Parsnip", 300, 9, Utc::now()).unwrap();

    let mut reset = existing.clone();
    reset.stock = 500;
    let inserted = catalog.seed_missing(&[reset, fresh.clone()]).await.unwrap();

    assert_eq!(inserted, 1);
    assert_eq!(catalog.get(existing.id).await.unwrap().unwrap().stock, 5);
    assert_eq!(catalog.get(fresh.id).await.unwrap().unwrap().name, "Parsnip");
}
