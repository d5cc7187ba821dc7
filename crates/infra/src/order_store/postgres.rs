//! Postgres-backed order store.
//!
//! ## Write path
//!
//! `create` runs in a single transaction:
//!
//! 1. insert the `orders` row (`23505` → [`StoreError::DuplicateOrder`])
//! 2. per product, in product-id order, `UPDATE products SET stock = stock - qty
//!    WHERE id = $1 AND stock >= qty`; zero rows affected rolls back with
//!    `InsufficientStock` or `ProductMissing`
//! 3. insert the `order_items` rows in cart order (`23503` → `ProductMissing`)
//! 4. commit
//!
//! Row locks on `products` are always taken in ascending id order, so
//! concurrent carts over the same products serialize instead of deadlocking.
//!
//! A transaction dropped before `COMMIT` is sent (e.g. the caller's deadline
//! fired) is rolled back by sqlx, so partial orders are never visible. Dropping
//! the future while `COMMIT` is in flight leaves the outcome unknown to the
//! caller; [`crate::OrderService`] settles that case by reading the order back.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{Span, field, instrument};
use uuid::Uuid;

use storefront_catalog::ProductSnapshot;
use storefront_core::{Entity, OrderId, OrderItemId, ProductId, UserId};
use storefront_orders::{Order, OrderItem, OrderStatus, ShippingAddress};

use super::OrderStore;
use crate::store_error::{FOREIGN_KEY_VIOLATION, StoreError, UNIQUE_VIOLATION, map_sqlx_error, pg_code};

#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: Arc<PgPool>,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Load line items for a set of orders, grouped by order, in placement order.
    async fn load_items(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<OrderItem>>, StoreError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT
                oi.id,
                oi.order_id,
                oi.product_id,
                oi.quantity,
                oi.price,
                oi.created_at,
                p.name AS product_name,
                p.description AS product_description,
                p.price AS product_price,
                p.stock AS product_stock,
                p.image_url AS product_image_url,
                p.category AS product_category
            FROM order_items oi
            LEFT JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY oi.order_id, oi.position ASC
            "#,
        )
        .bind(order_ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_order_items", e))?;

        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in &rows {
            let item = item_from_row(row).map_err(|e| map_sqlx_error("decode_order_item", e))?;
            grouped.entry(*item.order_id.as_uuid()).or_default().push(item);
        }
        Ok(grouped)
    }

    fn assemble(row: &PgRow, items: Vec<OrderItem>) -> Result<Order, StoreError> {
        let header = OrderRow::from_row(row).map_err(|e| map_sqlx_error("decode_order", e))?;
        let status: OrderStatus = header
            .status
            .parse()
            .map_err(|e: storefront_core::DomainError| StoreError::backend(e.to_string()))?;

        Order::rehydrate(
            OrderId::from_uuid(header.id),
            UserId::from_uuid(header.user_id),
            header.total_amount,
            status,
            ShippingAddress::new(header.address.0),
            header.created_at,
            header.updated_at,
            items,
        )
        .map_err(|e| StoreError::backend(e.to_string()))
    }
}

struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    total_amount: i64,
    status: String,
    address: Json<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            total_amount: row.try_get("total_amount")?,
            status: row.try_get("status")?,
            address: row.try_get("address")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn item_from_row(row: &PgRow) -> Result<OrderItem, sqlx::Error> {
    let product_id = ProductId::from_uuid(row.try_get("product_id")?);

    // LEFT JOIN: the snapshot is absent if the product row is gone.
    let name: Option<String> = row.try_get("product_name")?;
    let product = match name {
        Some(name) => Some(ProductSnapshot {
            id: product_id,
            name,
            description: row.try_get::<Option<String>, _>("product_description")?.unwrap_or_default(),
            price: row.try_get::<Option<i64>, _>("product_price")?.unwrap_or_default(),
            stock: row.try_get::<Option<i64>, _>("product_stock")?.unwrap_or_default(),
            image_url: row.try_get::<Option<String>, _>("product_image_url")?.unwrap_or_default(),
            category: row.try_get::<Option<String>, _>("product_category")?.unwrap_or_default(),
        }),
        None => None,
    };

    Ok(OrderItem {
        id: OrderItemId::from_uuid(row.try_get("id")?),
        order_id: OrderId::from_uuid(row.try_get("order_id")?),
        product_id,
        quantity: row.try_get("quantity")?,
        price: row.try_get("price")?,
        created_at: row.try_get("created_at")?,
        product,
    })
}

async fn rollback(tx: Transaction<'_, Postgres>) -> Result<(), StoreError> {
    tx.rollback()
        .await
        .map_err(|e| map_sqlx_error("rollback", e))
}

#[async_trait::async_trait]
impl OrderStore for PostgresOrderStore {
    #[instrument(
        skip(self, order),
        fields(
            order_id = %order.order_id(),
            user_id = %order.user_id(),
            line_count = order.items().len(),
            operation = field::Empty
        ),
        err
    )]
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        Span::current().record("operation", "create_order");

        let demand = order
            .quantities_by_product()
            .map_err(|e| StoreError::backend(e.to_string()))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, total_amount, status, address, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.order_id().as_uuid())
        .bind(order.user_id().as_uuid())
        .bind(order.total_amount())
        .bind(order.status().as_str())
        .bind(Json(order.address().as_json()))
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            let mapped = if pg_code(&e).as_deref() == Some(UNIQUE_VIOLATION) {
                StoreError::DuplicateOrder(order.order_id())
            } else {
                map_sqlx_error("insert_order", e)
            };
            rollback(tx).await?;
            return Err(mapped);
        }

        for (product_id, qty) in demand {
            let updated = sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - $2, updated_at = $3
                WHERE id = $1 AND stock >= $2
                "#,
            )
            .bind(product_id.as_uuid())
            .bind(qty)
            .bind(order.created_at())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("decrement_stock", e))?;

            if updated.rows_affected() == 0 {
                let exists = sqlx::query("SELECT 1 FROM products WHERE id = $1")
                    .bind(product_id.as_uuid())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| map_sqlx_error("check_product", e))?
                    .is_some();
                rollback(tx).await?;
                return Err(if exists {
                    StoreError::InsufficientStock {
                        product_id,
                        requested: qty,
                    }
                } else {
                    StoreError::ProductMissing(product_id)
                });
            }
        }

        for (position, item) in order.items().iter().enumerate() {
            let inserted = sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, quantity, price, position, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(item.order_id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(item.quantity)
            .bind(item.price)
            .bind(position as i32)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await;

            if let Err(e) = inserted {
                let mapped = if pg_code(&e).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
                    StoreError::ProductMissing(item.product_id)
                } else {
                    map_sqlx_error("insert_order_item", e)
                };
                rollback(tx).await?;
                return Err(mapped);
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(order_id = %id, operation = field::Empty), err)]
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Span::current().record("operation", "find_order");

        let row = sqlx::query(
            r#"
            SELECT id, user_id, total_amount, status, address, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_order", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.load_items(&[*id.as_uuid()]).await?;
        let lines = items.remove(id.as_uuid()).unwrap_or_default();
        Self::assemble(&row, lines).map(Some)
    }

    #[instrument(skip(self), fields(user_id = %user_id, operation = field::Empty, order_count = field::Empty), err)]
    async fn find_all_by_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let span = Span::current();
        span.record("operation", "find_orders_by_user");

        let rows = sqlx::query(
            r#"
            SELECT id, user_id, total_amount, status, address, created_at, updated_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_orders_by_user", e))?;

        let ids: Vec<Uuid> = rows
            .iter()
            .map(|r| r.try_get::<Uuid, _>("id"))
            .collect::<Result<_, _>>()
            .map_err(|e| map_sqlx_error("decode_order", e))?;
        let mut items = self.load_items(&ids).await?;

        let mut orders = Vec::with_capacity(rows.len());
        for (row, id) in rows.iter().zip(&ids) {
            let lines = items.remove(id).unwrap_or_default();
            orders.push(Self::assemble(row, lines)?);
        }

        span.record("order_count", orders.len());
        Ok(orders)
    }
}
