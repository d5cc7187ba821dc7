//! Postgres pool construction and schema bootstrap.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::store_error::{StoreError, map_sqlx_error};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        price BIGINT NOT NULL CHECK (price >= 0),
        stock BIGINT NOT NULL CHECK (stock >= 0),
        image_url TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        total_amount BIGINT NOT NULL CHECK (total_amount >= 0),
        status TEXT NOT NULL,
        address JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS orders_user_created_idx ON orders (user_id, created_at DESC, id DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        id UUID PRIMARY KEY,
        order_id UUID NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
        product_id UUID NOT NULL REFERENCES products(id),
        quantity BIGINT NOT NULL CHECK (quantity > 0),
        price BIGINT NOT NULL CHECK (price >= 0),
        position INT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        UNIQUE (order_id, position)
    )
    "#,
];

/// Open a connection pool.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Create the tables this service needs if they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    tracing::info!("database schema ensured");
    Ok(())
}
