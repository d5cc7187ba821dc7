//! Postgres-backed catalog.

use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{Span, field, instrument};

use storefront_catalog::Product;
use storefront_core::ProductId;

use super::CatalogStore;
use crate::store_error::{StoreError, map_sqlx_error};

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, image_url, category, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresCatalog {
    pool: Arc<PgPool>,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Insert or replace a product row. Used for seeding and tests.
    #[instrument(skip(self, product), fields(product_id = %product.id), err)]
    pub async fn upsert(&self, product: &Product) -> Result<(), StoreError> {
        product
            .validate()
            .map_err(|e| StoreError::backend(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price, stock, image_url, category, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                stock = EXCLUDED.stock,
                image_url = EXCLUDED.image_url,
                category = EXCLUDED.category,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.image_url)
        .bind(&product.category)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_product", e))?;

        Ok(())
    }

    /// Insert seed products whose id is not already present.
    ///
    /// Existing rows are left alone so a restart never resets live stock.
    /// Returns how many rows were inserted.
    #[instrument(skip(self, products), fields(seed_count = products.len(), operation = field::Empty), err)]
    pub async fn seed_missing(&self, products: &[Product]) -> Result<u64, StoreError> {
        Span::current().record("operation", "seed_products");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let mut inserted = 0;
        for product in products {
            let done = sqlx::query(
                r#"
                INSERT INTO products (id, name, description, price, stock, image_url, category, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(product.id.as_uuid())
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(product.stock)
            .bind(&product.image_url)
            .bind(&product.category)
            .bind(product.created_at)
            .bind(product.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("seed_product", e))?;
            inserted += done.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;

        Ok(inserted)
    }
}

fn product_from_row(row: &PgRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: row.try_get("price")?,
        stock: row.try_get("stock")?,
        image_url: row.try_get("image_url")?,
        category: row.try_get("category")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait::async_trait]
impl CatalogStore for PostgresCatalog {
    #[instrument(skip(self), fields(product_id = %id, operation = field::Empty), err)]
    async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Span::current().record("operation", "get_product");

        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;

        row.as_ref()
            .map(product_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("decode_product", e))
    }

    #[instrument(skip(self), fields(operation = field::Empty, product_count = field::Empty), err)]
    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let span = Span::current();
        span.record("operation", "list_products");

        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        let products = rows
            .iter()
            .map(product_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("decode_product", e))?;

        span.record("product_count", products.len());
        Ok(products)
    }
}
