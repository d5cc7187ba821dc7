use thiserror::Error;

use storefront_core::{OrderId, ProductId};

/// Store operation error.
///
/// These are infrastructure failures as opposed to domain errors. The only
/// variants carrying business meaning are the ones a commit can discover after
/// validation already passed (stock gone, product gone).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Opaque backend failure (connection, query, decode).
    #[error("storage backend failure: {0}")]
    Backend(String),

    /// A conditional stock decrement matched no row at commit time.
    #[error("insufficient stock at commit for product {product_id} (requested {requested})")]
    InsufficientStock { product_id: ProductId, requested: i64 },

    #[error("product {0} no longer exists")]
    ProductMissing(ProductId),

    #[error("order {0} already exists")]
    DuplicateOrder(OrderId),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub(crate) fn poisoned() -> Self {
        Self::Backend("in-memory store lock poisoned".to_string())
    }
}

/// Map a sqlx error into an opaque backend failure, keeping the operation name.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
            StoreError::Backend(format!(
                "database error in {operation} (code {code}): {}",
                db_err.message()
            ))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Backend(format!("connection pool timed out in {operation}"))
        }
        other => StoreError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

/// Postgres SQLSTATE of a database error, if any.
pub(crate) fn pg_code(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

pub(crate) const UNIQUE_VIOLATION: &str = "23505";
pub(crate) const FOREIGN_KEY_VIOLATION: &str = "23503";
