//! Infrastructure layer: stores, order placement orchestration, config, DB wiring.

pub mod catalog;
pub mod config;
pub mod db;
pub mod order_service;
pub mod order_store;
pub mod store_error;

pub use catalog::{CatalogStore, InMemoryCatalog, PostgresCatalog};
pub use order_service::{OrderService, OrderServiceError};
pub use order_store::{InMemoryOrderStore, OrderStore, PostgresOrderStore};
pub use store_error::StoreError;
