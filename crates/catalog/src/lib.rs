//! Catalog domain module.
//!
//! Product records as the catalog store hands them to the rest of the system,
//! plus the read-only snapshot attached to order lines. Pure data, no IO.

pub mod product;

pub use product::{Product, ProductSnapshot};
