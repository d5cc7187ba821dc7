//! Orders domain module.
//!
//! Business rules for turning a cart into an order: validation, price
//! snapshotting, total reconciliation and owner-only access. Implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod access;
pub mod order;

pub use access::authorize;
pub use order::{CartItem, Order, OrderItem, OrderStatus, PlaceOrder, ShippingAddress};
