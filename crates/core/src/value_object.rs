//! Value object trait: equality by value, not identity.
//!
//! Value objects carry no identity. A cart line, a shipping address or a price
//! snapshot are all defined entirely by their attribute values.

use crate::error::DomainResult;

/// Marker trait for immutable, value-compared domain objects.
///
/// `validate` is the single place a value object states which attribute
/// combinations it accepts. Constructors and decoders call it before the value
/// reaches the rest of the domain.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct Quantity(i64);
///
/// impl ValueObject for Quantity {
///     fn validate(&self) -> DomainResult<()> {
///         if self.0 <= 0 {
///             return Err(DomainError::validation("quantity must be positive"));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {
    /// Check the value's own invariants. Defaults to accepting every value.
    fn validate(&self) -> DomainResult<()> {
        Ok(())
    }
}
