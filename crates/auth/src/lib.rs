//! `storefront-auth`: identity boundary.
//!
//! Decodes and validates bearer tokens into a trusted `UserId`. Token issuance,
//! registration and password handling live elsewhere. Decoupled from HTTP.

pub mod claims;
pub mod jwt;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
