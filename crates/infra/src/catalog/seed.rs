//! Catalog seed files: a JSON array of product records.

use std::path::Path;

use storefront_catalog::Product;

use crate::store_error::StoreError;

/// Parse a seed document, rejecting any record that fails validation.
pub fn parse(json: &str) -> Result<Vec<Product>, StoreError> {
    let products: Vec<Product> = serde_json::from_str(json)
        .map_err(|e| StoreError::backend(format!("invalid catalog seed: {e}")))?;
    for p in &products {
        p.validate()
            .map_err(|e| StoreError::backend(format!("invalid catalog seed: {e}")))?;
    }
    Ok(products)
}

pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<Product>, StoreError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| {
        StoreError::backend(format!("failed to read catalog seed {}: {e}", path.display()))
    })?;
    parse(&raw)
}
