use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult, Entity, ProductId, ValueObject};

/// A sellable catalog product.
///
/// Mutated outside the order subsystem (merchandising tools, restocking); order
/// placement only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unit price in the smallest currency unit.
    pub price: i64,
    pub stock: i64,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Build a product stamped at `now`, rejecting negative price or stock.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: i64,
        stock: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let product = Self {
            id,
            name: name.into(),
            description: String::new(),
            price,
            stock,
            image_url: String::new(),
            category: String::new(),
            created_at: now,
            updated_at: now,
        };
        product.validate()?;
        Ok(product)
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check the record-level invariants (used for seeded / decoded records too).
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "product {} has an empty name",
                self.id
            )));
        }
        if self.price < 0 {
            return Err(DomainError::validation(format!(
                "product {} has a negative price",
                self.id
            )));
        }
        if self.stock < 0 {
            return Err(DomainError::validation(format!(
                "product {} has negative stock",
                self.id
            )));
        }
        Ok(())
    }

    pub fn can_supply(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }

    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            stock: self.stock,
            image_url: self.image_url.clone(),
            category: self.category.clone(),
        }
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Read-only copy of a product attached to an order line for display.
///
/// The `price` here is whatever the catalog held when the snapshot was taken.
/// The line's own `price` is the authoritative charged amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i64,
    pub image_url: String,
    pub category: String,
}

impl ValueObject for ProductSnapshot {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_negative_price() {
        let err = Product::new(ProductId::new(), "Mug", -1, 3, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn new_rejects_negative_stock() {
        let err = Product::new(ProductId::new(), "Mug", 100, -3, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn can_supply_compares_against_stock() {
        let product = Product::new(ProductId::new(), "Mug", 100, 2, Utc::now()).unwrap();
        assert!(product.can_supply(2));
        assert!(!product.can_supply(3));
    }

    #[test]
    fn snapshot_copies_display_fields() {
        let product = Product::new(ProductId::new(), "Carrot plush", 1200, 4, Utc::now())
            .unwrap()
            .with_category("toys")
            .with_description("soft");
        let snap = product.snapshot();
        assert_eq!(snap.id, product.id);
        assert_eq!(snap.price, 1200);
        assert_eq!(snap.category, "toys");
        assert_eq!(snap.description, "soft");
    }

    #[test]
    fn decodes_seed_record_with_optional_fields_missing() {
        let id = ProductId::new();
        let json = serde_json::json!({
            "id": id.to_string(),
            "name": "Hay bale",
            "price": 800,
            "stock": 12,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
        });
        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.id, id);
        assert!(product.category.is_empty());
        product.validate().unwrap();
    }
}
