//! Catalog and cart records.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId};

/// A catalog product.
///
/// Catalog data is immutable once loaded; the storefront never edits a
/// product in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub category: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl Product {
    /// The first image reference, or an empty string when there is none.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images.first().map_or("", String::as_str)
    }
}

/// A cart entry: a product reference, a snapshot of the product's name,
/// price and primary image taken when it was added, and a quantity.
///
/// Quantity is always at least one; the cart removes entries instead of
/// storing zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: String,
    pub quantity: u32,
}

impl CartLineItem {
    /// Snapshot `product` into a new line item.
    #[must_use]
    pub fn snapshot(product: &Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.primary_image().to_owned(),
            quantity,
        }
    }

    /// Price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(images: Vec<String>) -> Product {
        Product {
            id: ProductId::new("p9"),
            name: "Mousepad XL".to_string(),
            price: Price::from_cents(7_990),
            category: "Periféricos".to_string(),
            images,
            description: String::new(),
        }
    }

    #[test]
    fn test_snapshot_uses_first_image() {
        let p = product(vec!["a.png".to_string(), "b.png".to_string()]);
        let item = CartLineItem::snapshot(&p, 2);
        assert_eq!(item.image, "a.png");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.line_total(), Price::from_cents(15_980));
    }

    #[test]
    fn test_snapshot_without_images() {
        let item = CartLineItem::snapshot(&product(Vec::new()), 1);
        assert_eq!(item.image, "");
    }
}
