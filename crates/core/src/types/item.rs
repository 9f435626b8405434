//! Guest line items persisted in local storage.
//!
//! Field names serialize in camelCase so snapshots written by a browser
//! front end (`productId`, `productSlug`, ...) load unchanged.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// Product data captured when a shopper adds something to a cart or wishlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: String,
    #[serde(default)]
    pub product_image: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
}

/// Common access to the product key of a stored line item.
pub trait LineItem {
    /// The product this line refers to. Unique within a snapshot.
    fn product_id(&self) -> ProductId;
}

/// A guest cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCartItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: String,
    #[serde(default)]
    pub product_image: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
    pub quantity: u32,
}

impl LocalCartItem {
    /// Build a cart line from a product snapshot.
    #[must_use]
    pub fn from_product(product: ProductSnapshot, quantity: u32) -> Self {
        Self {
            product_id: product.product_id,
            product_name: product.product_name,
            product_slug: product.product_slug,
            product_image: product.product_image,
            price: product.price,
            stock: product.stock,
            quantity,
        }
    }

    /// Refresh the display fields from a newer snapshot, keeping the quantity.
    pub fn refresh_from(&mut self, product: ProductSnapshot) {
        self.product_name = product.product_name;
        self.product_slug = product.product_slug;
        self.product_image = product.product_image;
        self.price = product.price;
        self.stock = product.stock;
    }

    /// Price of this line (unit price times quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

impl LineItem for LocalCartItem {
    fn product_id(&self) -> ProductId {
        self.product_id
    }
}

/// A guest wishlist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalWishlistItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: String,
    #[serde(default)]
    pub product_image: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
    pub added_at: DateTime<Utc>,
}

impl LocalWishlistItem {
    /// Build a wishlist entry from a product snapshot.
    #[must_use]
    pub fn from_product(product: ProductSnapshot, added_at: DateTime<Utc>) -> Self {
        Self {
            product_id: product.product_id,
            product_name: product.product_name,
            product_slug: product.product_slug,
            product_image: product.product_image,
            price: product.price,
            stock: product.stock,
            added_at,
        }
    }
}

impl LineItem for LocalWishlistItem {
    fn product_id(&self) -> ProductId {
        self.product_id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_item_reads_browser_snapshot() {
        let json = r#"{
            "productId": 42,
            "productName": "Birthday Card",
            "productSlug": "birthday-card",
            "productImage": null,
            "price": 4.5,
            "stock": 10,
            "quantity": 3
        }"#;
        let item: LocalCartItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.product_id, ProductId::new(42));
        assert_eq!(item.quantity, 3);
        assert_eq!(item.line_total(), Decimal::new(135, 1));
    }

    #[test]
    fn test_refresh_keeps_quantity() {
        let product = ProductSnapshot {
            product_id: ProductId::new(1),
            product_name: "Old".to_string(),
            product_slug: "old".to_string(),
            product_image: None,
            price: Decimal::new(100, 2),
            stock: 5,
        };
        let mut item = LocalCartItem::from_product(product.clone(), 4);
        item.refresh_from(ProductSnapshot {
            product_name: "New".to_string(),
            price: Decimal::new(150, 2),
            ..product
        });
        assert_eq!(item.quantity, 4);
        assert_eq!(item.product_name, "New");
        assert_eq!(item.price, Decimal::new(150, 2));
    }
}
