//! Wire types for the backend REST API.
//!
//! All bodies are camelCase JSON wrapped in an [`Envelope`].

use cardshop_core::{
    CartItemId, LocalCartItem, LocalWishlistItem, Price, ProductId, UserId, WishlistItemId,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Envelope
// =============================================================================

/// Response wrapper used by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Error bodies only carry a message; `data` may be missing or null.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    pub message: Option<String>,
}

/// Page information for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

// =============================================================================
// Auth
// =============================================================================

/// Authenticated shopper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// `POST /auth/login` body.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// `POST /auth/login` response data.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user: User,
}

/// `POST /auth/refresh` response data.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshResponse {
    pub access_token: String,
}

// =============================================================================
// Cart
// =============================================================================

/// A server-side cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartItem {
    #[serde(default)]
    pub id: Option<CartItemId>,
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub product_slug: String,
    #[serde(default)]
    pub product_image: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
    pub quantity: u32,
}

/// The authenticated shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCart {
    #[serde(default)]
    pub items: Vec<RemoteCartItem>,
    #[serde(default)]
    pub total_items: Option<u32>,
    #[serde(default)]
    pub total_price: Option<Decimal>,
}

impl RemoteCart {
    /// Units in the cart, derived from the lines when the server omits it.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.total_items.unwrap_or_else(|| {
            self.items
                .iter()
                .fold(0, |sum, item| sum.saturating_add(item.quantity))
        })
    }

    /// Cart subtotal, derived from the lines when the server omits it.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        Price::usd(self.total_price.unwrap_or_else(|| {
            self.items
                .iter()
                .map(|item| item.price * Decimal::from(item.quantity))
                .sum()
        }))
    }
}

/// `POST /cart/add` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// `PUT /cart/items/{id}` body.
#[derive(Debug, Serialize)]
pub(crate) struct UpdateQuantityRequest {
    pub quantity: u32,
}

/// `POST /cart/sync` body.
#[derive(Debug, Serialize)]
pub(crate) struct CartSyncRequest<'a> {
    pub items: &'a [LocalCartItem],
}

// =============================================================================
// Wishlist
// =============================================================================

/// A server-side wishlist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteWishlistItem {
    #[serde(default)]
    pub id: Option<WishlistItemId>,
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default)]
    pub product_slug: String,
    #[serde(default)]
    pub product_image: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
}

/// The authenticated shopper's wishlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteWishlist {
    #[serde(default)]
    pub items: Vec<RemoteWishlistItem>,
}

impl RemoteWishlist {
    /// Product IDs in server order, each at most once.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids = Vec::with_capacity(self.items.len());
        for item in &self.items {
            if !ids.contains(&item.product_id) {
                ids.push(item.product_id);
            }
        }
        ids
    }
}

/// `POST /wishlist/add` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddToWishlistRequest {
    pub product_id: ProductId,
}

/// `POST /wishlist/sync` body.
#[derive(Debug, Serialize)]
pub(crate) struct WishlistSyncRequest<'a> {
    pub items: &'a [LocalWishlistItem],
}
