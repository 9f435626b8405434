//! Guest wishlist persisted in local storage.

use cardshop_core::{LocalWishlistItem, ProductId, ProductSnapshot};
use chrono::Utc;

use super::{LocalStore, has_line, keys, remove_line};
use crate::events::{EventBus, StorageEvent};

/// Guest wishlist entries keyed by product.
#[derive(Debug, Clone)]
pub struct WishlistStorage {
    store: LocalStore,
    events: EventBus,
}

impl WishlistStorage {
    /// Create a wishlist view over `store` that reports mutations on `events`.
    #[must_use]
    pub const fn new(store: LocalStore, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Current wishlist snapshot. Empty if absent or unreadable.
    #[must_use]
    pub fn get_wishlist(&self) -> Vec<LocalWishlistItem> {
        self.store.read_json(keys::WISHLIST)
    }

    /// Add a product. Returns `false` if it was already present.
    pub fn add_item(&self, product: ProductSnapshot) -> bool {
        self.update(|wishlist| {
            if has_line(wishlist, product.product_id) {
                return false;
            }
            wishlist.push(LocalWishlistItem::from_product(product, Utc::now()));
            true
        })
    }

    /// Remove a product. Returns `false` if it was not present.
    pub fn remove_item(&self, product_id: ProductId) -> bool {
        self.update(|wishlist| remove_line(wishlist, product_id))
    }

    /// Add the product if absent, remove it if present.
    ///
    /// Returns whether the product is in the wishlist afterwards.
    pub fn toggle(&self, product: ProductSnapshot) -> bool {
        if self.remove_item(product.product_id) {
            false
        } else {
            self.add_item(product)
        }
    }

    /// Whether `product_id` is wishlisted.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        has_line(&self.get_wishlist(), product_id)
    }

    /// Number of wishlisted products.
    #[must_use]
    pub fn count(&self) -> usize {
        self.get_wishlist().len()
    }

    /// Delete the stored wishlist. Safe to call repeatedly.
    pub fn clear_wishlist(&self) {
        self.store.remove(keys::WISHLIST);
        self.events.emit(StorageEvent::WishlistChanged);
    }

    fn update(&self, f: impl FnOnce(&mut Vec<LocalWishlistItem>) -> bool) -> bool {
        let (_, changed) = self.store.update_json(keys::WISHLIST, f);
        if changed {
            self.events.emit(StorageEvent::WishlistChanged);
        }
        changed
    }
}
