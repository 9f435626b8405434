//! Guest cart persisted in local storage.

use cardshop_core::{LocalCartItem, Price, ProductId, ProductSnapshot};
use rust_decimal::Decimal;

use super::{LocalStore, find_line, has_line, keys, remove_line};
use crate::events::{EventBus, StorageEvent};

/// Guest cart lines keyed by product.
///
/// Every method reads the current snapshot from storage, so several
/// `CartStorage` values over the same backend stay consistent.
#[derive(Debug, Clone)]
pub struct CartStorage {
    store: LocalStore,
    events: EventBus,
}

impl CartStorage {
    /// Create a cart view over `store` that reports mutations on `events`.
    #[must_use]
    pub const fn new(store: LocalStore, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Current cart snapshot. Empty if absent or unreadable.
    #[must_use]
    pub fn get_cart(&self) -> Vec<LocalCartItem> {
        self.store.read_json(keys::CART)
    }

    /// Add `quantity` units of a product, incrementing an existing line.
    ///
    /// Display fields of an existing line are refreshed from `product`.
    /// A zero quantity leaves the cart untouched.
    pub fn add_item(&self, product: ProductSnapshot, quantity: u32) -> Vec<LocalCartItem> {
        self.update(|cart| {
            if quantity == 0 {
                return false;
            }
            match find_line(cart, product.product_id) {
                Some(line) => {
                    line.quantity = line.quantity.saturating_add(quantity);
                    line.refresh_from(product);
                }
                None => cart.push(LocalCartItem::from_product(product, quantity)),
            }
            true
        })
    }

    /// Set the quantity of a line. Zero removes it; unknown products are ignored.
    pub fn update_quantity(&self, product_id: ProductId, quantity: u32) -> Vec<LocalCartItem> {
        self.update(|cart| {
            if quantity == 0 {
                return remove_line(cart, product_id);
            }
            match find_line(cart, product_id) {
                Some(line) if line.quantity != quantity => {
                    line.quantity = quantity;
                    true
                }
                _ => false,
            }
        })
    }

    /// Remove a product's line if present.
    pub fn remove_item(&self, product_id: ProductId) -> Vec<LocalCartItem> {
        self.update(|cart| remove_line(cart, product_id))
    }

    /// Delete the stored cart. Safe to call repeatedly.
    pub fn clear_cart(&self) {
        self.store.remove(keys::CART);
        self.events.emit(StorageEvent::CartChanged);
    }

    /// Whether the cart holds a line for `product_id`.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        has_line(&self.get_cart(), product_id)
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.get_cart()
            .iter()
            .fold(0, |sum, line| sum.saturating_add(line.quantity))
    }

    /// Sum of unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        Price::usd(
            self.get_cart()
                .iter()
                .map(LocalCartItem::line_total)
                .sum::<Decimal>(),
        )
    }

    fn update(&self, f: impl FnOnce(&mut Vec<LocalCartItem>) -> bool) -> Vec<LocalCartItem> {
        let (cart, changed) = self.store.update_json(keys::CART, f);
        if changed {
            self.events.emit(StorageEvent::CartChanged);
        }
        cart
    }
}
