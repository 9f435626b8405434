//! Merge guest cart/wishlist into the server after login.
//!
//! Runs once, right after a login succeeds and before the session is treated
//! as ready. The client only transports the local snapshot; merge semantics
//! belong to the server. Failures are logged and swallowed: local storage is
//! left untouched so nothing the guest saved is lost, and login still completes.

use tracing::{info, instrument, warn};

use crate::api::{CartApi, RemoteCart, RemoteWishlist, WishlistApi};
use crate::error::add_breadcrumb;
use crate::storage::{CartStorage, WishlistStorage};

/// Result of merging one item kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome<T> {
    /// Local storage was empty; no request was made.
    Skipped,
    /// The server accepted the items and local storage was cleared.
    Merged(T),
    /// The merge request failed; local storage is unchanged.
    Failed(String),
}

impl<T> SyncOutcome<T> {
    /// Whether the merge request failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Server state returned by a successful merge.
    #[must_use]
    pub const fn merged(&self) -> Option<&T> {
        match self {
            Self::Merged(value) => Some(value),
            _ => None,
        }
    }
}

/// Outcome of both merges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub cart: SyncOutcome<RemoteCart>,
    pub wishlist: SyncOutcome<RemoteWishlist>,
}

/// Push the guest cart to `POST /cart/sync` and clear it on success.
#[instrument(skip_all)]
pub async fn sync_cart_after_login<A: CartApi>(
    storage: &CartStorage,
    api: &A,
) -> SyncOutcome<RemoteCart> {
    let items = storage.get_cart();
    if items.is_empty() {
        return SyncOutcome::Skipped;
    }

    match api.sync_cart(&items).await {
        Ok(cart) => {
            storage.clear_cart();
            info!(items = items.len(), "Guest cart merged into account");
            SyncOutcome::Merged(cart)
        }
        Err(e) => {
            warn!(error = %e, items = items.len(), "Failed to sync guest cart after login");
            let count = items.len().to_string();
            add_breadcrumb(
                "sync",
                "Guest cart merge failed",
                Some(&[("items", count.as_str())]),
            );
            SyncOutcome::Failed(e.to_string())
        }
    }
}

/// Push the guest wishlist to `POST /wishlist/sync` and clear it on success.
#[instrument(skip_all)]
pub async fn sync_wishlist_after_login<A: WishlistApi>(
    storage: &WishlistStorage,
    api: &A,
) -> SyncOutcome<RemoteWishlist> {
    let items = storage.get_wishlist();
    if items.is_empty() {
        return SyncOutcome::Skipped;
    }

    match api.sync_wishlist(&items).await {
        Ok(wishlist) => {
            storage.clear_wishlist();
            info!(items = items.len(), "Guest wishlist merged into account");
            SyncOutcome::Merged(wishlist)
        }
        Err(e) => {
            warn!(error = %e, items = items.len(), "Failed to sync guest wishlist after login");
            let count = items.len().to_string();
            add_breadcrumb(
                "sync",
                "Guest wishlist merge failed",
                Some(&[("items", count.as_str())]),
            );
            SyncOutcome::Failed(e.to_string())
        }
    }
}

/// Run both merges concurrently. Neither waits on nor affects the other.
pub async fn sync_after_login<A: CartApi + WishlistApi>(
    cart: &CartStorage,
    wishlist: &WishlistStorage,
    api: &A,
) -> SyncReport {
    let (cart, wishlist) = tokio::join!(
        sync_cart_after_login(cart, api),
        sync_wishlist_after_login(wishlist, api),
    );
    SyncReport { cart, wishlist }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cardshop_core::ProductId;

    use super::*;
    use crate::events::{EventBus, StorageEvent};
    use crate::storage::LocalStore;
    use crate::test_support::{FakeBackend, product};

    fn storages() -> (CartStorage, WishlistStorage, EventBus) {
        let events = EventBus::new();
        let store = LocalStore::in_memory();
        (
            CartStorage::new(store.clone(), events.clone()),
            WishlistStorage::new(store, events.clone()),
            events,
        )
    }

    #[tokio::test]
    async fn test_empty_local_cart_skips_request() {
        let (cart, _, _) = storages();
        let api = FakeBackend::new();
        let outcome = sync_cart_after_login(&cart, &api).await;
        assert_eq!(outcome, SyncOutcome::Skipped);
        assert_eq!(api.calls_to("POST /cart/sync"), 0);
    }

    #[tokio::test]
    async fn test_successful_cart_sync_clears_local_store() {
        let (cart, _, events) = storages();
        cart.add_item(product(42), 1);
        cart.add_item(product(42), 2);

        let mut rx = events.subscribe();
        let api = FakeBackend::new();
        let outcome = sync_cart_after_login(&cart, &api).await;

        assert_eq!(outcome.merged().unwrap().item_count(), 3);
        assert!(cart.get_cart().is_empty());
        assert_eq!(rx.try_recv().unwrap(), StorageEvent::CartChanged);
        assert!(rx.try_recv().is_err());

        let sent = api.sent_cart();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].product_id, ProductId::new(42));
        assert_eq!(sent[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_failed_cart_sync_leaves_local_store() {
        let (cart, _, events) = storages();
        cart.add_item(product(1), 2);
        let before = cart.get_cart();

        let mut rx = events.subscribe();
        let api = FakeBackend::failing(|b| &b.fail_cart_sync);
        let outcome = sync_cart_after_login(&cart, &api).await;

        assert!(outcome.is_failed());
        assert_eq!(cart.get_cart(), before);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_block_the_other() {
        let (cart, wishlist, _) = storages();
        cart.add_item(product(1), 1);
        wishlist.add_item(product(2));

        let api = FakeBackend::failing(|b| &b.fail_cart_sync);
        let report = sync_after_login(&cart, &wishlist, &api).await;

        assert!(report.cart.is_failed());
        let merged = report.wishlist.merged().unwrap();
        assert_eq!(merged.product_ids(), vec![ProductId::new(2)]);
        assert_eq!(cart.item_count(), 1);
        assert_eq!(wishlist.count(), 0);
    }

    #[tokio::test]
    async fn test_sync_is_safe_to_repeat() {
        let (cart, wishlist, _) = storages();
        wishlist.add_item(product(9));
        let api = FakeBackend::new();

        sync_after_login(&cart, &wishlist, &api).await;
        let second = sync_after_login(&cart, &wishlist, &api).await;

        assert_eq!(second.wishlist, SyncOutcome::Skipped);
        assert_eq!(second.cart, SyncOutcome::Skipped);
        assert_eq!(api.calls_to("POST /wishlist/sync"), 1);
    }
}
