//! Wishlist slice: the authenticated shopper's wishlisted product IDs.
//!
//! Optimistic updates are applied synchronously; the async operations do
//! NOT roll back on failure. Callers pair `optimistic_add` with
//! `remove`-on-failure (and vice versa), see `WishlistHandle::toggle`.

use std::sync::Arc;

use cardshop_core::ProductId;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::api::{ApiError, RemoteWishlist, RemoteWishlistItem, WishlistApi};

/// Wishlist state for one authenticated session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WishlistState {
    /// Wishlisted products; each ID appears at most once.
    pub product_ids: Vec<ProductId>,
    /// Entries from the latest server payload.
    pub items: Vec<RemoteWishlistItem>,
    /// Whether a fetch has completed (successfully or not) this session.
    pub has_fetched: bool,
    /// At least one request is in flight.
    pub loading: bool,
    /// Requests in flight. A fetch and a write may overlap.
    pub pending: u32,
    /// Last failure, for display.
    pub error: Option<String>,
}

impl WishlistState {
    /// Whether `product_id` is wishlisted.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.product_ids.contains(&product_id)
    }

    fn insert(&mut self, product_id: ProductId) {
        if !self.contains(product_id) {
            self.product_ids.push(product_id);
        }
    }

    fn remove(&mut self, product_id: ProductId) {
        self.product_ids.retain(|id| *id != product_id);
    }

    fn started(&mut self) {
        self.pending = self.pending.saturating_add(1);
        self.loading = true;
        self.error = None;
    }

    fn settled(&mut self) {
        self.pending = self.pending.saturating_sub(1);
        self.loading = self.pending > 0;
    }
}

/// Wishlist state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WishlistAction {
    FetchPending,
    FetchFulfilled(RemoteWishlist),
    FetchRejected(String),
    OptimisticAdd(ProductId),
    OptimisticRemove(ProductId),
    AddPending,
    AddFulfilled {
        product_id: ProductId,
        wishlist: RemoteWishlist,
    },
    AddRejected(String),
    RemovePending,
    RemoveFulfilled {
        product_id: ProductId,
        wishlist: RemoteWishlist,
    },
    RemoveRejected(String),
    Reset,
}

/// Apply `action` to `state`.
pub fn reduce(state: &mut WishlistState, action: WishlistAction) {
    match action {
        WishlistAction::FetchPending
        | WishlistAction::AddPending
        | WishlistAction::RemovePending => state.started(),
        WishlistAction::FetchFulfilled(wishlist) => {
            state.product_ids = wishlist.product_ids();
            state.items = wishlist.items;
            state.has_fetched = true;
            state.settled();
        }
        WishlistAction::FetchRejected(message) => {
            state.has_fetched = true;
            state.settled();
            state.error = Some(message);
        }
        WishlistAction::OptimisticAdd(product_id) => state.insert(product_id),
        WishlistAction::OptimisticRemove(product_id) => state.remove(product_id),
        WishlistAction::AddFulfilled {
            product_id,
            wishlist,
        } => {
            state.insert(product_id);
            state.items = wishlist.items;
            state.settled();
        }
        WishlistAction::RemoveFulfilled {
            product_id,
            wishlist,
        } => {
            state.remove(product_id);
            state.items = wishlist.items;
            state.settled();
        }
        WishlistAction::AddRejected(message) | WishlistAction::RemoveRejected(message) => {
            state.settled();
            state.error = Some(message);
        }
        WishlistAction::Reset => *state = WishlistState::default(),
    }
}

/// Shared wishlist store. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct WishlistStore {
    state: Arc<watch::Sender<WishlistState>>,
}

impl WishlistStore {
    /// Create a store in the initial (unfetched) state.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(WishlistState::default());
        Self {
            state: Arc::new(sender),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> WishlistState {
        self.state.borrow().clone()
    }

    /// Watch state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<WishlistState> {
        self.state.subscribe()
    }

    /// Apply an action and notify subscribers.
    pub fn dispatch(&self, action: WishlistAction) {
        self.state.send_modify(|state| reduce(state, action));
    }

    /// Whether `product_id` is wishlisted.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.state.borrow().contains(product_id)
    }

    /// Whether a fetch has completed this session.
    #[must_use]
    pub fn has_fetched(&self) -> bool {
        self.state.borrow().has_fetched
    }

    /// Current product IDs.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.state.borrow().product_ids.clone()
    }

    /// Add `product_id` before the server confirms it.
    pub fn optimistic_add(&self, product_id: ProductId) {
        self.dispatch(WishlistAction::OptimisticAdd(product_id));
    }

    /// Remove `product_id` before the server confirms it.
    pub fn optimistic_remove(&self, product_id: ProductId) {
        self.dispatch(WishlistAction::OptimisticRemove(product_id));
    }

    /// Return to the unfetched state (on logout).
    pub fn reset_wishlist(&self) {
        self.dispatch(WishlistAction::Reset);
    }

    /// Replace the product IDs with the server wishlist.
    ///
    /// # Errors
    ///
    /// Returns the API error after recording it in state.
    #[instrument(skip_all)]
    pub async fn fetch_wishlist<A: WishlistApi>(
        &self,
        api: &A,
    ) -> Result<RemoteWishlist, ApiError> {
        self.dispatch(WishlistAction::FetchPending);
        match api.get_wishlist().await {
            Ok(wishlist) => {
                debug!(items = wishlist.items.len(), "Wishlist fetched");
                self.dispatch(WishlistAction::FetchFulfilled(wishlist.clone()));
                Ok(wishlist)
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch wishlist");
                self.dispatch(WishlistAction::FetchRejected(e.user_message()));
                Err(e)
            }
        }
    }

    /// Persist an add on the server.
    ///
    /// On failure the caller must roll back with [`Self::optimistic_remove`].
    ///
    /// # Errors
    ///
    /// Returns the API error after recording it in state.
    #[instrument(skip(self, api), fields(product_id = %product_id))]
    pub async fn add_wishlist_item<A: WishlistApi>(
        &self,
        api: &A,
        product_id: ProductId,
    ) -> Result<RemoteWishlist, ApiError> {
        self.dispatch(WishlistAction::AddPending);
        match api.add_to_wishlist(product_id).await {
            Ok(wishlist) => {
                self.dispatch(WishlistAction::AddFulfilled {
                    product_id,
                    wishlist: wishlist.clone(),
                });
                Ok(wishlist)
            }
            Err(e) => {
                warn!(error = %e, "Failed to add wishlist item");
                self.dispatch(WishlistAction::AddRejected(e.user_message()));
                Err(e)
            }
        }
    }

    /// Persist a removal on the server.
    ///
    /// On failure the caller must roll back with [`Self::optimistic_add`].
    ///
    /// # Errors
    ///
    /// Returns the API error after recording it in state.
    #[instrument(skip(self, api), fields(product_id = %product_id))]
    pub async fn remove_wishlist_item_async<A: WishlistApi>(
        &self,
        api: &A,
        product_id: ProductId,
    ) -> Result<RemoteWishlist, ApiError> {
        self.dispatch(WishlistAction::RemovePending);
        match api.remove_from_wishlist(product_id).await {
            Ok(wishlist) => {
                self.dispatch(WishlistAction::RemoveFulfilled {
                    product_id,
                    wishlist: wishlist.clone(),
                });
                Ok(wishlist)
            }
            Err(e) => {
                warn!(error = %e, "Failed to remove wishlist item");
                self.dispatch(WishlistAction::RemoveRejected(e.user_message()));
                Err(e)
            }
        }
    }
}

impl Default for WishlistStore {
    fn default() -> Self {
        Self::new()
    }
}
