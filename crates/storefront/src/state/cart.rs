//! Cart slice: the server cart of the authenticated shopper.

use std::sync::Arc;

use cardshop_core::ProductId;
use tokio::sync::watch;
use tracing::{instrument, warn};

use crate::api::{ApiError, CartApi, RemoteCart};

/// Server cart state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    /// Latest server cart, `None` until fetched.
    pub cart: Option<RemoteCart>,
    pub has_fetched: bool,
    pub loading: bool,
    /// Requests in flight; `loading` stays set until all have settled.
    pub pending: u32,
    pub error: Option<String>,
}

impl CartState {
    /// Total quantity, as reported by the server.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.as_ref().map_or(0, RemoteCart::item_count)
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

/// Cart state transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    FetchPending,
    FetchFulfilled(RemoteCart),
    FetchRejected(String),
    MutatePending,
    MutateFulfilled(RemoteCart),
    MutateRejected(String),
    Cleared,
    Reset,
}

/// Apply `action` to `state`.
pub fn reduce(state: &mut CartState, action: CartAction) {
    match action {
        CartAction::FetchPending | CartAction::MutatePending => state.started(),
        CartAction::FetchFulfilled(cart) => {
            state.cart = Some(cart);
            state.has_fetched = true;
            state.settled();
        }
        CartAction::FetchRejected(message) => {
            state.has_fetched = true;
            state.settled();
            state.error = Some(message);
        }
        CartAction::MutateFulfilled(cart) => {
            state.cart = Some(cart);
            state.settled();
        }
        CartAction::MutateRejected(message) => {
            state.settled();
            state.error = Some(message);
        }
        CartAction::Cleared => {
            state.cart = Some(RemoteCart::default());
            state.settled();
        }
        CartAction::Reset => *state = CartState::default(),
    }
}

/// Shared cart store. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct CartStore {
    state: Arc<watch::Sender<CartState>>,
}

impl CartStore {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(CartState::default());
        Self {
            state: Arc::new(sender),
        }
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.state.borrow().clone()
    }

    /// Watch state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// Apply an action and notify subscribers.
    pub fn dispatch(&self, action: CartAction) {
        self.state.send_modify(|state| reduce(state, action));
    }

    /// Return to the unfetched state (on logout).
    pub fn reset(&self) {
        self.dispatch(CartAction::Reset);
    }

    /// Load the server cart.
    ///
    /// # Errors
    ///
    /// Returns the API error after recording it in state.
    #[instrument(skip_all)]
    pub async fn fetch_cart<A: CartApi>(&self, api: &A) -> Result<RemoteCart, ApiError> {
        self.dispatch(CartAction::FetchPending);
        match api.get_cart().await {
            Ok(cart) => {
                self.dispatch(CartAction::FetchFulfilled(cart.clone()));
                Ok(cart)
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch cart");
                self.dispatch(CartAction::FetchRejected(e.user_message()));
                Err(e)
            }
        }
    }

    /// Add `quantity` of a product to the server cart.
    ///
    /// # Errors
    ///
    /// Returns the API error after recording it in state.
    #[instrument(skip(self, api), fields(product_id = %product_id))]
    pub async fn add_item<A: CartApi>(
        &self,
        api: &A,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<RemoteCart, ApiError> {
        self.mutate(api.add_to_cart(product_id, quantity)).await
    }

    /// Set a line's quantity on the server cart.
    ///
    /// # Errors
    ///
    /// Returns the API error after recording it in state.
    #[instrument(skip(self, api), fields(product_id = %product_id))]
    pub async fn update_item<A: CartApi>(
        &self,
        api: &A,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<RemoteCart, ApiError> {
        self.mutate(api.update_cart_item(product_id, quantity)).await
    }

    /// Remove a line from the server cart.
    ///
    /// # Errors
    ///
    /// Returns the API error after recording it in state.
    #[instrument(skip(self, api), fields(product_id = %product_id))]
    pub async fn remove_item<A: CartApi>(
        &self,
        api: &A,
        product_id: ProductId,
    ) -> Result<RemoteCart, ApiError> {
        self.mutate(api.remove_cart_item(product_id)).await
    }

    /// Empty the server cart.
    ///
    /// # Errors
    ///
    /// Returns the API error after recording it in state.
    #[instrument(skip_all)]
    pub async fn clear_cart<A: CartApi>(&self, api: &A) -> Result<(), ApiError> {
        self.dispatch(CartAction::MutatePending);
        match api.clear_cart().await {
            Ok(()) => {
                self.dispatch(CartAction::Cleared);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to clear cart");
                self.dispatch(CartAction::MutateRejected(e.user_message()));
                Err(e)
            }
        }
    }

    async fn mutate(
        &self,
        request: impl Future<Output = Result<RemoteCart, ApiError>>,
    ) -> Result<RemoteCart, ApiError> {
        self.dispatch(CartAction::MutatePending);
        match request.await {
            Ok(cart) => {
                self.dispatch(CartAction::MutateFulfilled(cart.clone()));
                Ok(cart)
            }
            Err(e) => {
                warn!(error = %e, "Cart update failed");
                self.dispatch(CartAction::MutateRejected(e.user_message()));
                Err(e)
            }
        }
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}
