//! Application context tying storage, API and state together.
//!
//! `Storefront` is what a front end holds on to. Cart and wishlist operations
//! go to local storage for guests and to the server for signed-in shoppers;
//! the switch is decided per call from the presence of an access token, so a
//! session demoted by a failed refresh falls back to local storage on its own.
//! The first check that finds the token gone also discards the session's
//! server state, so the next login starts clean.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use cardshop_core::{Email, LocalCartItem, Price, ProductId, ProductSnapshot};
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use crate::api::{
    ApiClient, AuthApi, CartApi, RemoteCart, RemoteCartItem, TokenStore, User, WishlistApi,
};
use crate::config::ClientConfig;
use crate::error::{Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::events::EventBus;
use crate::guards::FetchGuards;
use crate::handles::{AuthHandle, WishlistHandle};
use crate::state::{AuthStore, CartAction, CartStore, WishlistAction, WishlistStore};
use crate::storage::{CartStorage, FileStore, LocalStore, WishlistStorage};
use crate::sync::{SyncReport, sync_after_login};

// =============================================================================
// View Types
// =============================================================================

/// Where a [`CartView`] was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartSource {
    /// Guest cart in local storage.
    Local,
    /// Server cart of the signed-in shopper.
    Server,
}

/// Cart line display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub slug: String,
    pub title: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    pub stock: u32,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub subtotal: String,
    pub item_count: u32,
    pub source: CartSource,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty(source: CartSource) -> Self {
        Self {
            items: Vec::new(),
            subtotal: Price::usd(rust_decimal::Decimal::ZERO).display(),
            item_count: 0,
            source,
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&[LocalCartItem]> for CartView {
    fn from(items: &[LocalCartItem]) -> Self {
        Self {
            items: items.iter().map(CartLine::from).collect(),
            subtotal: Price::usd(items.iter().map(LocalCartItem::line_total).sum()).display(),
            item_count: items
                .iter()
                .fold(0, |sum, item| sum.saturating_add(item.quantity)),
            source: CartSource::Local,
        }
    }
}

impl From<&RemoteCart> for CartView {
    fn from(cart: &RemoteCart) -> Self {
        Self {
            items: cart.items.iter().map(CartLine::from).collect(),
            subtotal: cart.subtotal().display(),
            item_count: cart.item_count(),
            source: CartSource::Server,
        }
    }
}

impl From<&LocalCartItem> for CartLine {
    fn from(item: &LocalCartItem) -> Self {
        let price = Price::usd(item.price);
        Self {
            product_id: item.product_id,
            slug: item.product_slug.clone(),
            title: item.product_name.clone(),
            image: item.product_image.clone(),
            quantity: item.quantity,
            price: price.display(),
            line_price: price.line_total(item.quantity).display(),
            stock: item.stock,
        }
    }
}

impl From<&RemoteCartItem> for CartLine {
    fn from(item: &RemoteCartItem) -> Self {
        let price = Price::usd(item.price);
        Self {
            product_id: item.product_id,
            slug: item.product_slug.clone(),
            title: item.product_name.clone(),
            image: item.product_image.clone(),
            quantity: item.quantity,
            price: price.display(),
            line_price: price.line_total(item.quantity).display(),
            stock: item.stock,
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    /// Guest data merge results. Failures here do not fail the login.
    pub sync: SyncReport,
}

// =============================================================================
// Storefront
// =============================================================================

/// Shared application context. Cheap to clone.
pub struct Storefront<A = ApiClient> {
    inner: Arc<StorefrontInner<A>>,
}

struct StorefrontInner<A> {
    api: A,
    tokens: TokenStore,
    events: EventBus,
    local: LocalStore,
    cart_storage: CartStorage,
    wishlist_storage: WishlistStorage,
    cart: CartStore,
    wishlist: WishlistStore,
    auth: AuthStore,
    guards: FetchGuards,
    epoch: AtomicU64,
    /// A token was seen since the last session reset.
    signed_in: AtomicBool,
}

impl<A> Clone for Storefront<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Storefront<ApiClient> {
    /// Build a storefront talking HTTP to the configured backend, with guest
    /// data stored under `config.storage_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let tokens = TokenStore::new();
        let api = ApiClient::new(config, tokens.clone())?;
        let local = LocalStore::with_fallback(Arc::new(FileStore::new(config.storage_dir.clone())));
        Ok(Self::new(api, tokens, local))
    }
}

impl<A> Storefront<A>
where
    A: AuthApi + CartApi + WishlistApi,
{
    /// Assemble a storefront from its parts.
    ///
    /// `tokens` must be the store `api` reads its bearer token from.
    #[must_use]
    pub fn new(api: A, tokens: TokenStore, local: LocalStore) -> Self {
        let events = EventBus::new();
        Self {
            inner: Arc::new(StorefrontInner {
                cart_storage: CartStorage::new(local.clone(), events.clone()),
                wishlist_storage: WishlistStorage::new(local.clone(), events.clone()),
                api,
                tokens,
                events,
                local,
                cart: CartStore::new(),
                wishlist: WishlistStore::new(),
                auth: AuthStore::new(),
                guards: FetchGuards::new(),
                epoch: AtomicU64::new(0),
                signed_in: AtomicBool::new(false),
            }),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn api(&self) -> &A {
        &self.inner.api
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    /// Local storage change notifications.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.inner.events
    }

    /// Whether guest data is only kept in memory.
    #[must_use]
    pub fn storage_degraded(&self) -> bool {
        self.inner.local.is_degraded()
    }

    #[must_use]
    pub fn cart_storage(&self) -> &CartStorage {
        &self.inner.cart_storage
    }

    #[must_use]
    pub fn wishlist_storage(&self) -> &WishlistStorage {
        &self.inner.wishlist_storage
    }

    #[must_use]
    pub fn cart_store(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn wishlist_store(&self) -> &WishlistStore {
        &self.inner.wishlist
    }

    #[must_use]
    pub fn auth_store(&self) -> &AuthStore {
        &self.inner.auth
    }

    #[must_use]
    pub fn guards(&self) -> &FetchGuards {
        &self.inner.guards
    }

    /// Session counter, bumped on every login and logout.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.inner.epoch.load(Ordering::Acquire)
    }

    /// Whether an access token is held.
    ///
    /// Finding the token gone after it was seen (a failed refresh, a rejected
    /// restored token) resets the session to guest.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let present = self.inner.tokens.is_present();
        if self.inner.signed_in.swap(present, Ordering::AcqRel) && !present {
            info!("Access token dropped, continuing as guest");
            self.reset_session();
        }
        present
    }

    /// Drop everything tied to the current session and start a new epoch.
    fn reset_session(&self) {
        self.inner.signed_in.store(false, Ordering::Release);
        self.inner.guards.reset_all();
        self.inner.wishlist.reset_wishlist();
        self.inner.cart.reset();
        self.inner.auth.guest();
        self.inner.epoch.fetch_add(1, Ordering::AcqRel);
        clear_sentry_user();
    }

    /// Create a wishlist handle for one consumer.
    #[must_use]
    pub fn wishlist_handle(&self) -> WishlistHandle<A> {
        WishlistHandle::new(self.clone())
    }

    /// Create an auth handle for one consumer.
    #[must_use]
    pub fn auth_handle(&self) -> AuthHandle<A> {
        AuthHandle::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------------

    /// Sign in and merge the guest cart and wishlist into the account.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is invalid or the credentials are
    /// rejected. Merge failures are reported in [`LoginOutcome::sync`].
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<LoginOutcome> {
        let email = Email::parse(email)?;
        let auth = &self.inner.auth;
        auth.begin();

        let response = match self.inner.api.login(&email, password).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Login failed");
                auth.failed(e.user_message());
                return Err(e.into());
            }
        };

        // State left by an earlier session never carries over
        self.reset_session();
        self.inner
            .tokens
            .set(SecretString::from(response.access_token));
        self.inner.signed_in.store(true, Ordering::Release);
        auth.authenticated(response.user.clone());
        set_sentry_user(&response.user.id, Some(&response.user.email));
        add_breadcrumb("auth", "Logged in", None);
        info!(user_id = %response.user.id, "Logged in");

        let sync = sync_after_login(
            &self.inner.cart_storage,
            &self.inner.wishlist_storage,
            &self.inner.api,
        )
        .await;

        if let Some(cart) = sync.cart.merged() {
            self.inner
                .cart
                .dispatch(CartAction::FetchFulfilled(cart.clone()));
        }
        if let Some(wishlist) = sync.wishlist.merged() {
            self.inner
                .wishlist
                .dispatch(WishlistAction::FetchFulfilled(wishlist.clone()));
        }

        Ok(LoginOutcome {
            user: response.user,
            sync,
        })
    }

    /// Sign out and return to guest state.
    ///
    /// The server call is best effort; local session state is always reset.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if self.is_authenticated()
            && let Err(e) = self.inner.api.logout().await
        {
            warn!(error = %e, "Logout request failed");
        }

        self.inner.tokens.clear();
        self.reset_session();
        info!("Logged out");
    }

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    /// Current cart, fetching the server cart once per session.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cart cannot be loaded.
    pub async fn cart(&self) -> Result<CartView> {
        if !self.is_authenticated() {
            return Ok(CartView::from(self.inner.cart_storage.get_cart().as_slice()));
        }

        let state = self.inner.cart.state();
        match state.cart {
            Some(cart) if state.has_fetched => Ok(CartView::from(&cart)),
            _ => {
                let cart = self.inner.cart.fetch_cart(&self.inner.api).await?;
                Ok(CartView::from(&cart))
            }
        }
    }

    /// Add `quantity` units of `product`. Zero is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the change.
    #[instrument(skip(self, product), fields(product_id = %product.product_id))]
    pub async fn add_to_cart(&self, product: ProductSnapshot, quantity: u32) -> Result<CartView> {
        if !self.is_authenticated() {
            let cart = self.inner.cart_storage.add_item(product, quantity);
            return Ok(CartView::from(cart.as_slice()));
        }
        if quantity == 0 {
            return self.cart().await;
        }

        let cart = self
            .inner
            .cart
            .add_item(&self.inner.api, product.product_id, quantity)
            .await?;
        Ok(CartView::from(&cart))
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the change.
    #[instrument(skip(self))]
    pub async fn update_cart_quantity(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartView> {
        if !self.is_authenticated() {
            let cart = self.inner.cart_storage.update_quantity(product_id, quantity);
            return Ok(CartView::from(cart.as_slice()));
        }
        if quantity == 0 {
            return self.remove_from_cart(product_id).await;
        }

        let cart = self
            .inner
            .cart
            .update_item(&self.inner.api, product_id, quantity)
            .await?;
        Ok(CartView::from(&cart))
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the change.
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, product_id: ProductId) -> Result<CartView> {
        if !self.is_authenticated() {
            let cart = self.inner.cart_storage.remove_item(product_id);
            return Ok(CartView::from(cart.as_slice()));
        }

        let cart = self
            .inner
            .cart
            .remove_item(&self.inner.api, product_id)
            .await?;
        Ok(CartView::from(&cart))
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the change.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<()> {
        if self.is_authenticated() {
            self.inner.cart.clear_cart(&self.inner.api).await?;
        } else {
            self.inner.cart_storage.clear_cart();
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Wishlist
    // -------------------------------------------------------------------------

    /// Wishlisted product IDs.
    #[must_use]
    pub fn wishlist_ids(&self) -> Vec<ProductId> {
        if self.is_authenticated() {
            self.inner.wishlist.product_ids()
        } else {
            self.inner
                .wishlist_storage
                .get_wishlist()
                .iter()
                .map(|entry| entry.product_id)
                .collect()
        }
    }

    /// Whether `product_id` is wishlisted.
    #[must_use]
    pub fn is_in_wishlist(&self, product_id: ProductId) -> bool {
        if self.is_authenticated() {
            self.inner.wishlist.contains(product_id)
        } else {
            self.inner.wishlist_storage.contains(product_id)
        }
    }

    /// Wishlist `product`. Returns `false` if it was already present.
    ///
    /// Signed-in shoppers see the change immediately; it is undone if the
    /// server rejects it.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the change.
    #[instrument(skip(self, product), fields(product_id = %product.product_id))]
    pub async fn add_to_wishlist(&self, product: ProductSnapshot) -> Result<bool> {
        if !self.is_authenticated() {
            return Ok(self.inner.wishlist_storage.add_item(product));
        }

        let product_id = product.product_id;
        let store = &self.inner.wishlist;
        if store.contains(product_id) {
            return Ok(false);
        }

        store.optimistic_add(product_id);
        if let Err(e) = store.add_wishlist_item(&self.inner.api, product_id).await {
            store.optimistic_remove(product_id);
            return Err(e.into());
        }
        Ok(true)
    }

    /// Remove `product_id` from the wishlist. Returns `false` if it was absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the change.
    #[instrument(skip(self))]
    pub async fn remove_from_wishlist(&self, product_id: ProductId) -> Result<bool> {
        if !self.is_authenticated() {
            return Ok(self.inner.wishlist_storage.remove_item(product_id));
        }

        let store = &self.inner.wishlist;
        if !store.contains(product_id) {
            return Ok(false);
        }

        store.optimistic_remove(product_id);
        if let Err(e) = store
            .remove_wishlist_item_async(&self.inner.api, product_id)
            .await
        {
            store.optimistic_add(product_id);
            return Err(e.into());
        }
        Ok(true)
    }
}

impl<A> std::fmt::Debug for Storefront<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("tokens", &self.inner.tokens)
            .field("local", &self.inner.local)
            .field("epoch", &self.inner.epoch)
            .finish_non_exhaustive()
    }
}
