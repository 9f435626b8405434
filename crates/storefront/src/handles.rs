//! Per-consumer accessors for auth-gated resources.
//!
//! Every view or command that needs the wishlist or the current user holds
//! its own handle. Handles remember whether they already triggered a fetch
//! in the current session epoch, and defer to the app-wide [`FetchGuards`]
//! so that many handles asking at once still produce a single request.
//!
//! [`FetchGuards`]: crate::guards::FetchGuards

use std::sync::atomic::{AtomicU64, Ordering};

use cardshop_core::{ProductId, ProductSnapshot};
use tracing::{debug, warn};

use crate::api::{AuthApi, CartApi, User, WishlistApi};
use crate::error::{Result, set_sentry_user};
use crate::session::Storefront;

const NEVER: u64 = u64::MAX;

/// Epoch-tied "this handle already triggered" flag.
#[derive(Debug)]
struct Triggered(AtomicU64);

impl Triggered {
    const fn new() -> Self {
        Self(AtomicU64::new(NEVER))
    }

    fn in_epoch(&self, epoch: u64) -> bool {
        self.0.load(Ordering::Acquire) == epoch
    }

    fn mark(&self, epoch: u64) {
        self.0.store(epoch, Ordering::Release);
    }
}

// =============================================================================
// WishlistHandle
// =============================================================================

/// One consumer's view of the wishlist.
#[derive(Debug)]
pub struct WishlistHandle<A> {
    app: Storefront<A>,
    triggered: Triggered,
}

impl<A> WishlistHandle<A>
where
    A: AuthApi + CartApi + WishlistApi,
{
    pub(crate) const fn new(app: Storefront<A>) -> Self {
        Self {
            app,
            triggered: Triggered::new(),
        }
    }

    /// Load the server wishlist if nobody has yet this session.
    ///
    /// Returns `true` if this call issued the request. Guests, an already
    /// fetched wishlist, a repeat call from this handle, or another handle
    /// holding the guard all make this a no-op. A failed fetch still counts
    /// as fetched; the guard stays held until logout.
    pub async fn ensure_fetched(&self) -> bool {
        if !self.app.is_authenticated() || self.app.wishlist_store().has_fetched() {
            return false;
        }

        let epoch = self.app.epoch();
        if self.triggered.in_epoch(epoch) {
            return false;
        }
        if !self.app.guards().wishlist.try_begin() {
            debug!("Wishlist fetch already in flight");
            return false;
        }
        self.triggered.mark(epoch);

        // Failure is recorded in the wishlist state
        let _ = self
            .app
            .wishlist_store()
            .fetch_wishlist(self.app.api())
            .await;
        true
    }

    /// Whether `product_id` is wishlisted.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.app.is_in_wishlist(product_id)
    }

    /// Wishlisted product IDs.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.app.wishlist_ids()
    }

    /// Add or remove `product`. Returns whether it is wishlisted afterwards.
    ///
    /// For signed-in shoppers the flip is visible immediately and undone if
    /// the server rejects it.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the change.
    pub async fn toggle(&self, product: ProductSnapshot) -> Result<bool> {
        let product_id = product.product_id;
        if self.contains(product_id) {
            self.app.remove_from_wishlist(product_id).await?;
            Ok(false)
        } else {
            self.app.add_to_wishlist(product).await?;
            Ok(true)
        }
    }
}

// =============================================================================
// AuthHandle
// =============================================================================

/// One consumer's view of the signed-in user.
#[derive(Debug)]
pub struct AuthHandle<A> {
    app: Storefront<A>,
    triggered: Triggered,
}

impl<A> AuthHandle<A>
where
    A: AuthApi + CartApi + WishlistApi,
{
    pub(crate) const fn new(app: Storefront<A>) -> Self {
        Self {
            app,
            triggered: Triggered::new(),
        }
    }

    /// The signed-in user, looking it up with `GET /auth/me` if a token is
    /// held but the user is unknown (e.g. a restored session).
    ///
    /// At most one lookup runs app-wide. A failed lookup releases the guard
    /// and leaves the shopper as a guest; a rejected token is discarded.
    pub async fn ensure_user(&self) -> Option<User> {
        if !self.app.is_authenticated() {
            return None;
        }

        let auth = self.app.auth_store();
        if let Some(user) = auth.user() {
            return Some(user);
        }

        let epoch = self.app.epoch();
        if self.triggered.in_epoch(epoch) || !self.app.guards().current_user.try_begin() {
            return auth.user();
        }
        self.triggered.mark(epoch);

        auth.begin();
        match self.app.api().current_user().await {
            Ok(user) => {
                set_sentry_user(&user.id, Some(&user.email));
                auth.authenticated(user.clone());
                Some(user)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load current user");
                self.app.guards().current_user.release();
                if e.is_unauthorized() {
                    self.app.tokens().clear();
                }
                auth.failed(e.user_message());
                None
            }
        }
    }

    /// The user currently known to the auth state, without fetching.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.app.auth_store().user()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.app.is_authenticated()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::api::TokenStore;
    use crate::state::AuthStatus;
    use crate::storage::LocalStore;
    use crate::test_support::{FakeBackend, product};

    fn storefront(api: FakeBackend) -> Storefront<FakeBackend> {
        Storefront::new(api, TokenStore::new(), LocalStore::in_memory())
    }

    async fn signed_in(api: FakeBackend) -> Storefront<FakeBackend> {
        let app = storefront(api);
        app.login("shopper@example.com", &SecretString::from("pw".to_string()))
            .await
            .unwrap();
        app
    }

    #[tokio::test]
    async fn test_guest_never_fetches() {
        let app = storefront(FakeBackend::new());
        let handle = app.wishlist_handle();
        assert!(!handle.ensure_fetched().await);
        assert_eq!(app.api().calls_to("GET /wishlist"), 0);
    }

    #[tokio::test]
    async fn test_concurrent_handles_fetch_once() {
        let app = signed_in(FakeBackend::new()).await;
        let first = app.wishlist_handle();
        let second = app.wishlist_handle();

        let (a, b) = tokio::join!(first.ensure_fetched(), second.ensure_fetched());

        assert!(a ^ b);
        assert_eq!(app.api().calls_to("GET /wishlist"), 1);
        assert!(app.wishlist_store().has_fetched());
    }

    #[tokio::test]
    async fn test_repeat_calls_from_one_handle_fetch_once() {
        let api = FakeBackend::new();
        api.seed_wishlist(&[4]);
        let app = signed_in(api).await;
        let handle = app.wishlist_handle();

        assert!(handle.ensure_fetched().await);
        assert!(!handle.ensure_fetched().await);
        assert_eq!(handle.product_ids(), vec![ProductId::new(4)]);
        assert_eq!(app.api().calls_to("GET /wishlist"), 1);
    }

    #[tokio::test]
    async fn test_new_session_fetches_again_exactly_once() {
        let app = signed_in(FakeBackend::new()).await;
        let old = app.wishlist_handle();
        old.ensure_fetched().await;

        app.logout().await;
        app.login("shopper@example.com", &SecretString::from("pw".to_string()))
            .await
            .unwrap();

        let fresh = app.wishlist_handle();
        let (a, b) = tokio::join!(fresh.ensure_fetched(), old.ensure_fetched());

        assert!(a ^ b);
        assert_eq!(app.api().calls_to("GET /wishlist"), 2);
    }

    #[tokio::test]
    async fn test_merged_wishlist_counts_as_fetched() {
        let app = storefront(FakeBackend::new());
        app.wishlist_storage().add_item(product(3));
        app.login("shopper@example.com", &SecretString::from("pw".to_string()))
            .await
            .unwrap();

        assert!(!app.wishlist_handle().ensure_fetched().await);
        assert_eq!(app.api().calls_to("GET /wishlist"), 0);
        assert!(app.is_in_wishlist(ProductId::new(3)));
    }

    #[tokio::test]
    async fn test_toggle_flips_and_rolls_back() {
        let app = signed_in(FakeBackend::new()).await;
        let handle = app.wishlist_handle();

        assert!(handle.toggle(product(6)).await.unwrap());
        assert!(handle.contains(ProductId::new(6)));

        app.api().set(|b| &b.fail_wishlist_writes, true);
        assert!(handle.toggle(product(6)).await.is_err());
        assert!(handle.contains(ProductId::new(6)));
    }

    #[tokio::test]
    async fn test_guest_toggle_uses_local_storage() {
        let app = storefront(FakeBackend::new());
        let handle = app.wishlist_handle();

        assert!(handle.toggle(product(2)).await.unwrap());
        assert_eq!(app.wishlist_storage().count(), 1);
        assert!(!handle.toggle(product(2)).await.unwrap());
        assert_eq!(app.wishlist_storage().count(), 0);
    }

    #[tokio::test]
    async fn test_ensure_user_without_token() {
        let app = storefront(FakeBackend::new());
        assert!(app.auth_handle().ensure_user().await.is_none());
        assert_eq!(app.api().calls_to("GET /auth/me"), 0);
    }

    #[tokio::test]
    async fn test_restored_token_looks_up_user_once() {
        let app = storefront(FakeBackend::new());
        app.tokens().set(SecretString::from("restored".to_string()));
        let first = app.auth_handle();
        let second = app.auth_handle();

        let (a, b) = tokio::join!(first.ensure_user(), second.ensure_user());

        assert!(a.is_some() ^ b.is_some());
        assert_eq!(app.api().calls_to("GET /auth/me"), 1);
        assert!(first.ensure_user().await.is_some());
        assert_eq!(app.api().calls_to("GET /auth/me"), 1);
        assert_eq!(app.auth_store().status(), AuthStatus::Authenticated);
    }

    #[tokio::test]
    async fn test_failed_lookup_releases_guard() {
        let app = storefront(FakeBackend::failing(|b| &b.fail_me));
        app.tokens().set(SecretString::from("restored".to_string()));
        let handle = app.auth_handle();

        assert!(handle.ensure_user().await.is_none());
        assert!(!app.guards().current_user.is_set());
        assert_eq!(app.auth_store().status(), AuthStatus::Guest);

        // Another consumer may retry
        app.api().set(|b| &b.fail_me, false);
        assert!(app.auth_handle().ensure_user().await.is_some());
        assert_eq!(app.api().calls_to("GET /auth/me"), 2);
    }
}
