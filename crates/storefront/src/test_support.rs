//! In-memory backend used by unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use cardshop_core::{
    Email, LocalCartItem, LocalWishlistItem, ProductId, ProductSnapshot, UserId,
};
use rust_decimal::Decimal;
use secrecy::SecretString;

use crate::api::{
    ApiError, AuthApi, CartApi, LoginResponse, RemoteCart, RemoteCartItem, RemoteWishlist,
    RemoteWishlistItem, User, WishlistApi,
};

/// Fake backend that records calls and can be told to fail per endpoint group.
#[derive(Default)]
pub struct FakeBackend {
    pub fail_login: AtomicBool,
    pub fail_me: AtomicBool,
    pub fail_cart_sync: AtomicBool,
    pub fail_wishlist_sync: AtomicBool,
    pub fail_cart_writes: AtomicBool,
    pub fail_wishlist_writes: AtomicBool,
    calls: Mutex<Vec<&'static str>>,
    cart: Mutex<Vec<(ProductId, u32)>>,
    wishlist: Mutex<Vec<ProductId>>,
    sent_cart: Mutex<Vec<LocalCartItem>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(flag: impl Fn(&Self) -> &AtomicBool) -> Self {
        let backend = Self::default();
        flag(&backend).store(true, Ordering::SeqCst);
        backend
    }

    pub fn set(&self, flag: impl Fn(&Self) -> &AtomicBool, value: bool) {
        flag(self).store(value, Ordering::SeqCst);
    }

    pub fn calls_to(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == endpoint)
            .count()
    }

    pub fn seed_wishlist(&self, ids: &[i64]) {
        *self.wishlist.lock().unwrap() = ids.iter().copied().map(ProductId::new).collect();
    }

    pub fn sent_cart(&self) -> Vec<LocalCartItem> {
        self.sent_cart.lock().unwrap().clone()
    }

    fn record(&self, endpoint: &'static str) {
        self.calls.lock().unwrap().push(endpoint);
    }

    fn check(flag: &AtomicBool) -> Result<(), ApiError> {
        if flag.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 500,
                message: "backend unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn cart_snapshot(&self) -> RemoteCart {
        let items = self
            .cart
            .lock()
            .unwrap()
            .iter()
            .map(|(id, quantity)| RemoteCartItem {
                id: None,
                product_id: *id,
                product_name: format!("Card {id}"),
                product_slug: format!("card-{id}"),
                product_image: None,
                price: Decimal::new(500, 2),
                stock: 10,
                quantity: *quantity,
            })
            .collect();
        RemoteCart {
            items,
            total_items: None,
            total_price: None,
        }
    }

    fn wishlist_snapshot(&self) -> RemoteWishlist {
        let items = self
            .wishlist
            .lock()
            .unwrap()
            .iter()
            .map(|id| RemoteWishlistItem {
                id: None,
                product_id: *id,
                product_name: format!("Card {id}"),
                product_slug: format!("card-{id}"),
                product_image: None,
                price: Decimal::new(500, 2),
                stock: 10,
                added_at: None,
            })
            .collect();
        RemoteWishlist { items }
    }
}

impl AuthApi for FakeBackend {
    async fn login(
        &self,
        email: &Email,
        _password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        self.record("POST /auth/login");
        if self.fail_login.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 401,
                message: "Invalid credentials".to_string(),
            });
        }
        Ok(LoginResponse {
            access_token: "access-token".to_string(),
            user: shopper(email.as_str()),
        })
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.record("GET /auth/me");
        tokio::task::yield_now().await;
        Self::check(&self.fail_me)?;
        Ok(shopper("shopper@example.com"))
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.record("POST /auth/logout");
        Ok(())
    }
}

impl CartApi for FakeBackend {
    async fn get_cart(&self) -> Result<RemoteCart, ApiError> {
        self.record("GET /cart");
        Ok(self.cart_snapshot())
    }

    async fn add_to_cart(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<RemoteCart, ApiError> {
        self.record("POST /cart/add");
        Self::check(&self.fail_cart_writes)?;
        {
            let mut cart = self.cart.lock().unwrap();
            match cart.iter_mut().find(|(id, _)| *id == product_id) {
                Some((_, qty)) => *qty += quantity,
                None => cart.push((product_id, quantity)),
            }
        }
        Ok(self.cart_snapshot())
    }

    async fn update_cart_item(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<RemoteCart, ApiError> {
        self.record("PUT /cart/items");
        Self::check(&self.fail_cart_writes)?;
        {
            let mut cart = self.cart.lock().unwrap();
            if let Some((_, qty)) = cart.iter_mut().find(|(id, _)| *id == product_id) {
                *qty = quantity;
            }
        }
        Ok(self.cart_snapshot())
    }

    async fn remove_cart_item(&self, product_id: ProductId) -> Result<RemoteCart, ApiError> {
        self.record("DELETE /cart/items");
        Self::check(&self.fail_cart_writes)?;
        self.cart.lock().unwrap().retain(|(id, _)| *id != product_id);
        Ok(self.cart_snapshot())
    }

    async fn clear_cart(&self) -> Result<(), ApiError> {
        self.record("DELETE /cart");
        Self::check(&self.fail_cart_writes)?;
        self.cart.lock().unwrap().clear();
        Ok(())
    }

    async fn sync_cart(&self, items: &[LocalCartItem]) -> Result<RemoteCart, ApiError> {
        self.record("POST /cart/sync");
        tokio::task::yield_now().await;
        Self::check(&self.fail_cart_sync)?;
        *self.sent_cart.lock().unwrap() = items.to_vec();
        {
            let mut cart = self.cart.lock().unwrap();
            for item in items {
                match cart.iter_mut().find(|(id, _)| *id == item.product_id) {
                    Some((_, qty)) => *qty += item.quantity,
                    None => cart.push((item.product_id, item.quantity)),
                }
            }
        }
        Ok(self.cart_snapshot())
    }
}

impl WishlistApi for FakeBackend {
    async fn get_wishlist(&self) -> Result<RemoteWishlist, ApiError> {
        self.record("GET /wishlist");
        tokio::task::yield_now().await;
        Ok(self.wishlist_snapshot())
    }

    async fn add_to_wishlist(&self, product_id: ProductId) -> Result<RemoteWishlist, ApiError> {
        self.record("POST /wishlist/add");
        tokio::task::yield_now().await;
        Self::check(&self.fail_wishlist_writes)?;
        {
            let mut wishlist = self.wishlist.lock().unwrap();
            if !wishlist.contains(&product_id) {
                wishlist.push(product_id);
            }
        }
        Ok(self.wishlist_snapshot())
    }

    async fn remove_from_wishlist(
        &self,
        product_id: ProductId,
    ) -> Result<RemoteWishlist, ApiError> {
        self.record("DELETE /wishlist/items");
        tokio::task::yield_now().await;
        Self::check(&self.fail_wishlist_writes)?;
        self.wishlist.lock().unwrap().retain(|id| *id != product_id);
        Ok(self.wishlist_snapshot())
    }

    async fn sync_wishlist(&self, items: &[LocalWishlistItem]) -> Result<RemoteWishlist, ApiError> {
        self.record("POST /wishlist/sync");
        tokio::task::yield_now().await;
        Self::check(&self.fail_wishlist_sync)?;
        {
            let mut wishlist = self.wishlist.lock().unwrap();
            for item in items {
                if !wishlist.contains(&item.product_id) {
                    wishlist.push(item.product_id);
                }
            }
        }
        Ok(self.wishlist_snapshot())
    }
}

pub fn shopper(email: &str) -> User {
    User {
        id: UserId::new(1),
        email: email.to_string(),
        name: Some("Test Shopper".to_string()),
        role: Some("customer".to_string()),
    }
}

pub fn product(id: i64) -> ProductSnapshot {
    ProductSnapshot {
        product_id: ProductId::new(id),
        product_name: format!("Card {id}"),
        product_slug: format!("card-{id}"),
        product_image: None,
        price: Decimal::new(500, 2),
        stock: 10,
    }
}
