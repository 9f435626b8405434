//! Integration tests for the Cardshop storefront client.
//!
//! Each test drives a real [`Storefront`] (HTTP client plus file-backed
//! local storage) against a `wiremock` server standing in for the backend.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cardshop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `login_sync` - Guest data merge after login
//! - `token_refresh` - 401 handling and demotion to guest
//! - `fetch_guards` - One wishlist fetch per session across handles

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use cardshop_core::{ProductId, ProductSnapshot};
use cardshop_storefront::storage::{FileStore, LocalStore};
use cardshop_storefront::{ApiClient, ClientConfig, Storefront, TokenStore};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A storefront wired to a mock backend and a temporary storage directory.
pub struct TestContext {
    pub server: MockServer,
    pub storage: TempDir,
    pub app: Storefront,
}

impl TestContext {
    /// Start a mock server and build a storefront against it.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory or HTTP client cannot be created.
    #[allow(clippy::unwrap_used)]
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let storage = tempfile::tempdir().unwrap();
        let app = Self::storefront_for(&server, &storage);
        Self {
            server,
            storage,
            app,
        }
    }

    /// A second storefront sharing this context's storage directory, as a
    /// restarted process would.
    #[must_use]
    pub fn reopen(&self) -> Storefront {
        Self::storefront_for(&self.server, &self.storage)
    }

    #[allow(clippy::unwrap_used)]
    fn storefront_for(server: &MockServer, storage: &TempDir) -> Storefront {
        let mut config = ClientConfig::new(&server.uri()).unwrap();
        config.storage_dir = storage.path().to_path_buf();

        let tokens = TokenStore::new();
        let api = ApiClient::new(&config, tokens.clone()).unwrap();
        let local = LocalStore::with_fallback(Arc::new(FileStore::new(storage.path())));
        Storefront::new(api, tokens, local)
    }

    /// Mount a successful `POST /auth/login`.
    pub async fn mock_login(&self, token: &str) {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "accessToken": token,
                    "user": {"id": 7, "email": "shopper@example.com", "name": "Sam"}
                }
            })))
            .mount(&self.server)
            .await;
    }

    /// Log in with fixed test credentials.
    ///
    /// # Panics
    ///
    /// Panics if the login is rejected.
    #[allow(clippy::unwrap_used)]
    pub async fn login(&self) -> cardshop_storefront::LoginOutcome {
        self.app
            .login("shopper@example.com", &password())
            .await
            .unwrap()
    }

    /// JSON bodies of every request received on `endpoint`.
    ///
    /// # Panics
    ///
    /// Panics if request recording is disabled or a body is not JSON.
    #[allow(clippy::unwrap_used)]
    pub async fn bodies_sent_to(&self, endpoint: &str) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|request| request.url.path() == endpoint)
            .map(|request| serde_json::from_slice(&request.body).unwrap())
            .collect()
    }
}

#[must_use]
pub fn password() -> SecretString {
    SecretString::from("correct horse".to_string())
}

/// A $5.00 card.
#[must_use]
pub fn card(id: i64) -> ProductSnapshot {
    ProductSnapshot {
        product_id: ProductId::new(id),
        product_name: format!("Card {id}"),
        product_slug: format!("card-{id}"),
        product_image: None,
        price: Decimal::new(500, 2),
        stock: 25,
    }
}

/// Envelope for a server cart with one line per `(product_id, quantity)`.
#[must_use]
pub fn cart_body(lines: &[(i64, u32)]) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(id, quantity)| {
            json!({
                "id": id * 100,
                "productId": id,
                "productName": format!("Card {id}"),
                "productSlug": format!("card-{id}"),
                "price": "5.00",
                "stock": 25,
                "quantity": quantity
            })
        })
        .collect();
    let total: u32 = lines.iter().map(|(_, quantity)| quantity).sum();
    json!({"data": {"items": items, "totalItems": total}})
}

/// Envelope for a server wishlist containing `product_ids`.
#[must_use]
pub fn wishlist_body(product_ids: &[i64]) -> Value {
    let items: Vec<Value> = product_ids
        .iter()
        .map(|id| {
            json!({
                "id": id * 10,
                "productId": id,
                "productName": format!("Card {id}"),
                "price": "5.00",
                "addedAt": "2026-02-01T12:00:00Z"
            })
        })
        .collect();
    json!({"data": {"items": items}})
}
