//! REST client for the storefront backend.
//!
//! # Architecture
//!
//! - [`ApiClient`] wraps a `reqwest` client with a cookie store (the refresh
//!   token lives in an HTTP-only cookie) and the shared [`TokenStore`]
//! - Every body is a JSON [`Envelope`]; non-2xx responses become
//!   [`ApiError::Status`] carrying the envelope message
//! - A 401 outside `/auth/*` triggers exactly one refresh attempt. Concurrent
//!   401s share the same refresh. If refresh fails the token is cleared and the
//!   request is retried once as a guest
//! - [`AuthApi`], [`CartApi`] and [`WishlistApi`] are the seams the sync
//!   reconciler and state containers depend on, so tests can swap in fakes

mod auth;
mod cart;
mod token;
pub mod types;
mod wishlist;

pub use token::TokenStore;
pub use types::*;

use std::future::Future;
use std::sync::Arc;

use cardshop_core::{Email, LocalCartItem, LocalWishlistItem, ProductId};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use types::{ErrorEnvelope, RefreshResponse};

/// Errors that can occur when calling the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// JSON encoding or decoding failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status of an API error response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the API rejected the request as unauthenticated.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401))
    }

    /// Message suitable for showing next to the affected control.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } if !message.is_empty() => message.clone(),
            Self::Status { status, .. } => format!("Request failed ({status})"),
            Self::Http(_) => "Network error, please try again".to_string(),
            Self::Parse(_) => "Unexpected response from server".to_string(),
        }
    }
}

// =============================================================================
// Seams
// =============================================================================

/// Authentication endpoints.
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`.
    fn login(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> impl Future<Output = Result<LoginResponse, ApiError>> + Send;

    /// `GET /auth/me`.
    fn current_user(&self) -> impl Future<Output = Result<User, ApiError>> + Send;

    /// `POST /auth/logout`.
    fn logout(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// Server-side cart endpoints, addressed by product.
pub trait CartApi: Send + Sync {
    /// `GET /cart`.
    fn get_cart(&self) -> impl Future<Output = Result<RemoteCart, ApiError>> + Send;

    /// `POST /cart/add`.
    fn add_to_cart(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<RemoteCart, ApiError>> + Send;

    /// `PUT /cart/items/{productId}`.
    fn update_cart_item(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<RemoteCart, ApiError>> + Send;

    /// `DELETE /cart/items/{productId}`.
    fn remove_cart_item(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<RemoteCart, ApiError>> + Send;

    /// `DELETE /cart`.
    fn clear_cart(&self) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `POST /cart/sync` - merge guest lines into the server cart.
    fn sync_cart(
        &self,
        items: &[LocalCartItem],
    ) -> impl Future<Output = Result<RemoteCart, ApiError>> + Send;
}

/// Server-side wishlist endpoints, addressed by product.
pub trait WishlistApi: Send + Sync {
    /// `GET /wishlist`.
    fn get_wishlist(&self) -> impl Future<Output = Result<RemoteWishlist, ApiError>> + Send;

    /// `POST /wishlist/add`.
    fn add_to_wishlist(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<RemoteWishlist, ApiError>> + Send;

    /// `DELETE /wishlist/items/{productId}`.
    fn remove_from_wishlist(
        &self,
        product_id: ProductId,
    ) -> impl Future<Output = Result<RemoteWishlist, ApiError>> + Send;

    /// `POST /wishlist/sync` - merge guest entries into the server wishlist.
    fn sync_wishlist(
        &self,
        items: &[LocalWishlistItem],
    ) -> impl Future<Output = Result<RemoteWishlist, ApiError>> + Send;
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    config: ClientConfig,
    tokens: TokenStore,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl ApiClient {
    /// Create a new API client sharing `tokens` with the session.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig, tokens: TokenStore) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                config: config.clone(),
                tokens,
                refresh_lock: tokio::sync::Mutex::new(()),
            }),
        })
    }

    /// Token store used for bearer authentication.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    /// Send a request and decode the envelope `data`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let response = self.send(method, path, body).await?;
        let response_text = response.text().await?;

        let envelope: Envelope<T> = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                path,
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })?;

        Ok(envelope.data)
    }

    /// Send a request whose response body is ignored.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<(), ApiError> {
        self.send(method, path, body).await.map(|_| ())
    }

    /// Send with bearer auth, refreshing once on 401.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let token = self.inner.tokens.get();
        let response = self
            .send_once(method.clone(), path, body.as_ref(), token.as_ref())
            .await?;

        let response = if response.status() == StatusCode::UNAUTHORIZED && !is_auth_path(path) {
            debug!(path, "Unauthorized response, attempting token refresh");
            let retry_token = self.refresh_after_unauthorized(token.as_ref()).await;
            self.send_once(method, path, body.as_ref(), retry_token.as_ref())
                .await?
        } else {
            response
        };

        ensure_success(response).await
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        token: Option<&SecretString>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self
            .inner
            .client
            .request(method, self.inner.config.endpoint(path));

        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Obtain the token to retry with after a 401.
    ///
    /// Returns `None` when the session has been demoted to guest.
    async fn refresh_after_unauthorized(
        &self,
        used: Option<&SecretString>,
    ) -> Option<SecretString> {
        let _guard = self.inner.refresh_lock.lock().await;

        // Another request already refreshed (or cleared) the token
        if !self.inner.tokens.matches(used) {
            return self.inner.tokens.get();
        }

        match self.refresh().await {
            Ok(token) => {
                debug!("Access token refreshed");
                self.inner.tokens.set(token.clone());
                Some(token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, continuing as guest");
                self.inner.tokens.clear();
                None
            }
        }
    }

    /// `POST /auth/refresh` using the refresh cookie.
    async fn refresh(&self) -> Result<SecretString, ApiError> {
        let response = self
            .send_once(Method::POST, "/auth/refresh", None, None)
            .await?;
        let response = ensure_success(response).await?;
        let envelope: Envelope<RefreshResponse> = serde_json::from_str(&response.text().await?)?;
        Ok(SecretString::from(envelope.data.access_token))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.api_base_url.as_str())
            .field("tokens", &self.inner.tokens)
            .finish_non_exhaustive()
    }
}

fn is_auth_path(path: &str) -> bool {
    path.starts_with("/auth/")
}

/// Map a non-success response to [`ApiError::Status`].
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .and_then(|envelope| envelope.message)
        .unwrap_or_else(|| body.chars().take(200).collect());

    debug!(status = %status, message = %message, "API returned non-success status");
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}
