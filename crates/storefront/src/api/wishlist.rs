//! Server-side wishlist endpoints.

use cardshop_core::{LocalWishlistItem, ProductId};
use reqwest::Method;
use tracing::instrument;

use super::types::{AddToWishlistRequest, RemoteWishlist, WishlistSyncRequest};
use super::{ApiClient, ApiError, WishlistApi};

impl WishlistApi for ApiClient {
    #[instrument(skip(self))]
    async fn get_wishlist(&self) -> Result<RemoteWishlist, ApiError> {
        self.fetch(Method::GET, "/wishlist", None).await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn add_to_wishlist(&self, product_id: ProductId) -> Result<RemoteWishlist, ApiError> {
        let body = serde_json::to_value(AddToWishlistRequest { product_id })?;
        self.fetch(Method::POST, "/wishlist/add", Some(body)).await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn remove_from_wishlist(
        &self,
        product_id: ProductId,
    ) -> Result<RemoteWishlist, ApiError> {
        self.fetch(Method::DELETE, &format!("/wishlist/items/{product_id}"), None)
            .await
    }

    #[instrument(skip(self, items), fields(items = items.len()))]
    async fn sync_wishlist(&self, items: &[LocalWishlistItem]) -> Result<RemoteWishlist, ApiError> {
        let body = serde_json::to_value(WishlistSyncRequest { items })?;
        self.fetch(Method::POST, "/wishlist/sync", Some(body)).await
    }
}
