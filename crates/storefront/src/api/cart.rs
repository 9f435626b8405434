//! Server-side cart endpoints.

use cardshop_core::{LocalCartItem, ProductId};
use reqwest::Method;
use tracing::instrument;

use super::types::{AddToCartRequest, CartSyncRequest, RemoteCart, UpdateQuantityRequest};
use super::{ApiClient, ApiError, CartApi};

impl CartApi for ApiClient {
    #[instrument(skip(self))]
    async fn get_cart(&self) -> Result<RemoteCart, ApiError> {
        self.fetch(Method::GET, "/cart", None).await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn add_to_cart(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<RemoteCart, ApiError> {
        let body = serde_json::to_value(AddToCartRequest {
            product_id,
            quantity,
        })?;
        self.fetch(Method::POST, "/cart/add", Some(body)).await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn update_cart_item(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<RemoteCart, ApiError> {
        let body = serde_json::to_value(UpdateQuantityRequest { quantity })?;
        self.fetch(Method::PUT, &format!("/cart/items/{product_id}"), Some(body))
            .await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn remove_cart_item(&self, product_id: ProductId) -> Result<RemoteCart, ApiError> {
        self.fetch(Method::DELETE, &format!("/cart/items/{product_id}"), None)
            .await
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<(), ApiError> {
        self.execute(Method::DELETE, "/cart", None).await
    }

    #[instrument(skip(self, items), fields(items = items.len()))]
    async fn sync_cart(&self, items: &[LocalCartItem]) -> Result<RemoteCart, ApiError> {
        let body = serde_json::to_value(CartSyncRequest { items })?;
        self.fetch(Method::POST, "/cart/sync", Some(body)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::TokenStore;
    use crate::config::ClientConfig;

    fn client_for(server: &MockServer) -> ApiClient {
        let config = ClientConfig::new(&server.uri()).unwrap();
        ApiClient::new(&config, TokenStore::new()).unwrap()
    }

    fn one_line_cart(quantity: u32) -> serde_json::Value {
        json!({
            "data": {
                "items": [{
                    "id": 10,
                    "productId": 42,
                    "productName": "Thank You Card",
                    "productSlug": "thank-you-card",
                    "productImage": null,
                    "price": "3.25",
                    "stock": 50,
                    "quantity": quantity
                }],
                "totalItems": quantity,
                "totalPrice": "9.75"
            },
            "message": "Cart updated"
        })
    }

    #[tokio::test]
    async fn test_add_to_cart_sends_product_and_quantity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cart/add"))
            .and(body_json(json!({"productId": 42, "quantity": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(one_line_cart(3)))
            .expect(1)
            .mount(&server)
            .await;

        let cart = client_for(&server)
            .add_to_cart(ProductId::new(42), 3)
            .await
            .unwrap();
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.items[0].product_slug, "thank-you-card");
    }

    #[tokio::test]
    async fn test_update_and_remove_address_lines_by_product() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/cart/items/42"))
            .and(body_json(json!({"quantity": 5})))
            .respond_with(ResponseTemplate::new(200).set_body_json(one_line_cart(5)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/cart/items/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"items": []}})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let cart = client.update_cart_item(ProductId::new(42), 5).await.unwrap();
        assert_eq!(cart.items[0].quantity, 5);

        let cart = client.remove_cart_item(ProductId::new(42)).await.unwrap();
        assert!(cart.items.is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[tokio::test]
    async fn test_clear_cart_ignores_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/cart"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).clear_cart().await.unwrap();
    }
}
