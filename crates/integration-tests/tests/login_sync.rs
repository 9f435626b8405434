//! Integration tests for merging guest data into the account at login.

#![allow(clippy::unwrap_used)]

use cardshop_core::ProductId;
use cardshop_integration_tests::{TestContext, card, cart_body, password, wishlist_body};
use cardshop_storefront::{CartSource, ClientError, StorageEvent, SyncOutcome};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

// =============================================================================
// Successful Merge
// =============================================================================

#[tokio::test]
async fn test_guest_cart_merged_and_cleared() {
    let ctx = TestContext::new().await;
    ctx.mock_login("token-1").await;
    Mock::given(method("POST"))
        .and(path("/cart/sync"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart_body(&[(42, 3)])))
        .expect(1)
        .mount(&ctx.server)
        .await;

    ctx.app.add_to_cart(card(42), 1).await.unwrap();
    ctx.app.add_to_cart(card(42), 2).await.unwrap();
    let mut events = ctx.app.events().subscribe();

    let outcome = ctx.login().await;

    assert_eq!(outcome.user.email, "shopper@example.com");
    assert!(matches!(outcome.sync.cart, SyncOutcome::Merged(_)));
    assert_eq!(outcome.sync.wishlist, SyncOutcome::Skipped);
    assert_eq!(events.try_recv().unwrap(), StorageEvent::CartChanged);
    assert!(events.try_recv().is_err());

    let sent = ctx.bodies_sent_to("/cart/sync").await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["items"][0]["productId"], json!(42));
    assert_eq!(sent[0]["items"][0]["quantity"], json!(3));

    // Nothing left for a later session to merge again
    assert!(ctx.reopen().cart_storage().get_cart().is_empty());

    let cart = ctx.app.cart().await.unwrap();
    assert_eq!(cart.source, CartSource::Server);
    assert_eq!(cart.item_count, 3);
    assert_eq!(cart.subtotal, "$15.00");
}

#[tokio::test]
async fn test_guest_wishlist_merged() {
    let ctx = TestContext::new().await;
    ctx.mock_login("token-1").await;
    Mock::given(method("POST"))
        .and(path("/wishlist/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wishlist_body(&[5, 9])))
        .expect(1)
        .mount(&ctx.server)
        .await;

    ctx.app.add_to_wishlist(card(9)).await.unwrap();
    let outcome = ctx.login().await;

    assert!(matches!(outcome.sync.wishlist, SyncOutcome::Merged(_)));
    assert_eq!(
        ctx.app.wishlist_ids(),
        vec![ProductId::new(5), ProductId::new(9)]
    );
    assert_eq!(ctx.app.wishlist_storage().count(), 0);

    let sent = ctx.bodies_sent_to("/wishlist/sync").await;
    assert_eq!(sent[0]["items"][0]["productId"], json!(9));
}

#[tokio::test]
async fn test_empty_guest_data_sends_no_sync() {
    let ctx = TestContext::new().await;
    ctx.mock_login("token-1").await;

    let outcome = ctx.login().await;

    assert_eq!(outcome.sync.cart, SyncOutcome::Skipped);
    assert_eq!(outcome.sync.wishlist, SyncOutcome::Skipped);
    assert!(ctx.bodies_sent_to("/cart/sync").await.is_empty());
    assert!(ctx.bodies_sent_to("/wishlist/sync").await.is_empty());
}

// =============================================================================
// Failed Merge
// =============================================================================

#[tokio::test]
async fn test_failed_merge_keeps_guest_data_and_login() {
    let ctx = TestContext::new().await;
    ctx.mock_login("token-1").await;
    Mock::given(method("POST"))
        .and(path("/cart/sync"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"message": "Try again later"})),
        )
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wishlist/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wishlist_body(&[3])))
        .mount(&ctx.server)
        .await;

    ctx.app.add_to_cart(card(1), 2).await.unwrap();
    ctx.app.add_to_wishlist(card(3)).await.unwrap();

    let outcome = ctx.login().await;

    assert!(outcome.sync.cart.is_failed());
    assert!(matches!(outcome.sync.wishlist, SyncOutcome::Merged(_)));
    assert!(ctx.app.is_authenticated());

    let kept = ctx.reopen().cart_storage().get_cart();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].quantity, 2);
    assert_eq!(ctx.app.wishlist_storage().count(), 0);
}

#[tokio::test]
async fn test_rejected_login_keeps_guest_session() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&ctx.server)
        .await;

    ctx.app.add_to_cart(card(1), 1).await.unwrap();
    let err = ctx
        .app
        .login("shopper@example.com", &password())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Api(_)));
    assert_eq!(err.user_message(), "Invalid credentials");
    assert!(!ctx.app.is_authenticated());
    assert_eq!(ctx.app.cart_storage().item_count(), 1);
}
