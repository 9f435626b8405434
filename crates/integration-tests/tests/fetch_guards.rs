//! Integration tests for the one-fetch-per-session wishlist guard.

#![allow(clippy::unwrap_used)]

use cardshop_core::ProductId;
use cardshop_integration_tests::{TestContext, wishlist_body};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mock_wishlist(ctx: &TestContext, ids: &[i64]) {
    Mock::given(method("GET"))
        .and(path("/wishlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(wishlist_body(ids)))
        .mount(&ctx.server)
        .await;
}

async fn wishlist_fetches(ctx: &TestContext) -> usize {
    ctx.server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.method.as_str() == "GET" && request.url.path() == "/wishlist")
        .count()
}

#[tokio::test]
async fn test_many_consumers_one_request() {
    let ctx = TestContext::new().await;
    ctx.mock_login("token").await;
    mock_wishlist(&ctx, &[1, 2]).await;
    ctx.login().await;

    let handles: Vec<_> = (0..4).map(|_| ctx.app.wishlist_handle()).collect();
    let (a, b, c, d) = tokio::join!(
        handles[0].ensure_fetched(),
        handles[1].ensure_fetched(),
        handles[2].ensure_fetched(),
        handles[3].ensure_fetched(),
    );

    assert_eq!([a, b, c, d].iter().filter(|won| **won).count(), 1);
    assert_eq!(wishlist_fetches(&ctx).await, 1);
    for handle in &handles {
        assert_eq!(
            handle.product_ids(),
            vec![ProductId::new(1), ProductId::new(2)]
        );
    }
}

#[tokio::test]
async fn test_failed_fetch_is_not_retried_until_logout() {
    let ctx = TestContext::new().await;
    ctx.mock_login("token").await;
    Mock::given(method("GET"))
        .and(path("/wishlist"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&ctx.server)
        .await;
    mock_wishlist(&ctx, &[6]).await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&ctx.server)
        .await;

    ctx.login().await;
    let handle = ctx.app.wishlist_handle();
    assert!(handle.ensure_fetched().await);
    assert!(ctx.app.wishlist_store().state().error.is_some());
    assert!(!ctx.app.wishlist_handle().ensure_fetched().await);
    assert_eq!(wishlist_fetches(&ctx).await, 1);

    ctx.app.logout().await;
    ctx.login().await;

    assert!(handle.ensure_fetched().await);
    assert_eq!(wishlist_fetches(&ctx).await, 2);
    assert_eq!(handle.product_ids(), vec![ProductId::new(6)]);
}
