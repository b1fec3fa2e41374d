//! Order placement end to end: cart, gateway and orchestrator together.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use verdant_core::{OrderId, OrderStatus, Price, ProductId};
use verdant_integration_tests::{MockApi, api_path};
use verdant_storefront::checkout::{BillingDetails, CheckoutError, TerminalAction};
use verdant_storefront::collections::LineItem;
use verdant_storefront::storage::{KeyValueStore, keys};

fn billing() -> BillingDetails {
    BillingDetails {
        name: "Sam Doe".to_string(),
        address: " 1 Main St ".to_string(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        zip: "62701".to_string(),
        country: "USA".to_string(),
        ..BillingDetails::default()
    }
}

fn fill_cart(storefront: &verdant_storefront::Storefront) {
    storefront
        .cart()
        .add(LineItem::new("p1", "Sencha", Price::from_cents(1250), 2, ""));
    storefront
        .cart()
        .add(LineItem::new("p2", "Kettle", Price::from_cents(4000), 1, ""));
}

#[tokio::test]
async fn test_successful_order_redirects_and_clears_cart() {
    let api = MockApi::start().await;
    api.respond(
        "POST",
        &api_path("/user/create-order"),
        201,
        json!({"success": true, "newOrder": {"_id": "o1"}}),
    );
    api.respond(
        "POST",
        &api_path("/user/create-checkout-session"),
        200,
        json!({"session": {"url": "https://pay.example/x"}}),
    );
    let (storefront, store) = api.storefront();
    storefront.credentials().set("tok");
    fill_cart(&storefront);

    let outcome = storefront.place_order(&billing()).await.unwrap();

    assert_eq!(outcome.order_id, OrderId::new("o1"));
    assert_eq!(
        outcome.action,
        TerminalAction::Redirect("https://pay.example/x".to_string())
    );
    assert!(storefront.cart().is_empty());
    assert_eq!(store.get(keys::CART).unwrap().as_deref(), Some("[]"));
    assert_eq!(storefront.orders().status(), OrderStatus::Idle);

    let requests = api.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, api_path("/user/create-order"));
    assert_eq!(
        requests[0].json(),
        json!({
            "products": [
                {"product": "p1", "quantity": 2},
                {"product": "p2", "quantity": 1}
            ],
            "address": "1 Main St, Springfield IL 62701, USA"
        })
    );
    assert_eq!(requests[0].header("authorization").as_deref(), Some("Bearer tok"));
    assert_eq!(requests[1].path, api_path("/user/create-checkout-session"));
    assert_eq!(requests[1].json(), json!({"orderId": "o1"}));
}

#[tokio::test]
async fn test_missing_session_url_navigates_home() {
    let api = MockApi::start().await;
    api.respond("POST", &api_path("/user/create-order"), 200, json!({"data": {"id": "o2"}}));
    api.respond(
        "POST",
        &api_path("/user/create-checkout-session"),
        200,
        json!({"success": true}),
    );
    let (storefront, _store) = api.storefront();
    fill_cart(&storefront);

    let outcome = storefront.place_order(&billing()).await.unwrap();
    assert_eq!(outcome.action, TerminalAction::NavigateHome);
    assert!(storefront.cart().is_empty());
}

#[tokio::test]
async fn test_validation_failure_sends_nothing() {
    let api = MockApi::start().await;
    let (storefront, _store) = api.storefront();

    assert!(matches!(
        storefront.place_order(&billing()).await,
        Err(CheckoutError::ValidationFailed(_))
    ));

    fill_cart(&storefront);
    let no_name = BillingDetails {
        name: String::new(),
        ..billing()
    };
    assert!(matches!(
        storefront.place_order(&no_name).await,
        Err(CheckoutError::ValidationFailed(_))
    ));
    assert!(api.requests().is_empty());
    assert_eq!(storefront.orders().status(), OrderStatus::Idle);
}

#[tokio::test]
async fn test_ambiguous_order_response_keeps_cart() {
    let api = MockApi::start().await;
    api.respond(
        "POST",
        &api_path("/user/create-order"),
        200,
        json!({"success": true, "order": {"ref": "A-7"}}),
    );
    let (storefront, _store) = api.storefront();
    fill_cart(&storefront);

    let err = storefront.place_order(&billing()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::OrderIdMissing));
    assert_eq!(storefront.orders().status(), OrderStatus::Failed);
    assert_eq!(storefront.cart().len(), 2);
    assert!(
        api.requests_to(&api_path("/user/create-checkout-session"))
            .is_empty()
    );
}

#[tokio::test]
async fn test_order_rejected_by_api() {
    let api = MockApi::start().await;
    api.respond(
        "POST",
        &api_path("/user/create-order"),
        400,
        json!({"message": "Product p2 is out of stock"}),
    );
    let (storefront, _store) = api.storefront();
    fill_cart(&storefront);

    let err = storefront.place_order(&billing()).await.unwrap_err();
    assert_eq!(err.user_message(), "Product p2 is out of stock");
    let state = storefront.orders().snapshot();
    assert_eq!(state.status, OrderStatus::Failed);
    assert_eq!(state.error.as_deref(), Some("Product p2 is out of stock"));
    assert!(state.last_order_id.is_none());
    assert_eq!(storefront.cart().len(), 2);
}

#[tokio::test]
async fn test_session_failure_then_resume_payment() {
    let api = MockApi::start().await;
    api.respond(
        "POST",
        &api_path("/user/create-order"),
        201,
        json!({"orderId": "o9"}),
    );
    api.respond(
        "POST",
        &api_path("/user/create-checkout-session"),
        502,
        json!({"message": "Payment provider unavailable"}),
    );
    let (storefront, _store) = api.storefront();
    fill_cart(&storefront);

    let err = storefront.place_order(&billing()).await.unwrap_err();
    assert_eq!(err.user_message(), "Payment provider unavailable");
    assert_eq!(storefront.orders().status(), OrderStatus::Failed);
    assert_eq!(storefront.orders().last_order_id(), Some(OrderId::new("o9")));
    assert_eq!(storefront.cart().len(), 2);

    api.respond(
        "POST",
        &api_path("/user/create-checkout-session"),
        200,
        json!({"data": {"checkout": {"url": "https://pay.example/o9"}}}),
    );
    let outcome = storefront.orders().resume_payment().await.unwrap();

    assert_eq!(outcome.order_id, OrderId::new("o9"));
    assert_eq!(
        outcome.action,
        TerminalAction::Redirect("https://pay.example/o9".to_string())
    );
    assert!(storefront.cart().is_empty());
    assert_eq!(api.requests_to(&api_path("/user/create-order")).len(), 1);
    assert_eq!(
        api.requests_to(&api_path("/user/create-checkout-session")).len(),
        2
    );
}

#[tokio::test]
async fn test_add_to_cart_fetches_product() {
    let api = MockApi::start().await;
    api.respond(
        "GET",
        &api_path("/get-product/p1"),
        200,
        json!({"data": {"_id": "p1", "name": "Sencha", "price": "12.50", "image": "/uploads/s.png"}}),
    );
    let (storefront, _store) = api.storefront();

    let line = storefront
        .add_to_cart(&ProductId::new("p1"), 2)
        .await
        .unwrap();
    assert_eq!(line.quantity, 2);
    storefront
        .add_to_cart(&ProductId::new("p1"), 1)
        .await
        .unwrap();

    assert_eq!(storefront.cart().quantity_of(&ProductId::new("p1")), Some(3));
    assert_eq!(storefront.cart().total(), Price::from_cents(3750));
    assert_eq!(api.requests().len(), 1);
}
