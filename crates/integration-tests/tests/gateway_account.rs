//! Login, registration and profile through the HTTP gateway.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::json;
use verdant_integration_tests::{MockApi, api_path};
use verdant_storefront::gateway::{
    GatewayError, ProfileImage, RegisterOutcome, RegistrationForm,
};
use verdant_storefront::storage::{KeyValueStore, MemoryStore, keys};

fn form(image: Option<ProfileImage>) -> RegistrationForm {
    RegistrationForm {
        name: "Sam Doe".to_string(),
        email: "sam@example.com".to_string(),
        password: SecretString::from("hunter22".to_string()),
        address: "1 Main St".to_string(),
        phone: "555-0100".to_string(),
        profile_image: image,
    }
}

#[tokio::test]
async fn test_login_stores_token_and_authenticates_later_calls() {
    let api = MockApi::start().await;
    api.respond("POST", &api_path("/login"), 200, json!({"data": {"token": "tok-1"}}));
    api.respond(
        "GET",
        &api_path("/profile"),
        200,
        json!({"data": {"name": "Sam", "email": "sam@example.com"}}),
    );
    let (storefront, store) = api.storefront();

    assert!(
        storefront
            .gateway()
            .login("sam@example.com", "hunter22")
            .await
            .unwrap()
    );
    assert_eq!(store.get(keys::TOKEN).unwrap().as_deref(), Some("\"tok-1\""));

    let login = &api.requests_to(&api_path("/login"))[0];
    assert_eq!(
        login.json(),
        json!({"email": "sam@example.com", "password": "hunter22"})
    );

    let profile = storefront.gateway().profile().await.unwrap();
    assert_eq!(profile.name.as_deref(), Some("Sam"));

    let request = &api.requests_to(&api_path("/profile"))[0];
    assert_eq!(request.header("authorization").as_deref(), Some("Bearer tok-1"));
    assert!(request.header("cookie").unwrap().contains("token=tok-1"));
}

#[tokio::test]
async fn test_rejected_login_surfaces_api_message() {
    let api = MockApi::start().await;
    api.respond(
        "POST",
        &api_path("/login"),
        401,
        json!({"error": "Invalid email or password"}),
    );
    let (storefront, _store) = api.storefront();

    let err = storefront
        .gateway()
        .login("sam@example.com", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.user_message(), "Invalid email or password");
    assert!(!storefront.credentials().is_authenticated());
}

#[tokio::test]
async fn test_profile_401_signs_out() {
    let api = MockApi::start().await;
    api.respond("GET", &api_path("/profile"), 401, json!({"message": "jwt expired"}));
    let store = Arc::new(MemoryStore::new());
    store.set(keys::TOKEN, "stale").unwrap();
    let storefront = api.storefront_with(store.clone());

    let err = storefront.gateway().profile().await.unwrap_err();
    assert!(matches!(err, GatewayError::SessionExpired));
    assert!(!storefront.credentials().is_authenticated());
    assert_eq!(store.get(keys::TOKEN).unwrap(), None);
}

#[tokio::test]
async fn test_profile_signed_out_sends_nothing() {
    let api = MockApi::start().await;
    let (storefront, _store) = api.storefront();

    let err = storefront.gateway().profile().await.unwrap_err();
    assert!(matches!(err, GatewayError::NotAuthenticated));
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_register_multipart_with_image() {
    let api = MockApi::start().await;
    api.respond(
        "POST",
        &api_path("/register"),
        201,
        json!({"message": "User registered", "token": "tok-new"}),
    );
    let (storefront, _store) = api.storefront();

    let image = ProfileImage {
        file_name: "me.png".to_string(),
        bytes: vec![0x89, 0x50, 0x4e, 0x47],
    };
    let outcome = storefront.gateway().register(form(Some(image))).await.unwrap();
    assert_eq!(outcome, RegisterOutcome::SignedIn);
    assert!(storefront.credentials().is_authenticated());

    let request = &api.requests_to(&api_path("/register"))[0];
    assert!(
        request
            .header("content-type")
            .unwrap()
            .starts_with("multipart/form-data")
    );
    let body = request.text();
    for field in ["name", "email", "password", "address", "phone"] {
        assert!(body.contains(&format!("name=\"{field}\"")), "missing {field}");
    }
    assert!(body.contains("name=\"profileImage\"; filename=\"me.png\""));
}

#[tokio::test]
async fn test_register_without_token_requires_login() {
    let api = MockApi::start().await;
    api.respond("POST", &api_path("/register"), 200, json!({"success": true}));
    let (storefront, _store) = api.storefront();

    let outcome = storefront.gateway().register(form(None)).await.unwrap();
    assert_eq!(outcome, RegisterOutcome::Registered);
    assert!(!storefront.credentials().is_authenticated());
    assert!(!api.requests()[0].text().contains("profileImage"));
}

#[tokio::test]
async fn test_register_rejects_bad_email_locally() {
    let api = MockApi::start().await;
    let (storefront, _store) = api.storefront();

    let mut bad = form(None);
    bad.email = "sam-at-example".to_string();
    assert!(matches!(
        storefront.gateway().register(bad).await,
        Err(GatewayError::InvalidInput(_))
    ));
    assert!(api.requests().is_empty());
}

#[tokio::test]
async fn test_logout_stops_sending_bearer() {
    let api = MockApi::start().await;
    api.respond("GET", &api_path("/get-all-categories"), 200, json!([]));
    let (storefront, store) = api.storefront();
    storefront.credentials().set("tok-2");

    storefront.gateway().logout();
    storefront.gateway().list_categories().await.unwrap();

    assert!(api.requests()[0].header("authorization").is_none());
    assert_eq!(store.get(keys::TOKEN).unwrap(), None);
}
