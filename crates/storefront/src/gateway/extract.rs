//! Ordered extraction rules for loosely-contracted response fields.
//!
//! The remote API is unversioned and places the same logical field in
//! several locations depending on the endpoint revision. Each rule list is
//! applied first-match-wins; a rule matches when its path resolves to a
//! non-empty string (or a number, rendered as a string).

use serde_json::Value;
use verdant_core::OrderId;

/// A JSON path as a sequence of object keys. The empty path is the value itself.
pub type JsonPath = &'static [&'static str];

/// Where `CreateOrder` responses put the new order's id.
pub const ORDER_ID_PATHS: &[JsonPath] = &[
    &["newOrder", "_id"],
    &["id"],
    &["orderId"],
    &["data", "_id"],
    &["data", "id"],
    &["data", "order", "_id"],
];

/// Where `CreateCheckoutSession` responses put the payment page URL.
pub const SESSION_URL_PATHS: &[JsonPath] = &[
    &["url"],
    &["data", "url"],
    &["session", "url"],
    &["checkout", "url"],
    &["data", "session", "url"],
    &["data", "checkout", "url"],
];

/// Where login/registration responses put the bearer token.
pub const TOKEN_PATHS: &[JsonPath] = &[&["token"], &["data", "token"]];

/// Resolve `path` inside `value`.
#[must_use]
pub fn at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// First non-empty string found along `paths`.
#[must_use]
pub fn first_string(value: &Value, paths: &[JsonPath]) -> Option<String> {
    paths
        .iter()
        .find_map(|path| at(value, path).and_then(scalar_string))
}

/// Non-empty string form of a string or number value.
#[must_use]
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Order id from a `CreateOrder` response body.
#[must_use]
pub fn order_id(body: &Value) -> Option<OrderId> {
    first_string(body, ORDER_ID_PATHS).map(OrderId::from)
}

/// Redirect URL from a `CreateCheckoutSession` response body.
#[must_use]
pub fn session_url(body: &Value) -> Option<String> {
    first_string(body, SESSION_URL_PATHS)
}

/// Bearer token from a login/registration response body.
#[must_use]
pub fn token(body: &Value) -> Option<String> {
    first_string(body, TOKEN_PATHS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_id_each_location() {
        let bodies = [
            json!({"newOrder": {"_id": "o1"}}),
            json!({"id": "o1"}),
            json!({"orderId": "o1"}),
            json!({"data": {"_id": "o1"}}),
            json!({"data": {"id": "o1"}}),
            json!({"data": {"order": {"_id": "o1"}}}),
        ];
        for body in bodies {
            assert_eq!(order_id(&body), Some(OrderId::new("o1")), "body: {body}");
        }
    }

    #[test]
    fn test_order_id_priority() {
        let body = json!({
            "id": "second",
            "newOrder": {"_id": "first"},
            "data": {"_id": "fourth"}
        });
        assert_eq!(order_id(&body), Some(OrderId::new("first")));
    }

    #[test]
    fn test_order_id_skips_empty_and_accepts_numbers() {
        assert_eq!(
            order_id(&json!({"newOrder": {"_id": ""}, "orderId": 42})),
            Some(OrderId::new("42"))
        );
    }

    #[test]
    fn test_order_id_missing() {
        assert_eq!(order_id(&json!({"success": true, "_id": "top"})), None);
        assert_eq!(order_id(&json!(null)), None);
        assert_eq!(order_id(&json!([{"id": "o1"}])), None);
    }

    #[test]
    fn test_session_url_priority() {
        assert_eq!(
            session_url(&json!({"session": {"url": "https://pay/x"}})).as_deref(),
            Some("https://pay/x")
        );
        assert_eq!(
            session_url(&json!({
                "data": {"checkout": {"url": "https://late"}},
                "checkout": {"url": "https://early"}
            }))
            .as_deref(),
            Some("https://early")
        );
        assert_eq!(session_url(&json!({"data": {"session": {}}})), None);
    }

    #[test]
    fn test_token_locations() {
        assert_eq!(token(&json!({"token": "t1"})).as_deref(), Some("t1"));
        assert_eq!(token(&json!({"data": {"token": "t2"}})).as_deref(), Some("t2"));
        assert_eq!(token(&json!({"message": "ok"})), None);
    }
}
