//! Canonical records produced by the gateway.
//!
//! These types provide a stable shape for the rest of the storefront,
//! independent of which of the remote API's response layouts was received.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use verdant_core::{CategoryId, OrderId, Price, ProductId, ReviewId, SortOrder};

use super::extract;
use crate::collections::{LineItem, WishEntry};

// =============================================================================
// Catalog Types
// =============================================================================

/// Product as shown in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Missing when the API sent no usable price.
    pub price: Option<Price>,
    /// Renderable image URL (relative paths already resolved).
    pub image: String,
    /// Units in stock.
    pub stock: i64,
    /// The record as received.
    pub raw: serde_json::Value,
}

impl Product {
    /// Whether at least one unit is in stock.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.stock > 0
    }

    /// A cart line for `quantity` units of this product.
    #[must_use]
    pub fn to_line_item(&self, quantity: u32) -> LineItem {
        LineItem::new(
            self.id.clone(),
            self.name.clone(),
            self.price.unwrap_or(Price::ZERO),
            quantity,
            self.image.clone(),
        )
    }

    /// A wishlist entry for this product.
    #[must_use]
    pub fn to_wish_entry(&self) -> WishEntry {
        WishEntry::new(
            self.id.clone(),
            self.name.clone(),
            self.price.unwrap_or(Price::ZERO),
            self.image.clone(),
        )
    }
}

/// Product detail page record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub product: Product,
    pub description: String,
    /// Category name, or id when the API only sent a reference.
    pub category: Option<String>,
    /// Additional gallery images, resolved.
    pub images: Vec<String>,
}

/// Product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub image: String,
    pub description: String,
}

/// Customer review of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Option<ReviewId>,
    pub rating: Option<f64>,
    pub comment: String,
    pub author: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Signed-in customer's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profile_image: Option<String>,
    pub raw: serde_json::Value,
}

/// Filter for `ListProducts`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductQuery {
    pub page: u32,
    pub limit: u32,
    pub sort: SortOrder,
    pub price_from: Price,
    pub price_to: Price,
    /// Only sent when present and non-blank.
    pub category_id: Option<CategoryId>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            sort: SortOrder::Desc,
            price_from: Price::ZERO,
            price_to: Price::new(Decimal::from(10_000)),
            category_id: None,
        }
    }
}

impl ProductQuery {
    /// Query-string pairs in the order the API documents them.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
            ("sort", self.sort.as_str().to_string()),
            ("priceFrom", self.price_from.amount().normalize().to_string()),
            ("priceTo", self.price_to.amount().normalize().to_string()),
        ];
        if let Some(category) = self.category_id.as_ref().filter(|c| !c.is_blank()) {
            pairs.push(("categoryId", category.to_string()));
        }
        pairs
    }
}

// =============================================================================
// Auth Types
// =============================================================================

/// Multipart registration form.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: secrecy::SecretString,
    pub address: String,
    pub phone: String,
    pub profile_image: Option<ProfileImage>,
}

/// Optional avatar upload.
#[derive(Debug, Clone)]
pub struct ProfileImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Result of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The API returned a token; the shopper is signed in.
    SignedIn,
    /// Account created without a token; the shopper must log in.
    Registered,
}

// =============================================================================
// Order Types
// =============================================================================

/// One `{product, quantity}` pair of an order body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(rename = "product")]
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `CreateOrder`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPayload {
    #[serde(rename = "products")]
    pub lines: Vec<OrderLine>,
    #[serde(rename = "address")]
    pub shipping_address: String,
}

impl OrderPayload {
    /// Build a payload from cart lines and a composed address.
    #[must_use]
    pub fn from_lines(lines: &[LineItem], shipping_address: String) -> Self {
        Self {
            lines: lines
                .iter()
                .map(|line| OrderLine {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity.max(1),
                })
                .collect(),
            shipping_address,
        }
    }
}

/// Successful `CreateOrder` response.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedOrder {
    pub raw: serde_json::Value,
}

impl CreatedOrder {
    /// Order id found by the ordered extraction rules, if any.
    #[must_use]
    pub fn order_id(&self) -> Option<OrderId> {
        extract::order_id(&self.raw)
    }
}

/// Successful `CreateCheckoutSession` response.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    /// External payment page, when the API sent one.
    pub redirect_url: Option<String>,
    pub raw: serde_json::Value,
}

impl CheckoutSession {
    /// Interpret a session response body.
    #[must_use]
    pub fn from_body(raw: serde_json::Value) -> Self {
        Self {
            redirect_url: extract::session_url(&raw),
            raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_query_pairs() {
        let pairs = ProductQuery::default().to_pairs();
        assert_eq!(
            pairs,
            vec![
                ("page", "1".to_string()),
                ("limit", "10".to_string()),
                ("sort", "desc".to_string()),
                ("priceFrom", "0".to_string()),
                ("priceTo", "10000".to_string()),
            ]
        );
    }

    #[test]
    fn test_category_only_when_present() {
        let mut query = ProductQuery {
            category_id: Some(CategoryId::new(" ")),
            ..ProductQuery::default()
        };
        assert!(!query.to_pairs().iter().any(|(k, _)| *k == "categoryId"));
        query.category_id = Some(CategoryId::new("c1"));
        assert!(query.to_pairs().contains(&("categoryId", "c1".to_string())));
    }

    #[test]
    fn test_order_payload_wire_shape() {
        let lines = vec![
            LineItem::new("p1", "Tea", Price::from_cents(500), 2, ""),
            LineItem::new("p2", "Mug", Price::from_cents(900), 1, ""),
        ];
        let payload = OrderPayload::from_lines(&lines, "1 Main St, Springfield".to_string());
        assert_eq!(
            serde_json::to_value(&payload).ok(),
            Some(json!({
                "products": [
                    {"product": "p1", "quantity": 2},
                    {"product": "p2", "quantity": 1}
                ],
                "address": "1 Main St, Springfield"
            }))
        );
    }

    #[test]
    fn test_product_to_line_item_defaults_missing_price() {
        let product = Product {
            id: ProductId::new("p1"),
            name: "Tea".to_string(),
            price: None,
            image: String::new(),
            stock: 0,
            raw: json!({}),
        };
        let line = product.to_line_item(3);
        assert_eq!(line.unit_price, Price::ZERO);
        assert_eq!(line.quantity, 3);
        assert!(!product.is_available());
    }
}
