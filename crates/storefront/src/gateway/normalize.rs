//! Conversion of raw API bodies into canonical records.
//!
//! List endpoints try each known body layout in a fixed priority order and
//! fall back to an empty list when none matches. Single-record endpoints
//! prefer a `data` object and fall back to the top-level object.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;
use verdant_core::{CategoryId, Price, ProductId, ReviewId};

use super::extract::{self, JsonPath, at, scalar_string};
use super::types::{Category, Product, ProductDetail, Profile, Review};

/// Product list layouts, highest priority first.
pub const PRODUCT_LIST_SHAPES: &[JsonPath] = &[&[], &["data", "products"], &["data"], &["products"]];

/// Category list layouts, highest priority first.
pub const CATEGORY_LIST_SHAPES: &[JsonPath] = &[&[], &["data"], &["categories"]];

/// Review list layouts, highest priority first.
pub const REVIEW_LIST_SHAPES: &[JsonPath] = &[&["data"], &[], &["reviews"]];

/// First array found along `shapes`.
#[must_use]
pub fn list_items<'a>(body: &'a Value, shapes: &[JsonPath]) -> Option<&'a Vec<Value>> {
    shapes
        .iter()
        .find_map(|shape| at(body, shape).and_then(Value::as_array))
}

/// Single record: `data` when it is an object, else the body itself.
#[must_use]
pub fn single_record(body: &Value) -> Option<&Value> {
    match body.get("data") {
        Some(data @ Value::Object(_)) => Some(data),
        _ => body.is_object().then_some(body),
    }
}

/// Human-readable failure message from an error body.
#[must_use]
pub fn error_message(body: &Value) -> Option<String> {
    extract::first_string(body, &[&["message"], &["error"]])
}

/// Resolve an image reference for display.
///
/// Absolute URLs pass through unchanged; relative paths are joined onto
/// `asset_base`.
#[must_use]
pub fn resolve_image(asset_base: &str, reference: &str) -> String {
    let reference = reference.trim();
    if reference.is_empty() {
        return String::new();
    }
    let lower = reference.to_ascii_lowercase();
    if lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("//")
        || lower.starts_with("data:")
    {
        return reference.to_string();
    }
    format!(
        "{}/{}",
        asset_base.trim_end_matches('/'),
        reference.trim_start_matches("./").trim_start_matches('/')
    )
}

// =============================================================================
// Record conversions
// =============================================================================

/// Normalize a product list body.
#[must_use]
pub fn products(body: &Value, asset_base: &str) -> Vec<Product> {
    collect(body, PRODUCT_LIST_SHAPES, "products", |v| product(v, asset_base))
}

/// Normalize a category list body.
#[must_use]
pub fn categories(body: &Value, asset_base: &str) -> Vec<Category> {
    collect(body, CATEGORY_LIST_SHAPES, "categories", |v| category(v, asset_base))
}

/// Normalize a review list body.
#[must_use]
pub fn reviews(body: &Value) -> Vec<Review> {
    collect(body, REVIEW_LIST_SHAPES, "reviews", review)
}

fn collect<T>(
    body: &Value,
    shapes: &[JsonPath],
    resource: &'static str,
    convert: impl Fn(&Value) -> Option<T>,
) -> Vec<T> {
    let Some(items) = list_items(body, shapes) else {
        warn!(resource, "Unrecognized list response shape; treating as empty");
        return Vec::new();
    };
    let converted: Vec<T> = items.iter().filter_map(convert).collect();
    if converted.len() < items.len() {
        warn!(
            resource,
            skipped = items.len() - converted.len(),
            "Skipped list entries without an id"
        );
    }
    converted
}

/// Convert one product object.
#[must_use]
pub fn product(value: &Value, asset_base: &str) -> Option<Product> {
    if !value.is_object() {
        return None;
    }
    let id = extract::first_string(value, &[&["_id"], &["id"]])?;
    Some(Product {
        id: ProductId::from(id),
        name: extract::first_string(value, &[&["name"], &["title"]]).unwrap_or_default(),
        price: ["price", "originalPrice"]
            .iter()
            .find_map(|key| value.get(*key).and_then(Price::from_json)),
        image: resolve_image(
            asset_base,
            &extract::first_string(value, &[&["image"], &["picture"]]).unwrap_or_default(),
        ),
        stock: ["quantity", "qty", "stock"]
            .iter()
            .find_map(|key| value.get(*key).and_then(as_i64))
            .unwrap_or(0),
        raw: value.clone(),
    })
}

/// Convert a single-product body.
#[must_use]
pub fn product_detail(body: &Value, asset_base: &str) -> Option<ProductDetail> {
    let record = single_record(body)?;
    let product = product(record, asset_base)?;
    let category = match record.get("category") {
        Some(category @ Value::Object(_)) => {
            extract::first_string(category, &[&["name"], &["title"], &["_id"], &["id"]])
        }
        Some(other) => scalar_string(other),
        None => None,
    };
    let images = record
        .get("images")
        .and_then(Value::as_array)
        .map(|images| {
            images
                .iter()
                .filter_map(Value::as_str)
                .map(|img| resolve_image(asset_base, img))
                .filter(|img| !img.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Some(ProductDetail {
        description: record
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        category,
        images,
        product,
    })
}

/// Convert one category object.
#[must_use]
pub fn category(value: &Value, asset_base: &str) -> Option<Category> {
    if !value.is_object() {
        return None;
    }
    let id = extract::first_string(value, &[&["_id"], &["id"]])?;
    Some(Category {
        id: CategoryId::from(id),
        name: extract::first_string(value, &[&["name"], &["title"], &["categoryName"]])
            .unwrap_or_default(),
        image: resolve_image(
            asset_base,
            &extract::first_string(value, &[&["image"], &["icon"], &["picture"]])
                .unwrap_or_default(),
        ),
        description: value
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Convert one review object. Reviews without an id are kept.
#[must_use]
pub fn review(value: &Value) -> Option<Review> {
    if !value.is_object() {
        return None;
    }
    let author = extract::first_string(value, &[&["user", "name"], &["userName"], &["name"]])
        .or_else(|| value.get("user").and_then(Value::as_str).map(str::to_string));
    Some(Review {
        id: extract::first_string(value, &[&["_id"], &["id"]]).map(ReviewId::from),
        rating: value.get("rating").and_then(as_f64),
        comment: extract::first_string(value, &[&["comment"], &["review"], &["text"]])
            .unwrap_or_default(),
        author,
        created_at: value
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    })
}

/// Convert a profile body.
#[must_use]
pub fn profile(body: &Value, asset_base: &str) -> Option<Profile> {
    let record = single_record(body)?;
    let text = |key: &str| record.get(key).and_then(scalar_string);
    Some(Profile {
        name: text("name"),
        email: text("email"),
        phone: text("phone"),
        address: text("address"),
        profile_image: extract::first_string(
            record,
            &[&["profileImage"], &["image"], &["avatar"]],
        )
        .map(|img| resolve_image(asset_base, &img)),
        raw: record.clone(),
    })
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(f64_to_i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)] // stock counts are far below i64::MAX
fn f64_to_i64(value: f64) -> i64 {
    value.trunc() as i64
}
