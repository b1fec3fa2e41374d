//! Cache types for catalog responses.

use super::types::{Category, Product, ProductDetail, ProductQuery};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products(ProductQuery),
    Product(String),
    Categories,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Vec<Product>),
    Product(Box<ProductDetail>),
    Categories(Vec<Category>),
}
