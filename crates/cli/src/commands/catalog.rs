//! Catalog browsing commands.

use rust_decimal::Decimal;
use verdant_core::{CategoryId, Price, ProductId, SortOrder};
use verdant_storefront::Storefront;
use verdant_storefront::gateway::{Product, ProductQuery};

/// Filter options for `verdant products`.
pub struct ProductFilter {
    pub page: u32,
    pub limit: u32,
    pub sort: SortOrder,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    pub category: Option<String>,
}

impl From<ProductFilter> for ProductQuery {
    fn from(filter: ProductFilter) -> Self {
        let defaults = Self::default();
        Self {
            page: filter.page.max(1),
            limit: filter.limit.max(1),
            sort: filter.sort,
            price_from: filter.min.map_or(defaults.price_from, Price::new),
            price_to: filter.max.map_or(defaults.price_to, Price::new),
            category_id: filter.category.map(CategoryId::from),
        }
    }
}

/// List products.
///
/// # Errors
///
/// Returns an error if the products cannot be fetched.
pub async fn products(
    storefront: &Storefront,
    filter: ProductFilter,
) -> Result<(), Box<dyn std::error::Error>> {
    let products = storefront
        .gateway()
        .list_products(&filter.into())
        .await?;

    if products.is_empty() {
        println!("No products found.");
        return Ok(());
    }
    for product in &products {
        print_product_line(product);
    }
    Ok(())
}

/// Show one product with its reviews.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched.
pub async fn product(
    storefront: &Storefront,
    id: &ProductId,
) -> Result<(), Box<dyn std::error::Error>> {
    let detail = storefront.gateway().get_product(id).await?;

    print_product_line(&detail.product);
    if let Some(category) = &detail.category {
        println!("  Category: {category}");
    }
    if !detail.description.is_empty() {
        println!("\n{}\n", detail.description);
    }
    if !detail.product.image.is_empty() {
        println!("  Image: {}", detail.product.image);
    }

    // Review failures are logged only
    match storefront.gateway().get_reviews(id).await {
        Ok(reviews) if reviews.is_empty() => println!("No reviews yet."),
        Ok(reviews) => {
            println!("Reviews ({}):", reviews.len());
            for review in reviews {
                let rating = review
                    .rating
                    .map_or_else(|| "-".to_string(), |r| format!("{r:.1}"));
                let author = review.author.as_deref().unwrap_or("Anonymous");
                println!("  [{rating}] {author}: {}", review.comment);
            }
        }
        Err(e) => tracing::warn!(error = %e, "Could not load reviews"),
    }
    Ok(())
}

/// List categories.
///
/// # Errors
///
/// Returns an error if the categories cannot be fetched.
pub async fn categories(storefront: &Storefront) -> Result<(), Box<dyn std::error::Error>> {
    let categories = storefront.gateway().list_categories().await?;
    if categories.is_empty() {
        println!("No categories found.");
    }
    for category in categories {
        println!("{:<26} {}", category.id, category.name);
    }
    Ok(())
}

fn print_product_line(product: &Product) {
    let price = product
        .price
        .map_or_else(|| "n/a".to_string(), |p| p.display());
    let stock = if product.is_available() {
        format!("{} in stock", product.stock)
    } else {
        "out of stock".to_string()
    };
    println!("{:<26} {:<40} {:>10}  {stock}", product.id, product.name, price);
}
