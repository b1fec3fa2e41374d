//! Cart commands.

use verdant_core::ProductId;
use verdant_storefront::Storefront;
use verdant_storefront::StorefrontError;

/// Print cart lines and totals.
pub fn show(storefront: &Storefront) {
    let cart = storefront.cart();
    let items = cart.items();
    if items.is_empty() {
        println!("Your cart is empty.");
        return;
    }

    for line in &items {
        println!(
            "{:<26} {:<40} {:>4} x {:>10} = {:>10}",
            line.product_id,
            line.title,
            line.quantity,
            line.unit_price.display(),
            line.line_total().display()
        );
    }
    let summary = cart.summary();
    println!("\nItems:    {}", cart.unit_count());
    println!("Subtotal: {}", summary.subtotal.display());
    println!("Shipping: {}", summary.shipping.display());
    println!("Discount: {}", summary.discount.display());
    println!("Total:    {}", summary.grand_total.display());
}

/// Add a product to the cart.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched.
pub async fn add(
    storefront: &Storefront,
    id: &ProductId,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let line = storefront.add_to_cart(id, quantity).await?;
    println!("{} x {} in cart.", line.quantity, line.title);
    Ok(())
}

/// Remove a product from the cart.
pub fn remove(storefront: &Storefront, id: &ProductId) {
    storefront.cart().remove(id);
    println!("Removed {id} from cart.");
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns an error if the product is not in the cart or `quantity` is 0.
pub fn set(
    storefront: &Storefront,
    id: &ProductId,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if quantity < 1 {
        return Err("Quantity must be at least 1".into());
    }
    if !storefront.cart().set_quantity(id, quantity) {
        return Err(StorefrontError::NotFound(format!("Cart line {id}")).into());
    }
    println!("Set {id} to {quantity}.");
    Ok(())
}

/// Empty the cart.
pub fn clear(storefront: &Storefront) {
    storefront.cart().clear();
    println!("Cart cleared.");
}
