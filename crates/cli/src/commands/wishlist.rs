//! Wishlist commands.

use verdant_core::ProductId;
use verdant_storefront::Storefront;
use verdant_storefront::collections::WishlistToggle;

/// Print saved products.
pub fn show(storefront: &Storefront) {
    let entries = storefront.wishlist().items();
    if entries.is_empty() {
        println!("Your wishlist is empty.");
        return;
    }
    for entry in entries {
        let in_cart = if storefront.cart().contains(&entry.product_id) {
            "  (in cart)"
        } else {
            ""
        };
        println!(
            "{:<26} {:<40} {:>10}{in_cart}",
            entry.product_id,
            entry.title,
            entry.price.display()
        );
    }
}

/// Save or unsave a product.
///
/// # Errors
///
/// Returns an error if the product has to be fetched and cannot be.
pub async fn toggle(
    storefront: &Storefront,
    id: &ProductId,
) -> Result<(), Box<dyn std::error::Error>> {
    match storefront.toggle_wishlist(id).await? {
        WishlistToggle::Added => println!("Saved {id} to wishlist."),
        WishlistToggle::Removed => println!("Removed {id} from wishlist."),
    }
    Ok(())
}

/// Toggle a saved product in the cart.
///
/// # Errors
///
/// Returns an error if the product is not on the wishlist.
pub fn move_to_cart(
    storefront: &Storefront,
    id: &ProductId,
) -> Result<(), Box<dyn std::error::Error>> {
    if storefront.move_to_cart(id)? {
        println!("Added {id} to cart.");
    } else {
        println!("Removed {id} from cart.");
    }
    Ok(())
}

/// Empty the wishlist.
pub fn clear(storefront: &Storefront) {
    storefront.wishlist().clear();
    println!("Wishlist cleared.");
}
