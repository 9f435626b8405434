//! Wishlist commands.

use cardshop_core::{ProductId, ProductSnapshot};
use cardshop_storefront::{Result, Storefront};

/// Print the guest wishlist.
#[allow(clippy::print_stdout)]
pub fn show(app: &Storefront) {
    let entries = app.wishlist_storage().get_wishlist();
    if entries.is_empty() {
        println!("Wishlist is empty");
        return;
    }

    println!("Wishlist ({} items)", entries.len());
    for entry in &entries {
        println!(
            "  {:>6}  {:<32} added {}",
            entry.product_id,
            entry.product_name,
            entry.added_at.format("%Y-%m-%d")
        );
    }
}

/// Save a product.
pub async fn add(app: &Storefront, product: ProductSnapshot) -> Result<()> {
    let name = product.product_name.clone();
    if app.add_to_wishlist(product).await? {
        tracing::info!("Saved {name} to wishlist");
    } else {
        tracing::info!("{name} is already in the wishlist");
    }
    Ok(())
}

/// Remove a product.
pub async fn remove(app: &Storefront, product_id: ProductId) -> Result<()> {
    if app.remove_from_wishlist(product_id).await? {
        tracing::info!(%product_id, "Removed from wishlist");
    } else {
        tracing::info!(%product_id, "Not in wishlist");
    }
    Ok(())
}

/// Remove every saved product.
pub fn clear(app: &Storefront) {
    app.wishlist_storage().clear_wishlist();
    tracing::info!("Wishlist cleared");
}
