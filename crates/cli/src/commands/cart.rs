//! Cart commands.
//!
//! Without a session these read and write the guest cart in
//! `CARDSHOP_STORAGE_DIR`.

use cardshop_core::{ProductId, ProductSnapshot};
use cardshop_storefront::{CartSource, CartView, Result, Storefront};

/// Print the cart.
pub async fn show(app: &Storefront) -> Result<()> {
    let cart = app.cart().await?;
    print_cart(&cart);
    Ok(())
}

/// Add `quantity` units of a product.
pub async fn add(app: &Storefront, product: ProductSnapshot, quantity: u32) -> Result<()> {
    let name = product.product_name.clone();
    let cart = app.add_to_cart(product, quantity).await?;
    tracing::info!(quantity, "Added {name} to cart");
    print_cart(&cart);
    Ok(())
}

/// Set a line's quantity.
pub async fn set(app: &Storefront, product_id: ProductId, quantity: u32) -> Result<()> {
    let cart = app.update_cart_quantity(product_id, quantity).await?;
    print_cart(&cart);
    Ok(())
}

/// Remove a line.
pub async fn remove(app: &Storefront, product_id: ProductId) -> Result<()> {
    let cart = app.remove_from_cart(product_id).await?;
    print_cart(&cart);
    Ok(())
}

/// Empty the cart.
pub async fn clear(app: &Storefront) -> Result<()> {
    app.clear_cart().await?;
    tracing::info!("Cart cleared");
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn print_cart(cart: &CartView) {
    let label = match cart.source {
        CartSource::Local => "Guest cart",
        CartSource::Server => "Cart",
    };

    if cart.is_empty() {
        println!("{label} is empty");
        return;
    }

    println!("{label} ({} items)", cart.item_count);
    for line in &cart.items {
        println!(
            "  {:>6}  {:<32} {:>3} x {:>8} = {:>9}",
            line.product_id, line.title, line.quantity, line.price, line.line_price
        );
    }
    println!("  Subtotal: {}", cart.subtotal);
}
