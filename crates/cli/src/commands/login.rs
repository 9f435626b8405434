//! Sign in and merge guest data.

use std::fmt::Display;

use cardshop_storefront::{Result, Storefront, SyncOutcome};
use secrecy::SecretString;

use super::cart::print_cart;

/// Log in, report the guest data merge and print the account cart and wishlist.
#[allow(clippy::print_stdout)]
pub async fn run(app: &Storefront, email: &str, password: &SecretString) -> Result<()> {
    let outcome = app.login(email, password).await?;
    println!("Signed in as {}", outcome.user.email);
    println!("  cart merge:     {}", describe(&outcome.sync.cart, "lines"));
    println!(
        "  wishlist merge: {}",
        describe(&outcome.sync.wishlist, "items")
    );

    print_cart(&app.cart().await?);

    app.wishlist_handle().ensure_fetched().await;
    let ids = app.wishlist_ids();
    if ids.is_empty() {
        println!("Wishlist is empty");
    } else {
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        println!("Wishlist: {}", ids.join(", "));
    }
    Ok(())
}

fn describe<T>(outcome: &SyncOutcome<T>, noun: impl Display) -> String {
    match outcome {
        SyncOutcome::Skipped => "nothing to merge".to_string(),
        SyncOutcome::Merged(_) => format!("guest {noun} merged"),
        SyncOutcome::Failed(reason) => format!("failed ({reason}), guest {noun} kept locally"),
    }
}
