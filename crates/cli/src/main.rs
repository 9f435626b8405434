//! Cardshop CLI - guest cart, wishlist and login from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Add two of product 42 to the guest cart
//! cardshop cart add 42 --name "Birthday Card" --price 4.99 -q 2
//!
//! # Show the guest cart
//! cardshop cart show
//!
//! # Save a product for later
//! cardshop wishlist add 7 --name "Thank You Card" --price 3.50
//!
//! # Sign in; the guest cart and wishlist are merged into the account
//! CARDSHOP_PASSWORD=... cardshop login -e shopper@example.com
//! ```
//!
//! # Commands
//!
//! - `cart` - Show and edit the guest cart
//! - `wishlist` - Show and edit the guest wishlist
//! - `login` - Sign in and merge guest data into the account
//!
//! Guest data is kept in `CARDSHOP_STORAGE_DIR` between runs.

#![cfg_attr(not(test), forbid(unsafe_code))]

use cardshop_core::{ProductId, ProductSnapshot};
use cardshop_storefront::{ClientConfig, Storefront};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use secrecy::SecretString;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "cardshop")]
#[command(author, version, about = "Cardshop cart and wishlist client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show and edit the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Show and edit the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Sign in and merge the guest cart and wishlist into the account
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "CARDSHOP_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Print the cart
    Show,
    /// Add a product
    Add {
        #[command(flatten)]
        product: ProductArgs,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (0 removes it)
    Set {
        product_id: ProductId,
        quantity: u32,
    },
    /// Remove a line
    Remove { product_id: ProductId },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Print the wishlist
    Show,
    /// Save a product
    Add {
        #[command(flatten)]
        product: ProductArgs,
    },
    /// Remove a product
    Remove { product_id: ProductId },
    /// Remove every product
    Clear,
}

/// Product details stored alongside a guest line.
#[derive(Args)]
struct ProductArgs {
    /// Product ID
    product_id: ProductId,

    /// Display name
    #[arg(short, long)]
    name: String,

    /// Unit price (e.g. 4.99)
    #[arg(short, long)]
    price: Decimal,

    /// URL slug (defaults to the product ID)
    #[arg(long)]
    slug: Option<String>,

    /// Image URL
    #[arg(long)]
    image: Option<String>,

    /// Units in stock
    #[arg(long, default_value_t = 99)]
    stock: u32,
}

impl From<ProductArgs> for ProductSnapshot {
    fn from(args: ProductArgs) -> Self {
        Self {
            product_slug: args.slug.unwrap_or_else(|| args.product_id.to_string()),
            product_id: args.product_id,
            product_name: args.name,
            product_image: args.image,
            price: args.price,
            stock: args.stock,
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration first (needed for Sentry init)
    let config = ClientConfig::from_env();

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cardshop_storefront=info,cardshop_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed: {}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> cardshop_storefront::Result<()> {
    let app = Storefront::connect(config)?;
    if app.storage_degraded() {
        tracing::warn!(
            dir = %config.storage_dir.display(),
            "Storage directory is not writable, changes will not be kept"
        );
    }

    match cli.command {
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&app).await?,
            CartAction::Add { product, quantity } => {
                commands::cart::add(&app, product.into(), quantity).await?;
            }
            CartAction::Set {
                product_id,
                quantity,
            } => commands::cart::set(&app, product_id, quantity).await?,
            CartAction::Remove { product_id } => commands::cart::remove(&app, product_id).await?,
            CartAction::Clear => commands::cart::clear(&app).await?,
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show(&app),
            WishlistAction::Add { product } => commands::wishlist::add(&app, product.into()).await?,
            WishlistAction::Remove { product_id } => {
                commands::wishlist::remove(&app, product_id).await?;
            }
            WishlistAction::Clear => commands::wishlist::clear(&app),
        },
        Commands::Login { email, password } => {
            commands::login::run(&app, &email, &SecretString::from(password)).await?;
        }
    }
    Ok(())
}
