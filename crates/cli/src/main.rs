//! Verdant CLI - browse the catalog, manage the cart and check out.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! verdant products --sort asc --max 50
//! verdant product 64f1c0ffee
//!
//! # Cart and wishlist
//! verdant cart add 64f1c0ffee --qty 2
//! verdant wishlist toggle 64f1c0ffee
//!
//! # Check out
//! verdant checkout --name "Sam Doe" --address "1 Main St" --city Springfield
//! ```
//!
//! # Environment Variables
//!
//! - `VERDANT_API_BASE` - Remote API base URL
//! - `VERDANT_DATA_DIR` - Directory for the persisted cart, wishlist and token
//! - `SENTRY_DSN` - Optional Sentry DSN for error tracking

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verdant_core::SortOrder;
use verdant_storefront::{ClientConfig, Storefront};

mod commands;

#[derive(Parser)]
#[command(name = "verdant")]
#[command(author, version, about = "Verdant storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        limit: u32,

        /// Price sort direction (`asc` or `desc`)
        #[arg(long, default_value = "desc")]
        sort: SortOrder,

        /// Minimum price
        #[arg(long)]
        min: Option<Decimal>,

        /// Maximum price
        #[arg(long)]
        max: Option<Decimal>,

        /// Category id
        #[arg(long)]
        category: Option<String>,
    },
    /// Show one product with its reviews
    Product { id: String },
    /// List categories
    Categories,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the wishlist
    Wishlist {
        #[command(subcommand)]
        action: WishlistAction,
    },
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,

        #[arg(long, default_value = "")]
        address: String,

        #[arg(long, default_value = "")]
        phone: String,

        /// Profile image to upload
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Sign out
    Logout,
    /// Show the signed-in profile
    Profile,
    /// Place an order for the cart contents
    Checkout(commands::checkout::CheckoutArgs),
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,
    /// Add a product
    Add {
        id: String,

        #[arg(long, default_value_t = 1)]
        qty: u32,
    },
    /// Remove a product
    Remove { id: String },
    /// Set a line's quantity (must be at least 1)
    Set { id: String, qty: u32 },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum WishlistAction {
    /// Show saved products
    Show,
    /// Save or unsave a product
    Toggle { id: String },
    /// Toggle a saved product in the cart
    MoveToCart { id: String },
    /// Empty the wishlist
    Clear,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
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

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "verdant_storefront=info,verdant_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    let storefront = Storefront::open(config)?;

    match cli.command {
        Commands::Products {
            page,
            limit,
            sort,
            min,
            max,
            category,
        } => {
            let filter = commands::catalog::ProductFilter {
                page,
                limit,
                sort,
                min,
                max,
                category,
            };
            commands::catalog::products(&storefront, filter).await?;
        }
        Commands::Product { id } => commands::catalog::product(&storefront, &id.into()).await?,
        Commands::Categories => commands::catalog::categories(&storefront).await?,
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&storefront),
            CartAction::Add { id, qty } => commands::cart::add(&storefront, &id.into(), qty).await?,
            CartAction::Remove { id } => commands::cart::remove(&storefront, &id.into()),
            CartAction::Set { id, qty } => commands::cart::set(&storefront, &id.into(), qty)?,
            CartAction::Clear => commands::cart::clear(&storefront),
        },
        Commands::Wishlist { action } => match action {
            WishlistAction::Show => commands::wishlist::show(&storefront),
            WishlistAction::Toggle { id } => {
                commands::wishlist::toggle(&storefront, &id.into()).await?;
            }
            WishlistAction::MoveToCart { id } => {
                commands::wishlist::move_to_cart(&storefront, &id.into())?;
            }
            WishlistAction::Clear => commands::wishlist::clear(&storefront),
        },
        Commands::Login { email, password } => {
            commands::account::login(&storefront, &email, &password).await?;
        }
        Commands::Register {
            name,
            email,
            password,
            address,
            phone,
            image,
        } => {
            let form = commands::account::RegisterArgs {
                name,
                email,
                password,
                address,
                phone,
                image,
            };
            commands::account::register(&storefront, form).await?;
        }
        Commands::Logout => commands::account::logout(&storefront),
        Commands::Profile => commands::account::profile(&storefront).await?,
        Commands::Checkout(args) => commands::checkout::run(&storefront, args).await?,
    }
    Ok(())
}
