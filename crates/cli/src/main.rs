//! Basket CLI - Inspect and edit a shopper's cart and wishlist.
//!
//! # Usage
//!
//! ```bash
//! # Show the current cart and wishlist as JSON
//! basket show
//!
//! # Add two medium yellow tees (max 5 per order)
//! basket add tee -n "Pineapple Tee" -p 24.99 -q 2 --color yellow --size M --stock 12 --max 5
//!
//! # Change or remove a line (quantity 0 removes it)
//! basket update local:3f0c... 4
//! basket remove gid://cart/Line/1
//!
//! # Save and unsave products
//! basket wish-add hat -n "Sun Hat" -p 15
//! basket wish-remove local:9a1e...
//!
//! # Reload from the cart service (or the device snapshot for guests)
//! basket sync
//! ```
//!
//! Without `BASKET_ACCESS_TOKEN` the CLI runs as a guest against the snapshot
//! directory. With a token (and `BASKET_REMOTE_URL`) it signs in, which also
//! pushes any guest cart lines left in the snapshot to the remote cart.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use basket_sync::config::SyncConfig;

mod commands;

#[derive(Parser)]
#[command(name = "basket")]
#[command(author, version, about = "Basket cart and wishlist CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart and wishlist
    Show,
    /// Add a product variant to the cart
    Add {
        /// Product identifier
        product: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Unit price (e.g. 24.99)
        #[arg(short, long)]
        price: Decimal,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Color variant
        #[arg(long)]
        color: Option<String>,

        /// Size variant
        #[arg(long)]
        size: Option<String>,

        /// Units in stock
        #[arg(long, default_value_t = 10)]
        stock: u32,

        /// Maximum units per line (defaults to stock)
        #[arg(long)]
        max: Option<u32>,
    },
    /// Set a cart line's quantity; zero or less removes it
    Update {
        /// Cart line ID
        line: String,

        /// New quantity
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a cart line
    Remove {
        /// Cart line ID
        line: String,
    },
    /// Empty the cart
    Clear,
    /// Save a product to the wishlist
    WishAdd {
        /// Product identifier
        product: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Unit price (e.g. 15.00)
        #[arg(short, long)]
        price: Decimal,

        /// Units in stock
        #[arg(long, default_value_t = 10)]
        stock: u32,
    },
    /// Remove a wishlist entry
    WishRemove {
        /// Wishlist entry ID
        entry: String,
    },
    /// Reload the cart and wishlist from their source
    Sync,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &SyncConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

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
#[allow(clippy::print_stderr)]
async fn main() {
    let cli = Cli::parse();

    let config = match SyncConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so stdout stays machine-readable
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "basket_sync=info,basket_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: SyncConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = commands::open_store(&config).await?;

    match cli.command {
        Commands::Show => {}
        Commands::Add {
            product,
            name,
            price,
            quantity,
            color,
            size,
            stock,
            max,
        } => {
            let draft = commands::cart::draft(commands::cart::Variant {
                product,
                name,
                price,
                quantity,
                color,
                size,
                stock,
                max,
            });
            store.add_to_cart(draft).await?;
        }
        Commands::Update { line, quantity } => {
            commands::cart::update(&store, &line, quantity).await?;
        }
        Commands::Remove { line } => commands::cart::remove(&store, &line).await?,
        Commands::Clear => store.clear_cart().await?,
        Commands::WishAdd {
            product,
            name,
            price,
            stock,
        } => {
            let draft = commands::wishlist::draft(product, name, price, stock);
            store.add_to_wishlist(draft).await?;
        }
        Commands::WishRemove { entry } => commands::wishlist::remove(&store, &entry).await?,
        Commands::Sync => store.resync().await?,
    }

    commands::print_state(&store.state())?;
    Ok(())
}
