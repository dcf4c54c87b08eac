//! Cartwright CLI - Database migrations and cart/order operations.
//!
//! # Usage
//!
//! ```bash
//! # Apply the checkout schema
//! cw-cli migrate
//!
//! # Add a product to a cart (prints the row and whether it was created)
//! cw-cli cart add --cart-key 3f2a9c --product 7
//!
//! # Turn the cart into an order for user 12 and empty it
//! cw-cli checkout --user 12 --cart-key 3f2a9c
//!
//! # Inspect the order
//! cw-cli order show --order 41 --json
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `cart add|show|set-quantity|remove|clear` - Inspect and edit carts
//! - `checkout` - Materialize a cart into an order
//! - `order show|list|set-status|set-payment` - Inspect and update orders

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cartwright_checkout::config::CheckoutConfig;
use cartwright_checkout::db;
use cartwright_checkout::store::PgStore;
use cartwright_checkout::CheckoutService;
use cartwright_core::{CartItemId, CartKey, OrderId, OrderStatus, PaymentOption, ProductId, UserId};

mod commands;

#[derive(Parser)]
#[command(name = "cw-cli")]
#[command(author, version, about = "Cartwright CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Inspect and edit carts
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Turn a cart into an order
    Checkout {
        /// Customer placing the order
        #[arg(short, long)]
        user: UserId,

        /// Cart to check out
        #[arg(short, long)]
        cart_key: CartKey,

        /// Leave the cart rows in place after the order is created
        #[arg(long)]
        keep_cart: bool,

        /// Print the order as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect and update orders
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add one unit of a product
    Add {
        /// Cart key
        #[arg(short, long)]
        cart_key: CartKey,

        /// Product ID
        #[arg(short, long)]
        product: ProductId,
    },
    /// List a cart's rows and total
    Show {
        /// Cart key
        #[arg(short, long)]
        cart_key: CartKey,
    },
    /// Overwrite a row's quantity (0 removes it)
    SetQuantity {
        /// Cart item ID
        #[arg(short, long)]
        item: CartItemId,

        /// New quantity
        #[arg(short, long)]
        quantity: i32,
    },
    /// Remove a row
    Remove {
        /// Cart item ID
        #[arg(short, long)]
        item: CartItemId,
    },
    /// Remove every row of a cart
    Clear {
        /// Cart key
        #[arg(short, long)]
        cart_key: CartKey,
    },
}

#[derive(Subcommand)]
enum OrderAction {
    /// Show an order with its lines, products and total
    Show {
        /// Order ID
        #[arg(short, long)]
        order: OrderId,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List a user's orders
    List {
        /// User ID
        #[arg(short, long)]
        user: UserId,
    },
    /// Change an order's status (`awaiting_payment`, `completed`, `cancelled`)
    SetStatus {
        /// Order ID
        #[arg(short, long)]
        order: OrderId,

        /// New status
        #[arg(short, long)]
        status: OrderStatus,
    },
    /// Change an order's payment option (`deposit`, `gateway_a`, `gateway_b`)
    SetPayment {
        /// Order ID
        #[arg(short, long)]
        order: OrderId,

        /// New payment option
        #[arg(short = 'p', long)]
        option: PaymentOption,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CheckoutConfig) -> Option<sentry::ClientInitGuard> {
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

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Sentry must be initialized before the subscriber, so load config first
    // and report a config failure once tracing is up.
    let config = CheckoutConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cartwright_checkout=info,cartwright_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: CheckoutConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pool = db::create_pool(&config.database_url, &config.pool).await?;
    tracing::debug!("Database pool created");

    let service = CheckoutService::new(PgStore::new(pool));

    match cli.command {
        Commands::Migrate => commands::migrate::run(service.store().pool()).await?,
        Commands::Cart { action } => match action {
            CartAction::Add { cart_key, product } => {
                commands::cart::add(&service, &cart_key, product).await?;
            }
            CartAction::Show { cart_key } => commands::cart::show(&service, &cart_key).await?,
            CartAction::SetQuantity { item, quantity } => {
                commands::cart::set_quantity(&service, item, quantity).await?;
            }
            CartAction::Remove { item } => commands::cart::remove(&service, item).await?,
            CartAction::Clear { cart_key } => commands::cart::clear(&service, &cart_key).await?,
        },
        Commands::Checkout {
            user,
            cart_key,
            keep_cart,
            json,
        } => commands::order::checkout(&service, user, &cart_key, keep_cart, json).await?,
        Commands::Order { action } => match action {
            OrderAction::Show { order, json } => {
                commands::order::show(&service, order, json).await?;
            }
            OrderAction::List { user } => commands::order::list(&service, user).await?,
            OrderAction::SetStatus { order, status } => {
                commands::order::set_status(&service, order, status).await?;
            }
            OrderAction::SetPayment { order, option } => {
                commands::order::set_payment(&service, order, option).await?;
            }
        },
    }
    Ok(())
}
