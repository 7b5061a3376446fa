//! Pocketshop CLI - browse the catalog and fill a cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # One page of search results
//! pocketshop search phone --view list --page 2
//!
//! # A single product
//! pocketshop product 12
//!
//! # Interactive session with a cart
//! pocketshop shell
//! ```
//!
//! Configuration comes from the environment (see
//! `pocketshop_storefront::config`). Logs go to stderr; `RUST_LOG` overrides
//! the default filter.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use pocketshop_core::{ProductId, ViewMode};
use pocketshop_storefront::config::StorefrontConfig;
use pocketshop_storefront::state::AppState;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "pocketshop")]
#[command(author, version, about = "Pocketshop catalog and cart")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog and print one page of results
    Search {
        /// Search term (empty lists everything)
        #[arg(default_value = "")]
        term: String,

        /// Presentation mode (`grid` or `list`)
        #[arg(short, long, default_value = "grid")]
        view: ViewMode,

        /// Page to show; in list mode, pages up to this one are accumulated
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Show a single product
    Product {
        /// Product ID
        id: ProductId,
    },
    /// Start an interactive session
    Shell,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
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

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pocketshop_storefront=info,pocketshop_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = init_sentry(&config);
    init_tracing();

    let result = run(cli, config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState::new(config)?;

    match cli.command {
        Commands::Search { term, view, page } => {
            commands::search::run(&state, &term, view, page).await?;
        }
        Commands::Product { id } => commands::product::run(&state, id).await?,
        Commands::Shell => commands::shell::run(state).await?,
    }
    Ok(())
}
