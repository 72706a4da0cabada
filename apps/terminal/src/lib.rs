//! # Khata Terminal Library
//!
//! One operator session of the Khata POS terminal: state, commands, and the
//! console that drives them.
//!
//! ## Module Organization
//! ```text
//! khata_terminal/
//! ├── lib.rs          ◄─── You are here (Session, startup)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── cart.rs     ◄─── Cart + payment form + confirm phase
//! │   ├── catalog.rs  ◄─── Stock snapshot + customers
//! │   ├── checkout.rs ◄─── Single in-flight commit guard
//! │   ├── backend.rs  ◄─── Backend handle + retry policy
//! │   └── config.rs   ◄─── Display configuration
//! ├── commands/
//! │   ├── cart.rs     ◄─── add, scan, quantity, remove
//! │   ├── checkout.rs ◄─── payment dialog, confirm_sale
//! │   ├── catalog.rs  ◄─── refresh, browse, low stock
//! │   └── khata.rs    ◄─── dues, ledger history
//! ├── console.rs      ◄─── Line-oriented operator console
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod console;
pub mod error;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use khata_client::{ClientConfig, HttpBackend, PosBackend, RetrySettings};
use tokio::io::BufReader;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use error::ApiResult;
use state::{BackendState, CartState, CatalogState, CheckoutState, ConfigState};

/// Everything one terminal session holds.
#[derive(Debug)]
pub struct Session {
    pub backend: BackendState,
    pub catalog: CatalogState,
    pub cart: CartState,
    pub checkout: CheckoutState,
    pub config: ConfigState,
}

impl Session {
    /// Starts a session with an empty catalog and an empty cart.
    pub fn new(backend: Arc<dyn PosBackend>, retry: RetrySettings, config: ConfigState) -> Self {
        Session {
            backend: BackendState::new(backend, retry),
            catalog: CatalogState::new(),
            cart: CartState::new(),
            checkout: CheckoutState::new(),
            config,
        }
    }
}

/// Runs the terminal on stdin/stdout.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Terminal Startup                                  │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter                                │
/// │     • Default: info,khata=debug, override with RUST_LOG                 │
/// │                                                                         │
/// │  2. Load Client Config ───────────────────────────────────────────────► │
/// │     • khata.toml (KHATA_CONFIG or platform config dir)                  │
/// │     • KHATA_* environment overrides                                     │
/// │                                                                         │
/// │  3. Build HTTP Backend ───────────────────────────────────────────────► │
/// │                                                                         │
/// │  4. Fetch Catalog ────────────────────────────────────────────────────► │
/// │     • On failure: warn and start empty ('refresh' retries)              │
/// │                                                                         │
/// │  5. Run Console until 'quit' or end of input ─────────────────────────► │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> ApiResult<()> {
    init_tracing();

    info!("Starting Khata POS terminal");

    let config_path = std::env::var("KHATA_CONFIG").ok().map(PathBuf::from);
    let client_config = ClientConfig::load_or_default(config_path);
    let backend = HttpBackend::new(&client_config)?;
    info!(base_url = backend.base_url(), "Backend configured");

    let session = Session::new(
        Arc::new(backend),
        client_config.retry.clone(),
        ConfigState::from_env(),
    );

    match commands::catalog::refresh_catalog(&session.backend, &session.catalog).await {
        Ok(summary) => info!(
            items = summary.item_count,
            customers = summary.customer_count,
            low_stock = summary.low_stock_count,
            "Catalog loaded"
        ),
        Err(err) => warn!(error = %err, "Starting with an empty catalog"),
    }

    console::run(&session, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

    info!("Terminal closed");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=khata=trace` - Show trace for khata crates only
/// - Default: `info,khata=debug`
///
/// Logs go to stderr so they never interleave with console output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,khata=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .with_writer(std::io::stderr)
        .init();
}
