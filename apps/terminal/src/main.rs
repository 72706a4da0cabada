//! # Khata Terminal Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Khata POS Terminal                               │
//! │                                                                         │
//! │  main.rs ────► tokio runtime, exit code                                 │
//! │                                                                         │
//! │  lib.rs ─────► tracing, config, backend, catalog, console               │
//! │                                                                         │
//! │  commands/ ──► add_to_cart, confirm_sale, collect_dues, ...             │
//! │                                                                         │
//! │  state/ ─────► CartState, CatalogState, CheckoutState, BackendState     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // The actual setup is in lib.rs for testability
    match khata_terminal::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("khata-terminal: {}", err);
            ExitCode::FAILURE
        }
    }
}
