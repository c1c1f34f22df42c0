//! Logging setup.
//!
//! The provider logs through `tracing`. Output goes to **stderr** so stdout
//! stays free for whatever the host uses it for. Every API call logs its
//! method and path at `debug`; resource reconcilers run inside spans named
//! after the operation.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls log levels (e.g., `info`, `debug`, `cloudkarafka_provider=debug`)
//!
//! # Examples
//!
//! ```bash
//! # Show info logs (default)
//! RUST_LOG=info ./provider
//!
//! # Show every API request and poll tick
//! RUST_LOG=cloudkarafka_provider=debug ./provider
//!
//! # Only the readiness waits
//! RUST_LOG=warn,cloudkarafka_provider::poll=debug ./provider
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn subscriber(
    default_level: &str,
) -> impl tracing::Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry().with(filter(default_level)).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    )
}

/// Initialize the default logging subscriber at `info`.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default("info");
}

/// Initialize logging with a custom default level, used when `RUST_LOG` is unset.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    subscriber(default_level).init();
}

/// Try to initialize logging, returning false if already initialized.
///
/// Safe to call from several tests in one process.
pub fn try_init_logging() -> bool {
    subscriber("info").try_init().is_ok()
}
