//! Logging and tracing setup
//!
//! Call [`init`] once at startup. Verbosity comes from `RUST_LOG`:
//! ```bash
//! RUST_LOG=debug ./apkmeta                      # Everything at debug
//! RUST_LOG=apkmeta_lib::batch=trace ./apkmeta   # One module
//! RUST_LOG=warn ./apkmeta                       # Skipped files and failures only
//! ```
//!
//! Without `RUST_LOG`, debug builds log this crate at `debug` and release
//! builds at `info`.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn default_filter() -> EnvFilter {
    if cfg!(debug_assertions) {
        EnvFilter::new("apkmeta=debug,apkmeta_lib=debug")
    } else {
        EnvFilter::new("info")
    }
}

/// Install the global subscriber (compact, with targets)
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter());

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact(),
    );

    // Already set (tests, repeated init) is fine
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Install a pretty subscriber with file:line and thread names, everything at trace
pub fn init_verbose() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace"));

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
            .pretty(),
    );

    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Whether debug logs are enabled; skip building expensive log fields otherwise
#[inline]
pub fn is_debug_enabled() -> bool {
    tracing::enabled!(Level::DEBUG)
}
