//! Structured logging setup.
//!
//! Logs go to stderr so stdout stays free for the rendered table. Records
//! the library emits through `log` are picked up by the subscriber too.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging. `RUST_LOG` wins over `default_filter`.
///
/// # Example
///
/// ```no_run
/// use ew_client::logging;
///
/// logging::init("warn");
/// tracing::info!("client starting");
/// ```
pub fn init(default_filter: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::debug!("logging initialized");
}
