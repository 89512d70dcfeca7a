//! Logging setup utilities for the Hiroba chat client.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build the default filter directive for the given crates.
///
/// Crate names are normalized the way `tracing` reports targets
/// (`hiroba-client` becomes `hiroba_client`).
///
/// # Examples
///
/// ```
/// use hiroba_shared::logger::default_directive;
///
/// let directive = default_directive(&["hiroba-client", "hiroba"], "info");
/// assert_eq!(directive, "hiroba_client=info,hiroba=info");
/// ```
pub fn default_directive(crate_names: &[&str], default_log_level: &str) -> String {
    crate_names
        .iter()
        .map(|name| format!("{}={}", name.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
/// Logs are written to stderr so they do not interleave with the chat
/// transcript printed on stdout.
///
/// # Arguments
///
/// * `crate_names` - Crates whose events should be shown (e.g., `["hiroba-client", "hiroba"]`)
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use hiroba_shared::logger::setup_logger;
///
/// setup_logger(&["hiroba-client", "hiroba"], "warn");
/// ```
pub fn setup_logger(crate_names: &[&str], default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(crate_names, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
