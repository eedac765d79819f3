use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when RUST_LOG is unset
const DEFAULT_DIRECTIVE: &str = "txn_geoflow=info";

/// Initializes console logging on stderr so stdout stays free for JSON output.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("txn_geoflow=debug")
        } else {
            EnvFilter::new(DEFAULT_DIRECTIVE)
        }
    });

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    // try_init: a second call (e.g. from tests) is a no-op
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
