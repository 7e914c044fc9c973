// Tracing subscriber setup for embedding applications

use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber writing to stderr
///
/// `RUST_LOG` directives are honored; the default level is `info`, raised to
/// `trace` when `verbose` is set. Calling this more than once is harmless: a
/// subscriber installed earlier stays in place.
pub fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .try_init();
}
