// src/logging.rs
// =============================================================================
// Sets up logging for the whole program.
//
// We use the `tracing` crate for log statements and `tracing-subscriber`
// to print them. Logs go to stderr so they never mix with the JSON report
// on stdout.
//
// Log level:
// - RUST_LOG wins if it is set (e.g. RUST_LOG=sitemap_crawler=trace)
// - otherwise -v / -vv / -vvv pick info / debug / trace
// - default is warn for dependencies and info for us
// =============================================================================

use tracing_subscriber::EnvFilter;

pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,sitemap_crawler={level}")));

    // try_init fails only if a subscriber is already installed, which is fine
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
