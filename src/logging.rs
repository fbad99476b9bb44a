//! Tracing subscriber setup for the command-line tool.

use tracing_subscriber::{fmt, EnvFilter};

/// Default filter for a `-v` / `-q` balance.
///
/// Negative values quieten, positive values add detail.
pub fn default_level(verbosity: i8) -> &'static str {
    match verbosity {
        i8::MIN..=-1 => "warn",
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize logging to stderr.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
pub fn init(verbosity: i8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
