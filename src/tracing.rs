//! Logging setup for the replay tool and embedding hosts
//!
//! Console output respects `RUST_LOG`:
//! - `RUST_LOG=debug` - matches, vetoes, stops and releases
//! - `RUST_LOG=chordwatch::shortcuts=trace` - every key event and ignored key
//!
//! Logs are also written to `~/.config/chordwatch/logs/chordwatch.log` with
//! daily rotation, always at debug level.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize console and file logging
///
/// `default_filter` applies to the console when `RUST_LOG` is unset.
pub fn init(default_filter: &str) {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(console_filter);

    let file_layer = match crate::config_paths::ensure_logs_dir() {
        Ok(logs_dir) => {
            let file_appender = tracing_appender::rolling::daily(logs_dir, "chordwatch.log");
            Some(
                fmt::layer()
                    .with_writer(file_appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        Err(e) => {
            eprintln!("Warning: Could not initialize file logging: {}", e);
            None
        }
    };

    // A host may already own the global subscriber
    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
