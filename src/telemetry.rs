//! Tracing setup: human-readable lines on stderr, or a JSON trace file when
//! `VOXCMDR_TRACE_LOG` points somewhere writable.

use crate::config::AppConfig;
use std::env;
use std::fs::OpenOptions;
use std::sync::OnceLock;
use tracing::Level;
use tracing_subscriber::fmt::time::UtcTime;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Install the global subscriber. Safe to call more than once; only the first
/// call wins.
pub fn init_tracing(config: &AppConfig) {
    let level = if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let _ = TRACING_INIT.get_or_init(|| {
        if let Ok(path) = env::var("VOXCMDR_TRACE_LOG") {
            if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
                let subscriber = tracing_subscriber::fmt()
                    .json()
                    .with_timer(UtcTime::rfc_3339())
                    .with_writer(file)
                    .with_max_level(level)
                    .with_current_span(false)
                    .with_span_list(false)
                    .finish();
                let _ = tracing::subscriber::set_global_default(subscriber);
                return;
            }
        }

        let subscriber = tracing_subscriber::fmt()
            .with_timer(UtcTime::rfc_3339())
            .with_writer(std::io::stderr)
            .with_max_level(level)
            .with_target(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
