//! Logging system demonstration
//!
//! This example shows how to use the logging infrastructure in different modes.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # Compact format
//! cargo run --example logging_demo -- compact
//!
//! # With custom filter
//! cargo run --example logging_demo -- pretty "logging_demo=trace"
//! ```

use bridge_traits::time::LogLevel;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::env;
use tracing::{debug, error, info, instrument, span, trace, warn, Level};

fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_spans(true)
        .with_target(true);

    // The default filter only covers workspace crates; examples are their own crate.
    config = config.with_filter(
        args.get(2)
            .cloned()
            .unwrap_or_else(|| "warn,logging_demo=trace".to_string()),
    );

    init_logging(config).expect("Failed to initialize logging");

    info!("=== Logging System Demo ===");
    info!(format = ?format, "Logging initialized");

    demo_log_levels();
    demo_structured_logging();
    demo_spans();
    demo_instrumentation();

    info!("=== Demo Complete ===");
}

fn demo_log_levels() {
    let span = span!(Level::INFO, "log_levels");
    let _enter = span.enter();

    trace!("This is a TRACE level log");
    debug!("This is a DEBUG level log");
    info!("This is an INFO level log");
    warn!("This is a WARN level log");
    error!("This is an ERROR level log");
}

fn demo_structured_logging() {
    let span = span!(Level::INFO, "structured_logging");
    let _enter = span.enter();

    info!("Simple message without fields");

    info!(
        dbidx = 12,
        rrn = 40,
        path = "waltz/moon-river.mp3",
        dance = "Waltz",
        "Song information"
    );

    warn!(token = "SAMBA", "Unknown sort token");
}

fn demo_spans() {
    let span = span!(Level::INFO, "load", db = "musicdb.dat");
    let _enter = span.enter();

    info!("Loading library");

    {
        let inner_span = span!(Level::DEBUG, "scan_records");
        let _inner = inner_span.enter();

        debug!(count = 150, "Read records from store");
    }

    {
        let inner_span = span!(Level::DEBUG, "check_audio_files");
        let _inner = inner_span.enter();

        debug!(missing = 2, total = 150, "Checked audio files");
    }

    info!(count = 148, "Library loaded");
}

#[instrument]
fn demo_instrumentation() {
    info!("Instrumented function automatically creates spans");

    let songs = vec!["a.mp3", "b.mp3", "c.mp3"];
    filter_songs(&songs);
}

#[instrument(fields(count = songs.len()))]
fn filter_songs(songs: &[&str]) {
    debug!("Filtering songs");

    for (idx, song) in songs.iter().enumerate() {
        check_song(idx, song);
    }

    info!("All songs filtered");
}

#[instrument(fields(dbidx = idx))]
fn check_song(idx: usize, song: &str) {
    trace!(path = %song, "Checking song");
}
