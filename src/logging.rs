//! Tracing initialization.
//! Builds a subscriber with one console layer and an optional file layer, each
//! with its own level filter, in compact or JSON format.
//!
//! Behavior:
//! - Console level comes from LogLevel (no RUST_LOG override here).
//! - The file layer records at least info so a log file is useful even when the
//!   console only shows warnings.
//! - File logging uses tracing_appender::non_blocking; the returned guard must
//!   be held until exit.

use anyhow::{Result, anyhow};
use chrono::Local;
use fat_sort::LogLevel;
use fat_sort::output as out;
use fat_sort::platform::open_log_file_append;
use std::fmt as stdfmt;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::Registry;
use tracing_subscriber::util::SubscriberInitExt;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Local timestamp (YYYY-MM-DD HH:MM:SS)
struct LocalHumanTime;
impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> stdfmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%d %H:%M:%S"))
    }
}

#[inline]
fn console_filter(lvl: LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Quiet => LevelFilter::ERROR,
        LogLevel::Normal => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::TRACE,
    }
}

#[inline]
fn file_filter(lvl: LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Debug => LevelFilter::TRACE,
        _ => LevelFilter::INFO,
    }
}

fn console_layer(json: bool, filter: LevelFilter) -> BoxedLayer {
    if json {
        tsfmt::layer()
            .event_format(tsfmt::format().json())
            .with_timer(LocalHumanTime)
            .with_level(true)
            .with_target(false)
            .with_filter(filter)
            .boxed()
    } else {
        tsfmt::layer()
            .with_timer(LocalHumanTime)
            .with_level(true)
            .with_target(false)
            .compact()
            .with_filter(filter)
            .boxed()
    }
}

fn file_layer(json: bool, filter: LevelFilter, writer: NonBlocking) -> BoxedLayer {
    if json {
        tsfmt::layer()
            .event_format(tsfmt::format().json())
            .with_timer(LocalHumanTime)
            .with_level(true)
            .with_target(false)
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(filter)
            .boxed()
    } else {
        tsfmt::layer()
            .with_timer(LocalHumanTime)
            .with_level(true)
            .with_target(false)
            .with_ansi(false)
            .compact()
            .with_writer(writer)
            .with_filter(filter)
            .boxed()
    }
}

/// Open `path` for appending behind a non-blocking writer. Failure is reported
/// to the user and file logging is skipped.
fn maybe_open_non_blocking_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    match open_log_file_append(path) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(e) => {
            out::print_warn(&format!(
                "Could not open log file '{}': {e}. Logging to console only.",
                path.display()
            ));
            None
        }
    }
}

/// Initialize tracing. Returns the WorkerGuard of the file writer, if any.
pub fn init_tracing(
    lvl: LogLevel,
    log_file: Option<&Path>,
    json: bool,
) -> Result<Option<WorkerGuard>> {
    let mut layers: Vec<BoxedLayer> = vec![console_layer(json, console_filter(lvl))];
    let mut guard = None;

    if let Some(path) = log_file
        && let Some((writer, g)) = maybe_open_non_blocking_writer(path)
    {
        layers.push(file_layer(json, file_filter(lvl), writer));
        guard = Some(g);
    }

    registry()
        .with(layers)
        .try_init()
        .map_err(|e| anyhow!("install tracing subscriber: {e}"))?;
    Ok(guard)
}
