//! quasi_newton::observer — slog loggers for optimizer progress.
//!
//! The native engine writes structured records to whatever
//! [`slog::Logger`] it is handed. These helpers build the two loggers the
//! rest of the crate uses: a discarding root for quiet runs and an
//! asynchronous terminal logger for verbose runs (the same `slog-term` +
//! `slog-async` pairing `argmin_observer_slog` uses for its terminal
//! observer).
use slog::{Drain, Level, LevelFilter, Logger, o};

/// Logger that drops every record.
pub fn discard_logger() -> Logger {
    Logger::root(slog::Discard, o!())
}

/// Asynchronous stderr logger passing records at `level` or above.
pub fn term_logger(level: Level) -> Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = LevelFilter::new(drain, level).fuse();
    Logger::root(drain, o!("crate" => "rust_pulse"))
}
