use std::io::{IsTerminal, Write};
use std::time::Instant;

use anstyle::{AnsiColor, Style};
use log::{Level, Log, Metadata, Record};

struct MdevLogger {
    filter: log::LevelFilter,
    color: bool,
    start: Instant,
}

impl Log for MdevLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut stderr = std::io::stderr().lock();
        let label = level_label(record.level());
        if self.color {
            let style = level_style(record.level());
            let _ = write!(stderr, "{style}{label}{style:#} ");
        } else {
            let _ = write!(stderr, "{label} ");
        }
        if self.filter >= log::LevelFilter::Debug {
            let elapsed = self.start.elapsed().as_secs_f64();
            let _ = write!(stderr, "[{elapsed:.3}s] {}: ", record.target());
        }
        let _ = writeln!(stderr, "{}", record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_label(level: Level) -> &'static str {
    match level {
        Level::Error => "error:",
        Level::Warn => "warn:",
        Level::Info => "==>",
        Level::Debug => "debug:",
        Level::Trace => "trace:",
    }
}

/// Map a log level to the style used on a terminal.
#[must_use]
pub fn level_style(level: Level) -> Style {
    let color = match level {
        Level::Error => AnsiColor::Red,
        Level::Warn => AnsiColor::Yellow,
        Level::Info => AnsiColor::Blue,
        Level::Debug | Level::Trace => AnsiColor::BrightBlack,
    };
    Style::new().fg_color(Some(color.into())).bold()
}

/// Initialize the global logger. Must be called once before any logging.
///
/// # Panics
///
/// Panics if called more than once.
pub fn init() {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(log::LevelFilter::Info);

    let logger = MdevLogger {
        filter,
        color: std::io::stderr().is_terminal(),
        start: Instant::now(),
    };

    log::set_boxed_logger(Box::new(logger)).expect("logger already initialized");
    log::set_max_level(filter);
}
