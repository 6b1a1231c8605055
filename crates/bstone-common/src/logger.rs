//! Console logger backing the `log` facade.
//!
//! Every crate logs through `log::{info, warn, error, debug}`. This backend
//! writes to stdout (warnings and errors to stderr) unless a redirect buffer
//! is active, in which case the output is captured instead. Debug and trace
//! records are dropped unless developer mode is on.

use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

static RD_BUFFER: Mutex<Option<String>> = parking_lot::const_mutex(None);
static DEVELOPER: AtomicBool = AtomicBool::new(false);
static LOGGER: ConsoleLogger = ConsoleLogger;

/// The process-wide console logger.
pub struct ConsoleLogger;

impl ConsoleLogger {
    /// Install the console logger as the global `log` backend.
    ///
    /// Calling this more than once only updates the developer flag.
    pub fn init(developer: bool) {
        let _ = log::set_logger(&LOGGER);
        set_developer(developer);
    }
}

/// Enable or disable developer output (the "developer" cvar).
pub fn set_developer(enabled: bool) {
    DEVELOPER.store(enabled, Ordering::Relaxed);
    log::set_max_level(if enabled {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    });
}

pub fn is_developer() -> bool {
    DEVELOPER.load(Ordering::Relaxed)
}

// ============================================================
// Redirection
// ============================================================

/// Begin capturing console output into a buffer.
pub fn begin_redirect() {
    *RD_BUFFER.lock() = Some(String::new());
}

/// Stop capturing and return everything printed since `begin_redirect`.
pub fn end_redirect() -> Option<String> {
    RD_BUFFER.lock().take()
}

/// Render one console line for a record.
pub fn format_line(level: Level, args: &fmt::Arguments<'_>) -> String {
    match level {
        Level::Error => format!("ERROR: {}\n", args),
        Level::Warn => format!("WARNING: {}\n", args),
        _ => format!("{}\n", args),
    }
}

fn console_print(level: Level, line: &str) {
    {
        let mut buf = RD_BUFFER.lock();
        if let Some(ref mut s) = *buf {
            s.push_str(line);
            return;
        }
    }

    if level <= Level::Warn {
        eprint!("{}", line);
    } else {
        print!("{}", line);
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= Level::Info || is_developer()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_line(record.level(), record.args());
        console_print(record.level(), &line);
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
    }
}
