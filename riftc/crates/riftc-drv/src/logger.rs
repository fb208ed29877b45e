//! Minimal stderr logger behind the `log` facade.
//!
//! The `-d` flag raises the level to Debug, which also carries the IR
//! dumps and collector cycle lines.

use log::{Level, LevelFilter, Log, Metadata, Record};

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if record.level() <= Level::Warn {
            eprintln!("{}: {}", record.level(), record.args());
        } else {
            eprintln!("{}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Install the logger. Safe to call more than once; later calls only
/// adjust the level.
pub fn init(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
