use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::str::FromStr;

/// Console sink for the `log` facade, `[2024-01-01 12:00:00] WARN message`.
pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    fn line(record: &Record) -> String {
        let now = Local::now();
        format!("[{}] {} {}", now.format("%Y-%m-%d %H:%M:%S"), record.level(), record.args())
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error | Level::Warn => eprintln!("{}", Self::line(record)),
            _ => println!("{}", Self::line(record)),
        }
    }

    fn flush(&self) {}
}

/// Installs [`ConsoleLogger`] as the global logger. Fails if a logger was already set,
/// which embedding applications with their own logger can ignore.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(ConsoleLogger::new(level)))?;
    log::set_max_level(level);
    Ok(())
}

/// Same as [`init`] but takes the level by name ("info", "debug", ...), falling back to info.
pub fn init_with(level: &str) -> Result<(), SetLoggerError> {
    init(LevelFilter::from_str(level).unwrap_or(LevelFilter::Info))
}
