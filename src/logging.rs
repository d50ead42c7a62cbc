// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Stderr logger
//!
//! The scheduler logs through the `log` facade. Applications that already
//! install a logger need nothing from here; `init` is a small colourized
//! backend for everyone else.

use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

/// Logger writing one line per record to stderr
pub struct StderrLogger {
    level: AtomicU8,
}

// ANSI colour per log level, indexed by level number
const LEVEL_COLOURS: [&str; 6] = [
    "\x1b[0m",  // Off
    "\x1b[31m", // Error
    "\x1b[33m", // Warn
    "\x1b[32m", // Info
    "\x1b[34m", // Debug
    "\x1b[36m", // Trace
];

const RESET_COLOUR: &str = "\x1b[0m";

const fn level_to_u8(level: LevelFilter) -> u8 {
    match level {
        LevelFilter::Off => 0,
        LevelFilter::Error => 1,
        LevelFilter::Warn => 2,
        LevelFilter::Info => 3,
        LevelFilter::Debug => 4,
        LevelFilter::Trace => 5,
    }
}

const fn level_from_u8(value: u8) -> LevelFilter {
    match value {
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        5 => LevelFilter::Trace,
        _ => LevelFilter::Off,
    }
}

impl StderrLogger {
    /// Create a logger passing records up to `level`
    pub const fn new(level: LevelFilter) -> Self {
        Self {
            level: AtomicU8::new(level_to_u8(level)),
        }
    }

    /// Current level
    pub fn level(&self) -> LevelFilter {
        level_from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Change the level
    pub fn set_level(&self, level: LevelFilter) {
        self.level.store(level_to_u8(level), Ordering::Relaxed);
    }

    fn colour(level: Level) -> &'static str {
        LEVEL_COLOURS.get(level as usize).copied().unwrap_or(RESET_COLOUR)
    }
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut err = std::io::stderr().lock();
        // Nothing sensible to do if stderr is gone
        let _ = writeln!(
            err,
            "{}[{}] - {}: {}{}",
            Self::colour(record.level()),
            record.level(),
            record.target(),
            record.args(),
            RESET_COLOUR
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: StderrLogger = StderrLogger::new(LevelFilter::Info);

/// Install the stderr logger at `level`
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Trace))?;
    LOGGER.set_level(level);
    log::info!("log level set to {}", level);
    Ok(())
}
