//! Structured logging system with visual formatting.
//!
//! This module provides the console logger used throughout solarshift. It
//! includes level prefixes and special formatting functions for structured
//! output with Unicode box drawing characters.
//!
//! The logger supports runtime enable/disable and a verbosity level, so the
//! scheduler can emit per-sample detail only when `--verbose 1` is given.
//! Every call is fire-and-forget: output goes straight to stdout.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static VERBOSITY: AtomicU8 = AtomicU8::new(0);

/// Log level enumeration for categorizing message importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Warn, // Warning messages (non-fatal issues)
    Err,  // Error messages (recoverable failures)
    Info, // Informational messages (status updates)
}

impl LogLevel {
    fn prefix(self) -> &'static str {
        match self {
            LogLevel::Warn => "[WARN] ",
            LogLevel::Err => "[ERR] ",
            LogLevel::Info => "[INFO] ",
        }
    }
}

/// Main logging interface providing structured output formatting.
pub struct Log;

impl Log {
    /// Enable or disable logging.
    ///
    /// Tests switch logging off so their output stays readable.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Set the verbosity level (0 for regular output, 1 or more for verbose).
    pub fn set_verbosity(level: u8) {
        VERBOSITY.store(level, Ordering::SeqCst);
    }

    pub fn verbosity() -> u8 {
        VERBOSITY.load(Ordering::SeqCst)
    }

    /// Format a message with its level prefix, without printing it.
    pub fn format(level: LogLevel, message: &str) -> String {
        format!("{}{}", level.prefix(), message)
    }

    /// Main log function with level-based prefixes.
    pub fn log(level: LogLevel, message: &str) {
        if !Self::is_enabled() {
            return;
        }
        println!("{}", Self::format(level, message));
    }

    // ═══ Convenience Methods for Common Log Levels ═══

    /// Log an error message.
    pub fn log_error(message: &str) {
        Self::log(LogLevel::Err, message);
    }

    /// Log a warning message.
    pub fn log_warning(message: &str) {
        Self::log(LogLevel::Warn, message);
    }

    /// Log an informational message.
    pub fn log_info(message: &str) {
        Self::log(LogLevel::Info, message);
    }

    /// Log an indented detail line, only when verbose output was requested.
    pub fn log_verbose(message: &str) {
        if Self::verbosity() == 0 {
            return;
        }
        Self::log_indented(message);
    }

    // ═══ Visual Formatting Functions ═══

    /// Log a decorated message with visual branching indicator.
    pub fn log_decorated(message: &str) {
        if !Self::is_enabled() {
            return;
        }
        println!("┣ {}", message);
    }

    /// Log an indented message for sub-items or details.
    pub fn log_indented(message: &str) {
        if !Self::is_enabled() {
            return;
        }
        println!("┃   {}", message);
    }

    /// Log a visual pipe separator.
    pub fn log_pipe() {
        if !Self::is_enabled() {
            return;
        }
        println!("┃");
    }

    /// Log a block start message with visual separation.
    pub fn log_block_start(message: &str) {
        if !Self::is_enabled() {
            return;
        }
        println!("┃");
        println!("┣ {}", message);
    }

    /// Log the application version header.
    pub fn log_version() {
        if !Self::is_enabled() {
            return;
        }
        println!("┏ solarshift v{} ━━╸", env!("CARGO_PKG_VERSION"));
        println!("┃");
    }

    /// Log the final termination marker.
    pub fn log_end() {
        if !Self::is_enabled() {
            return;
        }
        println!("╹");
    }
}
