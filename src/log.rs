//! Structured logging for the configurator.
//!
//! Log levels:
//! - ERROR: Failures that stop a job or leave the node database untouched
//! - WARN: Rejected requests, aborted event processing
//! - INFO: Job lifecycle and parsed DCD content
//! - DEBUG: Task requests, retries, scheduling decisions
//! - TRACE: Every forwarded stack event
//!
//! Debug mode can be enabled with `init_with_debug(true)` or
//! `BTMESH_CONF_DEBUG=1` env var.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::OnceLock;

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

/// Log levels for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// The next more severe level, `None` for `Error`.
    fn more_severe(self) -> Option<Self> {
        match self {
            LogLevel::Error => None,
            other => Some(LogLevel::from_u8(other as u8 - 1)),
        }
    }
}

/// Initialize logging to ~/.btmesh-conf/btmesh-conf.log
pub fn init() {
    init_with_debug(false);
}

/// Initialize logging with explicit debug mode setting.
pub fn init_with_debug(debug: bool) {
    let env_debug = std::env::var("BTMESH_CONF_DEBUG")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false);

    let debug_enabled = debug || env_debug;
    DEBUG_ENABLED.store(debug_enabled, Ordering::SeqCst);

    let level = if debug_enabled {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);

    if let Some(dir) = dirs::home_dir().map(|h| h.join(".btmesh-conf")) {
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("btmesh-conf.log");
        // Truncate file on startup
        let _ = std::fs::write(&path, "");
        LOG_PATH.set(path).ok();
    }
}

/// Check if debug mode is enabled.
pub fn is_debug() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Set the minimum log level for output.
pub fn set_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

/// Get the current log level.
pub fn get_level() -> LogLevel {
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Whether a message at `level` would reach the log sink.
pub fn is_enabled(level: LogLevel) -> bool {
    LOG_PATH.get().is_some() && level <= get_level()
}

/// Whether `start` or any more severe level is enabled.
///
/// Lets callers skip building log-only strings when nothing at or above
/// `start` would be written.
pub fn any_severe_log_level(start: LogLevel) -> bool {
    let mut level = Some(start);
    while let Some(current) = level {
        if is_enabled(current) {
            return true;
        }
        level = current.more_severe();
    }
    false
}

/// Log a message at the specified level.
pub fn log_at(level: LogLevel, msg: &str) {
    if !is_enabled(level) {
        return;
    }

    if let Some(path) = LOG_PATH.get() {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
            let _ = writeln!(file, "[{}] [{}] {}", timestamp, level.as_str(), msg);
        }
    }
}

/// Log a message at INFO level.
pub fn log(msg: &str) {
    log_at(LogLevel::Info, msg);
}

/// Log a message at ERROR level.
pub fn error(msg: &str) {
    log_at(LogLevel::Error, msg);
}

/// Log a message at WARN level.
pub fn warn(msg: &str) {
    log_at(LogLevel::Warn, msg);
}

/// Log a message at DEBUG level (only in debug mode).
pub fn debug(msg: &str) {
    log_at(LogLevel::Debug, msg);
}

/// Log a message at TRACE level (very verbose).
pub fn trace(msg: &str) {
    log_at(LogLevel::Trace, msg);
}

/// Log macro for INFO level.
///
/// Arguments are only formatted when the level is enabled.
#[macro_export]
macro_rules! mlog {
    ($($arg:tt)*) => {
        if $crate::log::is_enabled($crate::log::LogLevel::Info) {
            $crate::log::log(&format!($($arg)*))
        }
    };
}

/// Log macro for ERROR level.
#[macro_export]
macro_rules! mlog_error {
    ($($arg:tt)*) => {
        if $crate::log::is_enabled($crate::log::LogLevel::Error) {
            $crate::log::error(&format!($($arg)*))
        }
    };
}

/// Log macro for WARN level.
#[macro_export]
macro_rules! mlog_warn {
    ($($arg:tt)*) => {
        if $crate::log::is_enabled($crate::log::LogLevel::Warn) {
            $crate::log::warn(&format!($($arg)*))
        }
    };
}

/// Log macro for DEBUG level.
#[macro_export]
macro_rules! mlog_debug {
    ($($arg:tt)*) => {
        if $crate::log::is_enabled($crate::log::LogLevel::Debug) {
            $crate::log::debug(&format!($($arg)*))
        }
    };
}

/// Log macro for TRACE level.
#[macro_export]
macro_rules! mlog_trace {
    ($($arg:tt)*) => {
        if $crate::log::is_enabled($crate::log::LogLevel::Trace) {
            $crate::log::trace(&format!($($arg)*))
        }
    };
}
