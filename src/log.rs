//! File logging for donkeykong.
//!
//! Log levels:
//! - ERROR: Failures reported to the caller
//! - WARN: Unexpected but recoverable conditions
//! - INFO: High-level notifications
//! - DEBUG: Removals, skipped tasks, run summaries
//! - TRACE: Traversal passes and per-output decisions
//!
//! Nothing is written until [`init`] or [`init_with_debug`] is called.
//! Debug mode can also be enabled with `DONKEYKONG_DEBUG=1`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::OnceLock;

const DEBUG_ENV: &str = "DONKEYKONG_DEBUG";

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

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
}

/// Initialize logging to ~/.donkeykong/donkeykong.log
pub fn init() {
    init_with_debug(false);
}

pub fn init_with_debug(debug: bool) {
    let level = if debug || env_debug() {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);

    if let Some(dir) = dirs::home_dir().map(|h| h.join(".donkeykong")) {
        init_at(&dir.join("donkeykong.log"));
    }
}

/// Log to an explicit file instead of the home directory.
///
/// Only the first successful call sets the path; the file is truncated.
pub fn init_at(path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(path, "");
    LOG_PATH.set(path.to_path_buf()).ok();
}

fn env_debug() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn set_level(level: LogLevel) {
    LOG_LEVEL.store(level as u8, Ordering::SeqCst);
}

pub fn get_level() -> LogLevel {
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

pub fn log_at(level: LogLevel, msg: &str) {
    if level > get_level() {
        return;
    }

    if let Some(path) = LOG_PATH.get() {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
            let _ = writeln!(file, "[{}] [{}] {}", timestamp, level.as_str(), msg);
        }
    }
}

pub fn debug(msg: &str) {
    log_at(LogLevel::Debug, msg);
}

pub fn trace(msg: &str) {
    log_at(LogLevel::Trace, msg);
}

/// Log at DEBUG level. Formatting is skipped below that level.
#[macro_export]
macro_rules! dklog_debug {
    ($($arg:tt)*) => {
        if $crate::log::get_level() >= $crate::log::LogLevel::Debug {
            $crate::log::debug(&format!($($arg)*))
        }
    };
}

/// Log at TRACE level. Formatting is skipped below that level.
#[macro_export]
macro_rules! dklog_trace {
    ($($arg:tt)*) => {
        if $crate::log::get_level() >= $crate::log::LogLevel::Trace {
            $crate::log::trace(&format!($($arg)*))
        }
    };
}
