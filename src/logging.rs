// Conditional logging macros - only active in debug builds

use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        log::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {{}};
}

#[cfg(debug_assertions)]
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        log::info!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {{}};
}

const LOG_FILE_NAME: &str = "flag-guesser.log";

/// Default log location: the user's cache directory, or the temp directory
/// when no cache directory is known.
#[must_use]
pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("flag-guesser")
        .join(LOG_FILE_NAME)
}

/// Routes `log` output to `path`. The terminal belongs to the game, so
/// nothing is written to stderr. Level comes from `RUST_LOG`, default `info`.
pub fn init(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .map_err(io::Error::other)
}
