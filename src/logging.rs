//! Tracing subscriber setup.
//!
//! Line-oriented commands log to stderr. The TUI owns the terminal, so while
//! it runs logs are appended to a file under the data directory instead.

use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TERRACONSOLE_LOG";
const TUI_LOG_FILE: &str = "tui.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File,
}

/// Filter from `TERRACONSOLE_LOG`, else `debug` when verbose, else `warn`.
fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }))
}

pub fn tui_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(TUI_LOG_FILE)
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(target: LogTarget, verbose: bool, data_dir: &Path) {
    let filter = filter(verbose);
    match target {
        LogTarget::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogTarget::File => {
            let file = std::fs::create_dir_all(data_dir).and_then(|_| {
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(tui_log_path(data_dir))
            });
            match file {
                Ok(file) => {
                    let _ = tracing_subscriber::fmt()
                        .with_env_filter(filter)
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file))
                        .try_init();
                }
                Err(_) => {
                    let _ = tracing_subscriber::fmt()
                        .with_env_filter(filter)
                        .with_writer(std::io::sink)
                        .try_init();
                }
            }
        }
    }
}
