//! Console configuration: built-in defaults, then `config.toml`, then flags.

use crate::session::TOKEN_FILE_NAME;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const APP_DIR: &str = "terraconsole";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    pub api_url: String,
    pub token_path: PathBuf,
    /// How often a watched run is re-fetched while it is not terminal.
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_path: data_dir().join(TOKEN_FILE_NAME),
            poll_interval: Duration::from_secs(3),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// On-disk shape. Every field is optional; absent fields keep the default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    api_url: Option<String>,
    token_path: Option<PathBuf>,
    #[serde(default, with = "humantime_serde")]
    poll_interval: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    request_timeout: Option<Duration>,
}

/// `<config_dir>/terraconsole/config.toml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE_NAME)
}

/// `<data_dir>/terraconsole`, holding the session token and the TUI log.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl ConsoleConfig {
    /// Load from `path`, or the default location when `None`.
    ///
    /// A missing file yields the defaults. A file that is present but not
    /// valid TOML is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_path);
        let mut cfg = Self::default();

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(cfg);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read config {}", path.display()));
            }
        };
        let file: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("parse config {}", path.display()))?;
        cfg.merge(file);
        Ok(cfg)
    }

    fn merge(&mut self, file: ConfigFile) {
        if let Some(url) = file.api_url {
            self.set_api_url(&url);
        }
        if let Some(p) = file.token_path {
            self.token_path = p;
        }
        if let Some(d) = file.poll_interval {
            self.poll_interval = d;
        }
        if let Some(d) = file.request_timeout {
            self.request_timeout = d;
        }
    }

    pub fn set_api_url(&mut self, url: &str) {
        self.api_url = url.trim().trim_end_matches('/').to_string();
    }

    /// Apply command-line overrides on top of the loaded file.
    pub fn with_overrides(mut self, api_url: Option<&str>) -> Self {
        if let Some(url) = api_url {
            self.set_api_url(url);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ConsoleConfig::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(cfg, ConsoleConfig::default());
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.poll_interval, Duration::from_secs(3));
    }

    #[test]
    fn file_values_override_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "api_url = \"https://tc.example.com/api/\"\npoll_interval = \"500ms\"\nrequest_timeout = \"1m\""
        )
        .unwrap();
        let cfg = ConsoleConfig::load(Some(f.path())).unwrap();
        assert_eq!(cfg.api_url, "https://tc.example.com/api");
        assert_eq!(cfg.poll_interval, Duration::from_millis(500));
        assert_eq!(cfg.request_timeout, Duration::from_secs(60));
        assert_eq!(cfg.token_path, ConsoleConfig::default().token_path);
    }

    #[test]
    fn malformed_file_is_an_error_naming_the_path() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "api_url = ").unwrap();
        let err = ConsoleConfig::load(Some(f.path())).unwrap_err();
        assert!(format!("{err:#}").contains(&f.path().display().to_string()));
    }

    #[test]
    fn flag_override_wins_and_is_trimmed() {
        let cfg = ConsoleConfig::default().with_overrides(Some("http://10.0.0.2:8080/api//"));
        assert_eq!(cfg.api_url, "http://10.0.0.2:8080/api");
        let untouched = ConsoleConfig::default().with_overrides(None);
        assert_eq!(untouched.api_url, DEFAULT_API_URL);
    }
}
