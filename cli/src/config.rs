//! CLI defaults, loaded with `confy` from the platform config directory
//! (or an explicit `--config` path) and overridable by individual flags.

use serde_derive::{Deserialize, Serialize};

const APP_NAME: &str = "adya";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Isolation level used when a subcommand doesn't pass `--isolation`.
    pub default_isolation: Option<String>,

    /// Cap on the number of anomalies a `check` reports, None = unbounded.
    pub default_limit: Option<usize>,

    /// Directory rolling log files are written under.
    pub log_dir: Option<String>,

    pub log_level: Option<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            default_isolation: Some("PL-3".to_string()),
            default_limit: Some(100),
            log_dir: None,
            log_level: Some("info".to_string()),
        }
    }
}

impl CliConfig {
    /// Loads from `path` if given, otherwise from confy's default location
    /// for this app, falling back to [`Default`] if neither exists yet.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let cfg = match path {
            Some(p) => confy::load_path(p)?,
            None => confy::load(APP_NAME, None)?,
        };
        Ok(cfg)
    }

    pub fn log_dir(&self) -> String {
        self.log_dir.clone().unwrap_or_else(|| {
            format!("{}/.adya", std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
        })
    }

    pub fn log_level(&self) -> String {
        self.log_level.clone().unwrap_or_else(|| "info".to_string())
    }
}
