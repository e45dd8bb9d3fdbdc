//! Layered configuration: config file, then environment, then CLI flags.
//!
//! The file lives at `<config dir>/docsearch/config.toml`. Environment
//! overrides (`DOCSEARCH_SITE`, `DOCSEARCH_LOCALE`, `DOCSEARCH_TIMEOUT_SECS`)
//! are read through dotenvy so a local `.env` works too.

use std::path::PathBuf;

use directories::ProjectDirs;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::data::DEFAULT_LOCALE;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("com", "docsearch", "docsearch"));

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site base URL, e.g. `https://authzed.com`. Empty means unset.
    pub site: String,
    pub locale: String,
    /// HTTP timeout for asset fetches.
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: String::new(),
            locale: DEFAULT_LOCALE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    PROJECT_DIRS
        .as_ref()
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Config {
    /// File config with environment overrides applied. A missing or
    /// malformed file falls back to defaults rather than failing; a bad
    /// config should never take the search CLI down.
    pub fn load() -> Self {
        let mut config = config_path()
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|raw| match toml::from_str::<Self>(&raw) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring malformed config file");
                    None
                }
            })
            .unwrap_or_default();

        if let Ok(site) = dotenvy::var("DOCSEARCH_SITE") {
            config.site = site;
        }
        if let Ok(locale) = dotenvy::var("DOCSEARCH_LOCALE") {
            config.locale = locale;
        }
        if let Ok(timeout) = dotenvy::var("DOCSEARCH_TIMEOUT_SECS")
            && let Ok(secs) = timeout.parse()
        {
            config.timeout_secs = secs;
        }
        config
    }
}
