//! Environment configuration, read once at startup.
//!
//! `DISCD_LOG` (tracing filter, default `info`), `DISCD_WORKSPACE` (workspace
//! opened before the first request) and `DISCD_TABLES_DIR` (directory whose
//! JSON tables replace the built-in ones).

use std::path::PathBuf;

pub const LOG_ENV: &str = "DISCD_LOG";
pub const WORKSPACE_ENV: &str = "DISCD_WORKSPACE";
pub const TABLES_DIR_ENV: &str = "DISCD_TABLES_DIR";

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub log_filter: String,
    pub workspace: Option<PathBuf>,
    pub tables_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        // Blank values count as unset.
        let get = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            log_filter: get(LOG_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            workspace: get(WORKSPACE_ENV).map(PathBuf::from),
            tables_dir: get(TABLES_DIR_ENV).map(PathBuf::from),
        }
    }
}
