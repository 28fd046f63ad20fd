//! Runtime configuration for marksync.
//!
//! Resolved from `MARKSYNC_*` environment variables, or from a JSON file when
//! `MARKSYNC_CONFIG` points at one. A remote backend needs both the project
//! URL and the publishable key; with either missing the app runs on the
//! in-process backend.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::errors::ConfigError;

pub const DEFAULT_TABLE: &str = "bookmarks";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub table: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            anon_key: None,
            access_token: None,
            refresh_token: None,
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

fn env_setting(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

impl SyncConfig {
    /// Reads configuration from the individual environment variables.
    pub fn from_env() -> Self {
        Self {
            backend_url: env_setting("MARKSYNC_BACKEND_URL"),
            anon_key: env_setting("MARKSYNC_ANON_KEY"),
            access_token: env_setting("MARKSYNC_ACCESS_TOKEN"),
            refresh_token: env_setting("MARKSYNC_REFRESH_TOKEN"),
            table: env_setting("MARKSYNC_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
        }
    }

    /// Loads configuration from a JSON file. Missing fields take defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))
    }

    /// File-first resolution: `MARKSYNC_CONFIG` names a file when set,
    /// otherwise the individual variables apply.
    pub fn load() -> Result<Self, ConfigError> {
        match env_setting("MARKSYNC_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::from_env()),
        }
    }

    /// True when a remote backend is fully configured.
    pub fn has_remote(&self) -> bool {
        self.backend_url.is_some() && self.anon_key.is_some()
    }

    /// Backend URL and key, or an error naming whichever is missing.
    pub fn remote(&self) -> Result<(&str, &str), ConfigError> {
        let url = self
            .backend_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingKey("backend_url".to_string()))?;
        let key = self
            .anon_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingKey("anon_key".to_string()))?;
        Ok((url, key))
    }
}
