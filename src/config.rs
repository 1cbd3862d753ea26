//! Configuration file support for draftdex
//!
//! Reads from .draftdex/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    /// Ingestion settings
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Errors raised while reading an explicit config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Ingestion-related configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IngestConfig {
    /// Directory scanned by `draftdex ingest` when no directory is given
    /// Default: "downloads"
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Directory scanned by `draftdex ingest --flat` when no directory is given
    /// Default: "downloads/downloads_with_timestamp"
    #[serde(default = "default_flat_source_dir")]
    pub flat_source_dir: PathBuf,

    /// External draft ids of known-corrupt exports; matching files are skipped
    #[serde(default = "default_denied_draft_ids")]
    pub denied_draft_ids: Vec<String>,

    /// chrono formats tried in order against "<date> <time>" header values
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_flat_source_dir() -> PathBuf {
    PathBuf::from("downloads").join("downloads_with_timestamp")
}

fn default_denied_draft_ids() -> Vec<String> {
    vec!["860538035132".to_string(), "072501118051".to_string()]
}

fn default_date_formats() -> Vec<String> {
    [
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %I:%M:%S %p",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y, %I:%M:%S %p",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            flat_source_dir: default_flat_source_dir(),
            denied_draft_ids: default_denied_draft_ids(),
            date_formats: default_date_formats(),
        }
    }
}

impl IngestConfig {
    /// Check if an external draft id is on the denylist
    pub fn is_denied(&self, external_draft_id: &str) -> bool {
        let id = external_draft_id.trim();
        self.denied_draft_ids.iter().any(|d| d.trim() == id)
    }
}

impl Config {
    /// Load config from .draftdex/config.toml
    /// Returns default config if the file doesn't exist or can't be parsed
    pub fn load() -> Self {
        match Self::find_config_path() {
            Some(path) => Self::load_from(&path).unwrap_or_else(|e| {
                warn!("{}; using defaults", e);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Load config from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find config.toml by walking up directory tree
    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".draftdex").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }
}
