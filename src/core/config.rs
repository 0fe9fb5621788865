use std::path::PathBuf;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Collection name, also the snapshot file stem
    pub name: String,
    /// Directory holding the persistent snapshot; `None` keeps everything in memory
    pub storage_path: Option<PathBuf>,

    pub search_limit: usize,                    // default page size for search/aggregate
    pub hits_limit: usize,                      // default page size for aggregate hits
    pub highlight: HighlightConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub max_prefix: usize,
    pub max_length: usize,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        HighlightConfig {
            max_prefix: 20,
            max_length: 50,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            name: "default".to_string(),
            storage_path: None,
            search_limit: 100,
            hits_limit: 3,
            highlight: HighlightConfig::default(),
        }
    }
}

impl Config {
    pub fn named(name: impl Into<String>) -> Self {
        Config {
            name: name.into(),
            ..Config::default()
        }
    }

    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Path of the snapshot file, when persistence is enabled.
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.storage_path
            .as_ref()
            .map(|dir| dir.join(format!("{}.idx", self.name)))
    }
}
