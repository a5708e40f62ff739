//! Persistence configuration from TOML (`[storage]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw storage configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// Local cache directory; defaults to `<data_dir>/agora/cache`
    pub local_dir: Option<PathBuf>,
    /// Durable mirror directory; absent means local-only
    pub remote_dir: Option<PathBuf>,
}

impl FileStorageConfig {
    /// Resolved local cache directory
    pub fn local_dir(&self) -> PathBuf {
        self.local_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("agora")
                .join("cache")
        })
    }
}
