//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Write a JSONL transcript of conversation events per session
    pub conversation_log: bool,
    /// Directory for diagnostic logs and transcripts
    pub log_dir: Option<PathBuf>,
}

impl FileLoggingConfig {
    /// Directory used for transcripts; defaults to `<data_dir>/agora/logs`
    pub fn resolved_log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("agora")
                .join("logs")
        })
    }
}
