//! Runtime configuration.
//!
//! Loaded from a JSON file; every field has a default so a partial file (or
//! no file at all) is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpliceError};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpliceConfig {
    pub history: HistoryConfig,
    pub jobs: JobConfig,
}

/// Undo history settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of records kept; the oldest are evicted first.
    pub max_depth: usize,
    /// Consecutive mergeable edits closer than this coalesce into one entry.
    /// `None` merges on target identity alone.
    pub merge_window_ms: Option<u64>,
}

impl HistoryConfig {
    pub fn merge_window(&self) -> Option<Duration> {
        self.merge_window_ms.map(Duration::from_millis)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: 200,
            merge_window_ms: Some(1000),
        }
    }
}

/// Background clip job settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// ffmpeg executable used by processing jobs.
    pub ffmpeg_binary: PathBuf,
    /// Maximum number of jobs running at once.
    pub max_parallel: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            ffmpeg_binary: Self::find_ffmpeg_binary(),
            max_parallel: num_cpus::get().max(1),
        }
    }
}

impl JobConfig {
    /// Search PATH for ffmpeg, falling back to the bare name.
    pub fn find_ffmpeg_binary() -> PathBuf {
        which::which("ffmpeg").unwrap_or_else(|_| PathBuf::from("ffmpeg"))
    }
}

impl SpliceConfig {
    /// Parse configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| SpliceError::Config(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Load from the default location, or defaults when no file exists there.
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            tracing::info!(path = %path.display(), "Loading configuration");
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("splice")
            .join("config.json")
    }

    fn validate(&self) -> Result<()> {
        if self.history.max_depth == 0 {
            return Err(SpliceError::Config(
                "history.max_depth must be at least 1".into(),
            ));
        }
        if self.jobs.max_parallel == 0 {
            return Err(SpliceError::Config(
                "jobs.max_parallel must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
