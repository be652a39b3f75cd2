use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Default signed-URL lifetime: 30 days.
pub const DEFAULT_URL_TTL_SECS: u64 = 2_592_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown stage: {0}")]
    UnknownStage(String),
}

/// Per-stage resource wiring: where records and media for one deployment
/// environment live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    pub table: String,
    pub region: String,
    pub bucket: String,
    #[serde(default = "default_url_ttl")]
    pub url_ttl_secs: u64,
}

fn default_url_ttl() -> u64 {
    DEFAULT_URL_TTL_SECS
}

/// The full stage map, loaded from a `resources.json`-style file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagesConfig {
    pub stages: BTreeMap<String, StageConfig>,
}

impl StagesConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Look up a stage; unknown names are a per-source configuration error,
    /// never a panic.
    pub fn stage(&self, name: &str) -> Result<&StageConfig, ConfigError> {
        self.stages
            .get(name)
            .ok_or_else(|| ConfigError::UnknownStage(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.stages.contains_key(name)
    }
}
