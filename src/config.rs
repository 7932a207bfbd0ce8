use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::persist::DEFAULT_CHUNK_SIZE;

/// Pipeline configuration: where uploads land, where the job store lives,
/// and how large a persisted chunk is. Values come from `config.toml` when
/// present, with environment overrides (`UPLOAD_DIR`, `DATABASE_PATH`,
/// `INGEST_CHUNK_SIZE`) applied on top.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_upload_dir() -> String {
    "data/uploads".to_string()
}

fn default_database_path() -> String {
    "data/jobs.db".to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            database_path: default_database_path(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl IngestConfig {
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = if path.as_ref().exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                IngestError::Config(format!(
                    "failed to read config file '{}': {}",
                    path.as_ref().display(),
                    e
                ))
            })?;
            toml::from_str(&content)
                .map_err(|e| IngestError::Config(format!("malformed config file: {e}")))?
        } else {
            debug!(
                "config file '{}' not found, using defaults",
                path.as_ref().display()
            );
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("UPLOAD_DIR") {
            self.upload_dir = dir;
        }
        if let Ok(path) = std::env::var("DATABASE_PATH") {
            self.database_path = path;
        }
        if let Ok(size) = std::env::var("INGEST_CHUNK_SIZE") {
            if let Ok(parsed) = size.parse::<usize>() {
                self.chunk_size = parsed.max(1);
            }
        }
    }
}
