use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::loader;
use crate::mapper;
use crate::normalize::{self, JobRecord};
use crate::persist;
use crate::progress::{Progress, ProgressReporter};
use crate::storage::Storage;

pub const ERR_FILE_NOT_FOUND: &str = "file not found";
pub const ERR_INVALID_MAPPING: &str = "invalid mapping";
pub const NOTE_NO_VALID_ROWS: &str = "no valid rows after normalization";

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessFileParams {
    /// Name of the uploaded file inside the upload directory.
    pub file_id: String,
    /// Mapping of canonical field name -> source column name.
    #[serde(default)]
    pub column_map: Option<HashMap<String, String>>,
}

/// Outcome of one ingestion invocation. Serializes to the flat payloads the
/// task consumers expect; every expected failure mode is a variant here
/// rather than a panic or an opaque task error.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProcessFileResult {
    Completed {
        file_id: String,
        inserted: usize,
        total: usize,
        sample: Vec<JobRecord>,
    },
    NoValidRows {
        file_id: String,
        inserted: usize,
        note: String,
    },
    InvalidMapping {
        file_id: String,
        error: String,
        columns: Vec<String>,
    },
    Failed {
        file_id: String,
        error: String,
    },
}

impl ProcessFileResult {
    fn file_not_found(file_id: String) -> Self {
        ProcessFileResult::Failed {
            file_id,
            error: ERR_FILE_NOT_FOUND.to_string(),
        }
    }

    fn invalid_mapping(file_id: String, columns: Vec<String>) -> Self {
        ProcessFileResult::InvalidMapping {
            file_id,
            error: ERR_INVALID_MAPPING.to_string(),
            columns,
        }
    }

    fn no_valid_rows(file_id: String) -> Self {
        ProcessFileResult::NoValidRows {
            file_id,
            inserted: 0,
            note: NOTE_NO_VALID_ROWS.to_string(),
        }
    }

    fn failed(file_id: String, error: &IngestError) -> Self {
        ProcessFileResult::Failed {
            file_id,
            error: error.to_string(),
        }
    }
}

/// Run the full ingestion pipeline for one uploaded file: load, map,
/// normalize, persist in chunks. Each stage short-circuits into a structured
/// result; storage failures are captured the same way, after any chunks
/// already committed have become durable.
pub async fn process_file(
    storage: Arc<dyn Storage>,
    config: &IngestConfig,
    params: ProcessFileParams,
    progress: &dyn ProgressReporter,
) -> ProcessFileResult {
    let file_id = params.file_id;
    counter!("ingest_runs_total").increment(1);
    info!("processing upload '{}'", file_id);

    let path = Path::new(&config.upload_dir).join(&file_id);
    if !path.exists() {
        warn!("upload '{}' not found under {}", file_id, config.upload_dir);
        return ProcessFileResult::file_not_found(file_id);
    }

    progress.report(Progress::stage("loading"));
    let table = match loader::load_table(&path) {
        Ok(table) => table,
        Err(e) => {
            error!("failed to load '{}': {}", file_id, e);
            counter!("ingest_failures_total").increment(1);
            return ProcessFileResult::failed(file_id, &e);
        }
    };

    let column_map = params.column_map.unwrap_or_default();
    let plan = match mapper::resolve_rename_plan(&table, &column_map) {
        Ok(plan) => plan,
        Err(IngestError::InvalidMapping { columns }) => {
            warn!("no usable column mapping for '{}'", file_id);
            return ProcessFileResult::invalid_mapping(file_id, columns);
        }
        Err(e) => {
            counter!("ingest_failures_total").increment(1);
            return ProcessFileResult::failed(file_id, &e);
        }
    };
    info!("mapping resolved, {} columns kept", plan.len());

    let mapped = mapper::apply_rename_plan(&table, &plan);
    let records = normalize::normalize(&mapped);
    if records.is_empty() {
        info!("'{}' produced no valid rows after normalization", file_id);
        return ProcessFileResult::no_valid_rows(file_id);
    }

    let total = records.len();
    let sample: Vec<JobRecord> = records.iter().take(3).cloned().collect();

    match persist::persist_chunked(storage.as_ref(), &records, config.chunk_size, progress).await
    {
        Ok(inserted) => {
            info!("'{}' done, {}/{} records inserted", file_id, inserted, total);
            ProcessFileResult::Completed {
                file_id,
                inserted,
                total,
                sample,
            }
        }
        Err(e) => {
            error!("persistence failed for '{}': {}", file_id, e);
            counter!("ingest_failures_total").increment(1);
            ProcessFileResult::failed(file_id, &e)
        }
    }
}
