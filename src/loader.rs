use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use metrics::histogram;
use tracing::{debug, info};

use crate::error::{IngestError, Result};
use crate::table::RawTable;

/// Load an uploaded file into a [`RawTable`], dispatching on the file
/// extension (case-insensitive). CSV uses the header row as column names;
/// Excel workbooks use the first worksheet with its first row as the header.
pub fn load_table(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let t0 = std::time::Instant::now();
    let table = match ext.as_str() {
        "csv" => load_csv(path)?,
        "xlsx" | "xls" => load_workbook(path)?,
        _ => return Err(IngestError::UnsupportedFileType(ext)),
    };
    histogram!("ingest_load_duration_seconds").record(t0.elapsed().as_secs_f64());

    info!(
        "loaded {} rows x {} columns from {}",
        table.row_count(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

fn load_csv(path: &Path) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let columns = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect::<Vec<_>>();

    let mut table = RawTable::new(columns);
    for result in rdr.records() {
        let record = result?;
        table
            .rows
            .push(record.iter().map(|c| c.to_string()).collect());
    }
    Ok(table)
}

fn load_workbook(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(IngestError::Workbook(calamine::Error::Msg(
            "workbook has no worksheets",
        )))?;
    debug!("reading first worksheet '{}'", sheet);

    let range = workbook.worksheet_range(&sheet)?;
    let mut rows = range.rows();
    let columns = match rows.next() {
        Some(header) => header.iter().map(|c| cell_to_string(c)).collect(),
        None => Vec::new(),
    };

    let mut table = RawTable::new(columns);
    for row in rows {
        table.rows.push(row.iter().map(cell_to_string).collect());
    }
    Ok(table)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}
