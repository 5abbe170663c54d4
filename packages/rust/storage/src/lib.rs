//! Delimited-table storage for castgraph.
//!
//! [`RawTable`] is the untyped header + rows view of a CSV file; the codecs in
//! this crate turn it into the typed tables from `castgraph-shared`.
//!
//! **Cell rules:**
//! - an empty cell is read as `None`
//! - `None` and `Some("")` are both written as an empty cell
//! - only column presence is validated, never cell contents

mod codec;

use std::fs::File;
use std::path::Path;

use castgraph_shared::{CastGraphError, Result};
use tracing::debug;

pub use codec::{
    read_characters, read_merged, read_relationships, write_characters, write_merged,
};

/// An untyped delimited table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Error unless every column in `required` is present.
    pub fn require_columns(&self, path: &Path, required: &[&str]) -> Result<()> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|col| !self.headers.iter().any(|h| h == col))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CastGraphError::validation(format!(
                "{}: missing required column(s): {}",
                path.display(),
                missing.join(", ")
            )))
        }
    }
}

/// Read a comma-delimited table with a header row.
pub fn read_table(path: &Path) -> Result<RawTable> {
    let file = File::open(path).map_err(|e| CastGraphError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CastGraphError::table(path, e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    for (i, header) in headers.iter().enumerate() {
        if headers[..i].contains(header) {
            return Err(CastGraphError::validation(format!(
                "{}: duplicate column `{header}`",
                path.display()
            )));
        }
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| CastGraphError::table(path, e.to_string()))?;
        rows.push(
            record
                .iter()
                .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                .collect(),
        );
    }

    debug!(path = %path.display(), columns = headers.len(), rows = rows.len(), "read table");

    Ok(RawTable { headers, rows })
}

/// Write `table` to `path`, replacing any existing file.
pub fn write_table(path: &Path, table: &RawTable) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| CastGraphError::io(parent, e))?;
        }
    }

    let mut writer =
        csv::Writer::from_path(path).map_err(|e| CastGraphError::table(path, e.to_string()))?;

    writer
        .write_record(&table.headers)
        .map_err(|e| CastGraphError::table(path, e.to_string()))?;

    for row in &table.rows {
        writer
            .write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))
            .map_err(|e| CastGraphError::table(path, e.to_string()))?;
    }

    writer.flush().map_err(|e| CastGraphError::io(path, e))?;

    debug!(path = %path.display(), rows = table.rows.len(), "wrote table");
    Ok(())
}
