//! CSV helpers shared by the file-to-file stages.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::PipelineError;

/// A table held as raw strings: one header row plus data rows.
pub(crate) struct Table {
    pub(crate) header: Vec<String>,
    pub(crate) rows: Vec<Vec<String>>,
}

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> PipelineError {
    PipelineError::Io {
        path: path.display().to_string(),
        source,
    }
}

pub(crate) fn read_table(path: &Path) -> Result<Table, PipelineError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut reader = csv::Reader::from_reader(file);
    let header = reader.headers()?.iter().map(str::to_owned).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_owned).collect());
    }
    Ok(Table { header, rows })
}

pub(crate) fn write_table(path: &Path, table: &Table) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush().map_err(|e| io_error(path, e))?;
    Ok(())
}

pub(crate) fn append_rows(path: &Path, rows: &[Vec<String>]) -> Result<(), PipelineError> {
    let file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| io_error(path, e))?;
    let mut writer = csv::Writer::from_writer(file);
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush().map_err(|e| io_error(path, e))?;
    Ok(())
}

/// Drops exact-duplicate rows, keeping the first occurrence in order.
pub(crate) fn dedup_rows(rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    let mut seen = HashSet::new();
    rows.into_iter().filter(|row| seen.insert(row.clone())).collect()
}

pub(crate) fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, PipelineError> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records = Vec::new();
    for record in reader.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

pub(crate) fn write_records<T: Serialize>(
    path: &Path,
    records: &[T],
) -> Result<(), PipelineError> {
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().map_err(|e| io_error(path, e))?;
    Ok(())
}
