//! File writing utilities for exported records and dashboards.
//!
//! Records are written either as a pretty-printed JSON array or as a CSV file
//! with one row per record; the dashboard aggregate is always JSON.

use crate::error::Result;
use crate::models::{Dashboard, OutputFormat, TransactionRecord};
use csv::Writer;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Write records to a file in the specified format.
///
/// Missing parent directories are created.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn write_records(records: &[TransactionRecord], format: OutputFormat, file_path: &Path) -> Result<()> {
    ensure_parent(file_path)?;
    match format {
        OutputFormat::Csv => write_csv_file(records, file_path),
        OutputFormat::Json => write_json_file(records, file_path),
    }
}

/// Write the dashboard aggregate as pretty JSON.
pub fn write_dashboard(dashboard: &Dashboard, file_path: &Path) -> Result<()> {
    ensure_parent(file_path)?;
    let file = File::create(file_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, dashboard)?;
    writer.flush()?;
    Ok(())
}

/// Read back a JSON array of records, as written by [`write_records`].
pub fn read_records_json(file_path: &Path) -> Result<Vec<TransactionRecord>> {
    let file = File::open(file_path)?;
    let records = serde_json::from_reader(BufReader::new(file))?;
    Ok(records)
}

fn ensure_parent(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    Ok(())
}

/// Header row uses the JSON field names.
fn write_csv_file(records: &[TransactionRecord], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = Writer::from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_json_file(records: &[TransactionRecord], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}
