// 💾 Export - flat tables to CSV, full report to JSON

use crate::error::{Result, StudyError};
use crate::pipeline::StudyReport;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Write flat rows with a header line
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| StudyError::io(path, e))?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| StudyError::io(path, e))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}

/// Write a report into `dir`, returning the files written
///
/// CSV: one file per scenario plus `fatalities.csv`.
/// JSON: a single `report.json`.
pub fn export_report(report: &StudyReport, dir: &Path, format: ExportFormat) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| StudyError::io(dir, e))?;

    let mut written = Vec::new();
    match format {
        ExportFormat::Json => {
            let path = dir.join("report.json");
            write_json(&path, report)?;
            written.push(path);
        }
        ExportFormat::Csv => {
            for scenario in &report.scenarios {
                let path = dir.join(format!("{}.csv", scenario.name));
                write_csv(&path, &scenario.rows)?;
                written.push(path);
            }

            let path = dir.join("fatalities.csv");
            write_csv(&path, &report.fatalities)?;
            written.push(path);
        }
    }

    tracing::info!(dir = %dir.display(), files = written.len(), "exported report");
    Ok(written)
}
