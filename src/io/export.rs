//! Export calculator results to CSV and JSON.
//!
//! The files are meant to be easy to consume in spreadsheets or downstream
//! scripts. Null ratios are written as empty CSV cells and JSON `null`.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{CorrelationMatrix, GrowthRate, LethalityRow, MortalityRow};
use crate::error::AppError;

/// Everything a `report --export` run writes to `summary.json`.
#[derive(Debug, Serialize)]
pub struct SummaryFile<'a> {
    pub tool: &'static str,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub regions: &'a [String],
    pub window: usize,
    pub mortality: &'a [MortalityRow],
    pub case_growth: &'a [GrowthRate],
    pub death_growth: &'a [GrowthRate],
    pub correlation: &'a CorrelationMatrix,
}

/// Serialize rows to a CSV file with a header derived from the row type.
pub fn write_rows_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::new(4, format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush export CSV '{}': {e}", path.display())))?;
    Ok(())
}

pub fn write_summary_json(path: &Path, summary: &SummaryFile<'_>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create summary JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::new(4, format!("Failed to write summary JSON: {e}")))?;
    Ok(())
}

/// Write `mortality.csv`, `lethality.csv`, `growth.csv`, and `summary.json` into `dir`.
pub fn write_export_bundle(
    dir: &Path,
    lethality: &[LethalityRow],
    summary: &SummaryFile<'_>,
) -> Result<Vec<PathBuf>, AppError> {
    create_dir_all(dir)
        .map_err(|e| AppError::new(4, format!("Failed to create export dir '{}': {e}", dir.display())))?;

    let mortality_path = dir.join("mortality.csv");
    write_rows_csv(&mortality_path, summary.mortality)?;

    let lethality_path = dir.join("lethality.csv");
    write_rows_csv(&lethality_path, lethality)?;

    let growth_path = dir.join("growth.csv");
    let growth: Vec<&GrowthRate> = summary.case_growth.iter().chain(summary.death_growth).collect();
    write_rows_csv(&growth_path, &growth)?;

    let summary_path = dir.join("summary.json");
    write_summary_json(&summary_path, summary)?;

    log::info!("Exported results to {}", dir.display());
    Ok(vec![mortality_path, lethality_path, growth_path, summary_path])
}
