//! Shared analysis pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> region filter -> region policy -> calculators
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use crate::analytics::{
    correlation_matrix, growth_rates, lethality_rates, mortality_rates, prepare, resolve_regions,
};
use crate::data::{DatasetClient, generate_table};
use crate::domain::{
    AnalysisConfig, CorrelationMatrix, DataSource, Dataset, GrowthRate, LethalityRow, Metric, MortalityRow,
    RowError,
};
use crate::error::AppError;
use crate::io::ingest::RawTable;

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub dataset: Dataset,
    /// Records in the raw table before filtering.
    pub rows_read: usize,
    /// Records the CSV reader could not tokenize.
    pub row_errors: Vec<RowError>,
    /// Regions every calculator reported on, in report order.
    pub regions: Vec<String>,
    pub mortality: Vec<MortalityRow>,
    pub case_growth: Vec<GrowthRate>,
    pub death_growth: Vec<GrowthRate>,
    pub lethality: Vec<LethalityRow>,
    pub correlation: CorrelationMatrix,
}

/// Load the raw table from the configured source.
pub fn load_table(source: &DataSource) -> Result<RawTable, AppError> {
    match source {
        DataSource::Url(url) => DatasetClient::new(url.clone())?.fetch_table(),
        DataSource::File(path) => RawTable::from_path(path),
        DataSource::Synthetic { seed, days } => generate_table(*seed, *days),
    }
}

/// Execute the full pipeline: fetch, then analyze.
pub fn run(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    let table = load_table(&config.source)?;
    run_analysis(&table, config)
}

/// Execute the analysis on an already-loaded table.
///
/// This is useful for the TUI where we want to recompute without re-fetching.
pub fn run_analysis(table: &RawTable, config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    // 1) Region filter + normalization.
    let requested = config.regions.as_deref();
    let dataset = prepare(table, requested)?;
    if dataset.is_empty() {
        return Err(AppError::new(3, "No state-level rows remain after filtering."));
    }

    // 2) Region policy (unknown requested regions).
    let regions = resolve_regions(&dataset, requested, config.region_policy)?;

    // 3) Calculators.
    let mortality = mortality_rates(&dataset, &regions);
    let case_growth = growth_rates(&dataset, &regions, Metric::Confirmed, config.window)?;
    let death_growth = growth_rates(&dataset, &regions, Metric::Deaths, config.window)?;
    let lethality = lethality_rates(&dataset);
    let correlation = correlation_matrix(&dataset);

    Ok(RunOutput {
        rows_read: table.len() + table.row_errors.len(),
        row_errors: table.row_errors.clone(),
        dataset,
        regions,
        mortality,
        case_growth,
        death_growth,
        lethality,
        correlation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RegionPolicy;

    fn synthetic_config() -> AnalysisConfig {
        AnalysisConfig {
            source: DataSource::Synthetic { seed: 11, days: 40 },
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn synthetic_run_covers_every_state() {
        let run = run(&synthetic_config()).unwrap();
        assert_eq!(run.regions.len(), 27);
        assert_eq!(run.mortality.len(), 27);
        assert_eq!(run.case_growth.len(), 27);
        assert_eq!(run.lethality.len(), run.dataset.len());
        assert!(run.rows_read > run.dataset.len());
        assert_eq!(run.correlation.columns.len(), 3);
    }

    #[test]
    fn unknown_region_is_null_under_skip_and_fatal_under_fail() {
        let mut config = synthetic_config();
        config.regions = Some(vec!["SP".to_string(), "ZZ".to_string()]);
        let table = load_table(&config.source).unwrap();

        let run = run_analysis(&table, &config).unwrap();
        assert_eq!(run.regions, vec!["SP", "ZZ"]);
        assert!(run.mortality[0].confirmed.is_some());
        assert_eq!(run.mortality[1].mortality_rate, None);
        assert_eq!(run.death_growth[1].mean_growth, None);

        config.region_policy = RegionPolicy::Fail;
        let err = run_analysis(&table, &config).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn no_matching_rows_is_an_error() {
        let mut config = synthetic_config();
        config.regions = Some(vec!["ZZ".to_string()]);
        let err = run(&config).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn zero_window_is_a_usage_error() {
        let mut config = synthetic_config();
        config.window = 0;
        assert_eq!(run(&config).unwrap_err().exit_code(), 2);
    }
}
