//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between the filter and the calculators without hidden state
//! - exported to CSV/JSON
//! - rendered by the report/plot layer, which owns all presentation

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Column names of the brasil.io `caso_full` table used by the pipeline.
pub mod columns {
    pub const REGION: &str = "state";
    pub const DATE: &str = "date";
    pub const PLACE_TYPE: &str = "place_type";
    pub const CONFIRMED: &str = "last_available_confirmed";
    pub const DEATHS: &str = "last_available_deaths";
    pub const POPULATION: &str = "estimated_population";

    /// Every column `prepare` needs, in the order they are validated.
    pub const REQUIRED: [&str; 6] = [PLACE_TYPE, REGION, DATE, CONFIRMED, DEATHS, POPULATION];
}

/// Federative units (UF codes) present in the Brazilian dataset.
pub const BRAZILIAN_STATES: [&str; 27] = [
    "AC", "AL", "AM", "AP", "BA", "CE", "DF", "ES", "GO", "MA", "MG", "MS", "MT", "PA",
    "PB", "PE", "PI", "PR", "RJ", "RN", "RO", "RR", "RS", "SC", "SE", "SP", "TO",
];

/// Granularity tag of a row (`place_type` column).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceType {
    State,
    City,
    Other(String),
}

impl PlaceType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "state" => PlaceType::State,
            "city" => PlaceType::City,
            other => PlaceType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PlaceType::State => "state",
            PlaceType::City => "city",
            PlaceType::Other(s) => s,
        }
    }
}

/// Which cumulative count a calculator reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Confirmed,
    Deaths,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Confirmed, Metric::Deaths];

    pub fn column(self) -> &'static str {
        match self {
            Metric::Confirmed => columns::CONFIRMED,
            Metric::Deaths => columns::DEATHS,
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Metric::Confirmed => "Confirmed cases",
            Metric::Deaths => "Confirmed deaths",
        }
    }

    pub fn value(self, obs: &Observation) -> u64 {
        match self {
            Metric::Confirmed => obs.confirmed,
            Metric::Deaths => obs.deaths,
        }
    }
}

/// What to do when a requested region has no state-level rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RegionPolicy {
    /// Keep going; every calculator reports a null result for the region.
    Skip,
    /// Abort the whole batch with `AnalyticsError::UnknownRegion`.
    Fail,
}

/// One state-level row after normalization.
///
/// Cumulative counts are assumed non-decreasing per region (not enforced).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub region: String,
    pub date: NaiveDate,
    pub confirmed: u64,
    pub deaths: u64,
    /// Missing in the source for some rows.
    pub estimated_population: Option<f64>,
    pub place_type: PlaceType,
}

/// A row that was dropped while normalizing the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub line: usize,
    pub region: Option<String>,
    pub message: String,
}

/// The filtered, normalized table every calculator consumes.
///
/// Row order is the input order; nothing here is sorted by date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub observations: Vec<Observation>,
    /// Distinct regions, in order of first appearance.
    pub regions: Vec<String>,
    /// Rows that matched the filter but could not be normalized.
    pub rejected: Vec<RowError>,
}

impl Dataset {
    pub fn new(observations: Vec<Observation>) -> Self {
        let mut regions: Vec<String> = Vec::new();
        for obs in &observations {
            if !regions.iter().any(|r| r == &obs.region) {
                regions.push(obs.region.clone());
            }
        }
        Self {
            observations,
            regions,
            rejected: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn contains_region(&self, region: &str) -> bool {
        self.regions.iter().any(|r| r == region)
    }

    /// Earliest and latest date across all rows.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.observations.iter().map(|o| o.date).min()?;
        let last = self.observations.iter().map(|o| o.date).max()?;
        Some((first, last))
    }
}

/// Point-in-time mortality for one region (its latest date).
///
/// All numeric fields are `None` when the region has no rows; `mortality_rate`
/// is also `None` when `confirmed == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortalityRow {
    pub region: String,
    pub date: Option<NaiveDate>,
    pub confirmed: Option<u64>,
    pub deaths: Option<u64>,
    pub mortality_rate: Option<f64>,
}

/// One input row augmented with `deaths / confirmed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LethalityRow {
    pub region: String,
    pub date: NaiveDate,
    pub confirmed: u64,
    pub deaths: u64,
    pub lethality_rate: Option<f64>,
}

/// Trailing mean of day-over-day percentage growth for one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthRate {
    pub region: String,
    pub metric: Metric,
    pub window: usize,
    pub mean_growth: Option<f64>,
    /// Number of defined daily changes that went into the mean.
    pub samples: usize,
}

/// Symmetric Pearson correlation matrix over a fixed set of columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(i).and_then(|row| row.get(j)).copied().flatten()
    }
}

/// Where the raw table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
    Synthetic { seed: u64, days: usize },
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub source: DataSource,
    /// `None` means every region present in the table.
    pub regions: Option<Vec<String>>,
    pub window: usize,
    pub region_policy: RegionPolicy,
    pub histogram_bins: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_dir: Option<PathBuf>,
}

pub const DEFAULT_WINDOW: usize = 7;
pub const DEFAULT_HISTOGRAM_BINS: usize = 30;

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            source: DataSource::Url(crate::data::fetch::DEFAULT_DATASET_URL.to_string()),
            regions: None,
            window: DEFAULT_WINDOW,
            region_policy: RegionPolicy::Skip,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            plot: true,
            plot_width: 100,
            plot_height: 25,
            export_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(region: &str, day: u32) -> Observation {
        Observation {
            region: region.to_string(),
            date: NaiveDate::from_ymd_opt(2020, 4, day).unwrap(),
            confirmed: 10,
            deaths: 1,
            estimated_population: None,
            place_type: PlaceType::State,
        }
    }

    #[test]
    fn dataset_regions_keep_first_appearance_order() {
        let ds = Dataset::new(vec![obs("SP", 2), obs("RJ", 1), obs("SP", 1), obs("AC", 3)]);
        assert_eq!(ds.regions, vec!["SP", "RJ", "AC"]);
        assert!(ds.contains_region("RJ"));
        assert!(!ds.contains_region("MG"));
    }

    #[test]
    fn date_span_ignores_row_order() {
        let ds = Dataset::new(vec![obs("SP", 9), obs("RJ", 1), obs("SP", 4)]);
        let (first, last) = ds.date_span().unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2020, 4, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2020, 4, 9).unwrap());
        assert!(Dataset::default().date_span().is_none());
    }

    #[test]
    fn place_type_round_trips_known_tags() {
        assert_eq!(PlaceType::parse(" state "), PlaceType::State);
        assert_eq!(PlaceType::parse("city"), PlaceType::City);
        assert_eq!(PlaceType::parse("country").as_str(), "country");
    }
}
