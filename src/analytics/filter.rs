//! Region filter: raw table -> state-level `Dataset`.
//!
//! `prepare` keeps rows whose `place_type` is `state` and whose region is in the
//! requested set (all regions when no set is given), then normalizes dates and
//! counts. The input table is only borrowed; the output is a fresh `Dataset`.

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{Dataset, Observation, PlaceType, RegionPolicy, RowError, columns};
use crate::error::AnalyticsError;
use crate::io::ingest::{RawTable, cell};

struct ColumnIndex {
    place_type: usize,
    region: usize,
    date: usize,
    confirmed: usize,
    deaths: usize,
    population: usize,
}

impl ColumnIndex {
    fn resolve(table: &RawTable) -> Result<Self, AnalyticsError> {
        // Validate in `columns::REQUIRED` order so the first reported gap is stable.
        for name in columns::REQUIRED {
            table.require_column(name)?;
        }
        Ok(Self {
            place_type: table.require_column(columns::PLACE_TYPE)?,
            region: table.require_column(columns::REGION)?,
            date: table.require_column(columns::DATE)?,
            confirmed: table.require_column(columns::CONFIRMED)?,
            deaths: table.require_column(columns::DEATHS)?,
            population: table.require_column(columns::POPULATION)?,
        })
    }
}

/// Select state-level rows for `regions` (or every region) and normalize them.
///
/// Fails only on schema problems. Rows that pass the filter but carry an
/// unparseable date or count are collected in `Dataset::rejected`.
pub fn prepare(table: &RawTable, regions: Option<&[String]>) -> Result<Dataset, AnalyticsError> {
    let cols = ColumnIndex::resolve(table)?;

    let mut observations = Vec::new();
    let mut rejected = Vec::new();

    for (idx, record) in table.records().iter().enumerate() {
        let line = table.line(idx);

        let place_type = PlaceType::parse(cell(record, cols.place_type).unwrap_or(""));
        if place_type != PlaceType::State {
            continue;
        }

        let Some(region) = cell(record, cols.region) else {
            rejected.push(RowError {
                line,
                region: None,
                message: "Missing region identifier.".to_string(),
            });
            continue;
        };

        if let Some(wanted) = regions {
            if !wanted.iter().any(|r| r == region) {
                continue;
            }
        }

        match parse_observation(record, &cols, region, place_type) {
            Ok(obs) => observations.push(obs),
            Err(message) => rejected.push(RowError {
                line,
                region: Some(region.to_string()),
                message,
            }),
        }
    }

    if !rejected.is_empty() {
        log::warn!("Skipped {} state row(s) that could not be normalized", rejected.len());
    }

    let mut dataset = Dataset::new(observations);
    dataset.rejected = rejected;
    log::info!(
        "Kept {} state-level row(s) across {} region(s)",
        dataset.len(),
        dataset.regions.len()
    );
    Ok(dataset)
}

/// Resolve the region set calculators should report on.
///
/// With no explicit request this is every region in the dataset. Requested
/// regions without rows are kept under `Skip` (their results come back null)
/// and rejected under `Fail`.
pub fn resolve_regions(
    dataset: &Dataset,
    requested: Option<&[String]>,
    policy: RegionPolicy,
) -> Result<Vec<String>, AnalyticsError> {
    let Some(requested) = requested else {
        return Ok(dataset.regions.clone());
    };

    for region in requested {
        if dataset.contains_region(region) {
            continue;
        }
        match policy {
            RegionPolicy::Skip => log::warn!("No state-level rows for region `{region}`; results will be null"),
            RegionPolicy::Fail => {
                return Err(AnalyticsError::UnknownRegion {
                    region: region.clone(),
                });
            }
        }
    }

    Ok(requested.to_vec())
}

fn parse_observation(
    record: &StringRecord,
    cols: &ColumnIndex,
    region: &str,
    place_type: PlaceType,
) -> Result<Observation, String> {
    let date = parse_date(cell(record, cols.date).ok_or_else(|| "Missing `date` value.".to_string())?)?;
    let confirmed = parse_count(cell(record, cols.confirmed), columns::CONFIRMED)?;
    let deaths = parse_count(cell(record, cols.deaths), columns::DEATHS)?;
    let estimated_population = cell(record, cols.population)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0);

    Ok(Observation {
        region: region.to_string(),
        date,
        confirmed,
        deaths,
        estimated_population,
        place_type,
    })
}

/// Parse the date column to a calendar date.
///
/// The source uses ISO dates; a trailing time component is tolerated.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const FMTS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
    let day = s.split(['T', ' ']).next().unwrap_or(s);
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(day, fmt) {
            return Ok(d);
        }
    }
    Err(format!("Invalid date '{s}'. Expected YYYY-MM-DD."))
}

fn parse_count(raw: Option<&str>, name: &str) -> Result<u64, String> {
    let raw = raw.ok_or_else(|| format!("Missing `{name}` value."))?;
    if let Ok(v) = raw.parse::<u64>() {
        return Ok(v);
    }
    // Some exports write integral counts as floats ("12.0").
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(v as u64),
        _ => Err(format!("Invalid `{name}` value '{raw}' (expected a non-negative integer).")),
    }
}
