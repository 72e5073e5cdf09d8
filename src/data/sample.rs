//! Synthetic dataset generation.
//!
//! Produces a table with the same columns as the brasil.io `caso_full` file so
//! the whole pipeline can run offline. Each state follows a noisy logistic
//! epidemic curve; a few city and country rows are mixed in so the region
//! filter has something to discard.

use chrono::{Days, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{BRAZILIAN_STATES, columns};
use crate::error::AppError;
use crate::io::ingest::RawTable;

const START_DATE: (i32, u32, u32) = (2020, 2, 25);
/// Every Nth day also gets a capital-city row per state.
const CITY_ROW_EVERY: usize = 7;

#[derive(Debug, Clone)]
struct StateCurve {
    uf: &'static str,
    population: f64,
    /// Final share of the population ever confirmed.
    attack_rate: f64,
    /// Logistic growth rate per day.
    growth: f64,
    /// Day of the logistic inflection point.
    midpoint: f64,
    case_fatality: f64,
}

/// Generate `days` days of data for every state.
pub fn generate_table(seed: u64, days: usize) -> Result<RawTable, AppError> {
    if days == 0 {
        return Err(AppError::new(2, "Synthetic day count must be > 0."));
    }
    let start = NaiveDate::from_ymd_opt(START_DATE.0, START_DATE.1, START_DATE.2)
        .ok_or_else(|| AppError::new(2, "Invalid synthetic start date."))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0_f64, 0.15)
        .map_err(|e| AppError::new(2, format!("Invalid noise distribution: {e}")))?;

    let curves: Vec<StateCurve> = BRAZILIAN_STATES
        .iter()
        .map(|&uf| StateCurve {
            uf,
            population: rng.gen_range(500_000.0..45_000_000.0_f64).round(),
            attack_rate: rng.gen_range(0.01..0.08),
            growth: rng.gen_range(0.06..0.18),
            midpoint: rng.gen_range(0.3..0.7) * days as f64,
            case_fatality: rng.gen_range(0.01..0.04),
        })
        .collect();

    let header = [
        "city",
        columns::REGION,
        columns::DATE,
        columns::PLACE_TYPE,
        columns::CONFIRMED,
        columns::DEATHS,
        columns::POPULATION,
    ];

    let mut rows = Vec::new();
    for curve in &curves {
        let mut confirmed = 0u64;
        let mut deaths = 0u64;
        for day in 0..days {
            let date = start
                .checked_add_days(Days::new(day as u64))
                .ok_or_else(|| AppError::new(2, "Synthetic date overflow."))?;

            let capacity = curve.population * curve.attack_rate;
            let expected = capacity / (1.0 + (-curve.growth * (day as f64 - curve.midpoint)).exp());
            let jitter = (1.0 + noise.sample(&mut rng)).max(0.0);
            // Cumulative counts never decrease.
            confirmed = confirmed.max((expected * jitter).round() as u64);
            deaths = deaths.max((confirmed as f64 * curve.case_fatality).round() as u64);

            rows.push(vec![
                String::new(),
                curve.uf.to_string(),
                date.to_string(),
                "state".to_string(),
                confirmed.to_string(),
                deaths.to_string(),
                format!("{}", curve.population),
            ]);

            if day % CITY_ROW_EVERY == 0 {
                let city_share = rng.gen_range(0.2..0.5);
                rows.push(vec![
                    format!("Capital-{}", curve.uf),
                    curve.uf.to_string(),
                    date.to_string(),
                    "city".to_string(),
                    ((confirmed as f64) * city_share).round().to_string(),
                    ((deaths as f64) * city_share).round().to_string(),
                    (curve.population * city_share).round().to_string(),
                ]);
            }
        }
    }

    // A national aggregate row that must never survive the state filter.
    rows.push(vec![
        String::new(),
        String::new(),
        start.to_string(),
        "country".to_string(),
        "0".to_string(),
        "0".to_string(),
        String::new(),
    ]);

    log::info!(
        "Generated synthetic table: {} row(s), {} state(s), {days} day(s), seed={seed}",
        rows.len(),
        curves.len()
    );
    Ok(RawTable::from_rows(&header, rows))
}
