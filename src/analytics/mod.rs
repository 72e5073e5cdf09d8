//! The analytics core.
//!
//! Every function here is pure: it borrows a `Dataset`, returns new values, and
//! never mutates its input.
//!
//! - `filter`: raw table -> state-level `Dataset`
//! - `series`: per-region, date-sorted view
//! - `rates`: mortality (latest day) and lethality (every row)
//! - `growth`: rolling growth of new daily cases/deaths
//! - `summary`: last-day extraction, distributions, correlation

pub mod filter;
pub mod growth;
pub mod rates;
pub mod series;
pub mod summary;

pub use filter::*;
pub use growth::*;
pub use rates::*;
pub use series::*;
pub use summary::*;

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::{Days, NaiveDate};

    use crate::domain::{Observation, PlaceType};

    /// State row dated `day` days after 2020-03-01.
    pub fn obs(region: &str, day: u32, confirmed: u64, deaths: u64) -> Observation {
        obs_with_population(region, day, confirmed, deaths, Some(1_000_000.0))
    }

    pub fn obs_with_population(
        region: &str,
        day: u32,
        confirmed: u64,
        deaths: u64,
        estimated_population: Option<f64>,
    ) -> Observation {
        let base = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        Observation {
            region: region.to_string(),
            date: base.checked_add_days(Days::new(u64::from(day))).unwrap(),
            confirmed,
            deaths,
            estimated_population,
            place_type: PlaceType::State,
        }
    }
}
