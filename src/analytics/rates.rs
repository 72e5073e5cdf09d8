//! Mortality and lethality calculators.
//!
//! Both compute `deaths / confirmed`:
//! - mortality: once per region, at the region's latest date
//! - lethality: for every row of the dataset, keeping row order
//!
//! A zero denominator yields `None` (the null sentinel). Nothing here panics on
//! arithmetic.

use chrono::NaiveDate;
use rayon::prelude::*;

use crate::analytics::series::region_series;
use crate::domain::{Dataset, LethalityRow, MortalityRow};

/// `numerator / denominator`, or `None` when the denominator is zero.
pub fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

/// Latest-day mortality per region, in `regions` order.
pub fn mortality_rates(dataset: &Dataset, regions: &[String]) -> Vec<MortalityRow> {
    regions
        .par_iter()
        .map(|region| {
            let series = region_series(dataset, region);
            match series.last() {
                Some(last) => MortalityRow {
                    region: region.clone(),
                    date: Some(last.date),
                    confirmed: Some(last.confirmed),
                    deaths: Some(last.deaths),
                    mortality_rate: ratio(last.deaths, last.confirmed),
                },
                None => MortalityRow {
                    region: region.clone(),
                    date: None,
                    confirmed: None,
                    deaths: None,
                    mortality_rate: None,
                },
            }
        })
        .collect()
}

/// Every row of the dataset augmented with its lethality rate.
///
/// No rows are dropped or reordered.
pub fn lethality_rates(dataset: &Dataset) -> Vec<LethalityRow> {
    dataset
        .observations
        .iter()
        .map(|o| LethalityRow {
            region: o.region.clone(),
            date: o.date,
            confirmed: o.confirmed,
            deaths: o.deaths,
            lethality_rate: ratio(o.deaths, o.confirmed),
        })
        .collect()
}

/// Lethality rows grouped by region in `regions` order, each group sorted by date.
///
/// Regions without rows contribute nothing.
pub fn lethality_table(dataset: &Dataset, regions: &[String]) -> Vec<LethalityRow> {
    regions
        .iter()
        .flat_map(|region| region_series(dataset, region).observations)
        .map(|o| LethalityRow {
            region: o.region.clone(),
            date: o.date,
            confirmed: o.confirmed,
            deaths: o.deaths,
            lethality_rate: ratio(o.deaths, o.confirmed),
        })
        .collect()
}

/// Lethality series per region, sorted by date (plot input).
///
/// Regions without rows come back with an empty series.
pub fn lethality_by_region(dataset: &Dataset, regions: &[String]) -> Vec<(String, Vec<(NaiveDate, Option<f64>)>)> {
    regions
        .iter()
        .map(|region| {
            let points = region_series(dataset, region)
                .observations
                .iter()
                .map(|o| (o.date, ratio(o.deaths, o.confirmed)))
                .collect();
            (region.clone(), points)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testutil::obs;

    #[test]
    fn ratio_with_zero_denominator_is_null() {
        assert_eq!(ratio(0, 0), None);
        assert_eq!(ratio(3, 0), None);
        assert_eq!(ratio(1, 4), Some(0.25));
    }

    #[test]
    fn mortality_uses_latest_date_not_last_row() {
        let ds = Dataset::new(vec![
            obs("SP", 5, 200, 10),
            obs("SP", 1, 100, 1),
            obs("RJ", 2, 50, 5),
        ]);
        let rows = mortality_rates(&ds, &["SP".to_string(), "RJ".to_string()]);
        assert_eq!(rows[0].region, "SP");
        assert_eq!(rows[0].confirmed, Some(200));
        assert_eq!(rows[0].mortality_rate, Some(0.05));
        assert_eq!(rows[1].mortality_rate, Some(0.1));
    }

    #[test]
    fn mortality_with_zero_confirmed_is_null() {
        let ds = Dataset::new(vec![obs("AC", 1, 0, 0)]);
        let rows = mortality_rates(&ds, &["AC".to_string()]);
        assert_eq!(rows[0].confirmed, Some(0));
        assert_eq!(rows[0].mortality_rate, None);
    }

    #[test]
    fn mortality_for_unknown_region_is_all_null() {
        let ds = Dataset::new(vec![obs("SP", 1, 10, 1)]);
        let rows = mortality_rates(&ds, &["XX".to_string()]);
        assert_eq!(rows[0].region, "XX");
        assert_eq!(rows[0].date, None);
        assert_eq!(rows[0].deaths, None);
        assert_eq!(rows[0].mortality_rate, None);
    }

    #[test]
    fn lethality_preserves_rows_and_order() {
        let ds = Dataset::new(vec![obs("SP", 2, 10, 1), obs("RJ", 1, 0, 0), obs("SP", 1, 4, 1)]);
        let rows = lethality_rates(&ds);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].lethality_rate, Some(0.1));
        assert_eq!(rows[1].lethality_rate, None);
        assert_eq!(rows[2].region, "SP");
        assert_eq!(rows[2].lethality_rate, Some(0.25));
    }

    #[test]
    fn lethality_by_region_is_date_sorted() {
        let ds = Dataset::new(vec![obs("SP", 2, 10, 1), obs("SP", 1, 4, 1)]);
        let series = lethality_by_region(&ds, &["SP".to_string(), "XX".to_string()]);
        assert_eq!(series[0].1[0].1, Some(0.25));
        assert_eq!(series[0].1[1].1, Some(0.1));
        assert!(series[1].1.is_empty());
    }

    #[test]
    fn lethality_table_groups_by_requested_region_then_date() {
        let ds = Dataset::new(vec![
            obs("SP", 2, 200, 5),
            obs("RJ", 1, 40, 1),
            obs("SP", 1, 0, 0),
        ]);
        let rows = lethality_table(&ds, &["SP".to_string(), "XX".to_string(), "RJ".to_string()]);
        let keys: Vec<(&str, Option<f64>)> = rows.iter().map(|r| (r.region.as_str(), r.lethality_rate)).collect();
        assert_eq!(keys, vec![("SP", None), ("SP", Some(0.025)), ("RJ", Some(0.025))]);
        assert!(rows[0].date < rows[1].date);
    }
}
