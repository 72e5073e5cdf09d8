//! Per-region time series view.
//!
//! A `RegionSeries` borrows the rows of one region from a `Dataset` and orders
//! them by date. It is rebuilt on every call and never cached, so it always
//! reflects the dataset it was taken from.

use chrono::NaiveDate;

use crate::domain::{Dataset, Metric, Observation};

#[derive(Debug, Clone)]
pub struct RegionSeries<'a> {
    pub region: String,
    /// Ascending by date. Duplicate dates keep input order (stable sort) and are not merged.
    pub observations: Vec<&'a Observation>,
}

impl<'a> RegionSeries<'a> {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Row with the latest date (the later input row on a tie).
    pub fn last(&self) -> Option<&'a Observation> {
        self.observations.last().copied()
    }

    pub fn values(&self, metric: Metric) -> Vec<u64> {
        self.observations.iter().map(|o| metric.value(o)).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.date).collect()
    }

    /// `(date, value)` pairs for plotting.
    pub fn points(&self, metric: Metric) -> Vec<(NaiveDate, f64)> {
        self.observations
            .iter()
            .map(|o| (o.date, metric.value(o) as f64))
            .collect()
    }
}

/// Rows of `region`, sorted ascending by date.
pub fn region_series<'a>(dataset: &'a Dataset, region: &str) -> RegionSeries<'a> {
    let mut observations: Vec<&Observation> = dataset
        .observations
        .iter()
        .filter(|o| o.region == region)
        .collect();
    observations.sort_by_key(|o| o.date);
    RegionSeries {
        region: region.to_string(),
        observations,
    }
}

/// One series per requested region, in request order.
pub fn region_series_all<'a>(dataset: &'a Dataset, regions: &[String]) -> Vec<RegionSeries<'a>> {
    regions.iter().map(|r| region_series(dataset, r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testutil::obs;

    #[test]
    fn sorts_by_date_and_keeps_duplicates_in_input_order() {
        let ds = Dataset::new(vec![
            obs("SP", 3, 30, 1),
            obs("RJ", 1, 5, 0),
            obs("SP", 1, 10, 0),
            obs("SP", 3, 31, 2),
            obs("SP", 2, 20, 0),
        ]);
        let s = region_series(&ds, "SP");
        assert_eq!(s.len(), 4);
        assert_eq!(s.values(Metric::Confirmed), vec![10, 20, 30, 31]);
        assert_eq!(s.last().unwrap().deaths, 2);
    }

    #[test]
    fn unknown_region_yields_empty_series() {
        let ds = Dataset::new(vec![obs("SP", 1, 10, 0)]);
        let s = region_series(&ds, "XX");
        assert!(s.is_empty());
        assert!(s.last().is_none());
    }

    #[test]
    fn series_follow_request_order() {
        let ds = Dataset::new(vec![obs("SP", 1, 10, 0), obs("RJ", 1, 5, 0)]);
        let all = region_series_all(&ds, &["RJ".to_string(), "SP".to_string()]);
        assert_eq!(all[0].region, "RJ");
        assert_eq!(all[1].points(Metric::Confirmed)[0].1, 10.0);
    }
}
