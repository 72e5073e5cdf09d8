//! Aggregations across regions.
//!
//! - last-day extraction (by maximum date, never by file order)
//! - totals per region (bar chart input)
//! - distribution summaries (histogram and box plot input)
//! - Pearson correlation matrix over confirmed, deaths, and population

use nalgebra::{DMatrix, DVector};

use crate::analytics::series::region_series;
use crate::domain::{CorrelationMatrix, Dataset, Metric, Observation, columns};
use crate::math::{Distribution, HistogramBin, describe, histogram, pearson};

/// Latest observation per region. `None` for regions without rows.
pub fn last_observations<'a>(dataset: &'a Dataset, regions: &[String]) -> Vec<(String, Option<&'a Observation>)> {
    regions
        .iter()
        .map(|region| (region.clone(), region_series(dataset, region).last()))
        .collect()
}

/// Latest cumulative value of `metric` per region.
pub fn totals(dataset: &Dataset, regions: &[String], metric: Metric) -> Vec<(String, Option<u64>)> {
    last_observations(dataset, regions)
        .into_iter()
        .map(|(region, obs)| (region, obs.map(|o| metric.value(o))))
        .collect()
}

/// Summary of `metric` over every row of the dataset.
pub fn distribution(dataset: &Dataset, metric: Metric) -> Option<Distribution> {
    describe(&metric_values(dataset, metric))
}

pub fn metric_histogram(dataset: &Dataset, metric: Metric, bins: usize) -> Vec<HistogramBin> {
    histogram(&metric_values(dataset, metric), bins)
}

/// Per-region summary of `metric` over all of the region's rows.
pub fn region_distributions(
    dataset: &Dataset,
    regions: &[String],
    metric: Metric,
) -> Vec<(String, Option<Distribution>)> {
    regions
        .iter()
        .map(|region| {
            let values: Vec<f64> = region_series(dataset, region)
                .values(metric)
                .into_iter()
                .map(|v| v as f64)
                .collect();
            (region.clone(), describe(&values))
        })
        .collect()
}

/// Pairwise Pearson correlation of confirmed, deaths, and estimated population
/// across every row (not per region).
///
/// Rows with a missing population are dropped pairwise. Entries involving a
/// zero-variance column are `None`; the diagonal is exactly `1.0` otherwise.
pub fn correlation_matrix(dataset: &Dataset) -> CorrelationMatrix {
    let names = [columns::CONFIRMED, columns::DEATHS, columns::POPULATION];
    let frame = numeric_frame(dataset);
    let k = names.len();

    let mut values = vec![vec![None; k]; k];
    for i in 0..k {
        for j in i..k {
            let (x, y) = complete_pairs(&frame, i, j);
            let r = if i == j {
                pearson(&x, &y).map(|_| 1.0)
            } else {
                pearson(&x, &y)
            };
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix {
        columns: names.iter().map(|s| s.to_string()).collect(),
        values,
    }
}

fn metric_values(dataset: &Dataset, metric: Metric) -> Vec<f64> {
    dataset.observations.iter().map(|o| metric.value(o) as f64).collect()
}

/// Rows x {confirmed, deaths, population}; missing population is NaN.
fn numeric_frame(dataset: &Dataset) -> DMatrix<f64> {
    DMatrix::from_fn(dataset.len(), 3, |r, c| {
        let o = &dataset.observations[r];
        match c {
            0 => o.confirmed as f64,
            1 => o.deaths as f64,
            _ => o.estimated_population.unwrap_or(f64::NAN),
        }
    })
}

fn complete_pairs(frame: &DMatrix<f64>, i: usize, j: usize) -> (DVector<f64>, DVector<f64>) {
    let (xs, ys): (Vec<f64>, Vec<f64>) = frame
        .column(i)
        .iter()
        .zip(frame.column(j).iter())
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .unzip();
    (DVector::from_vec(xs), DVector::from_vec(ys))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;

    use super::*;
    use crate::analytics::testutil::{obs, obs_with_population};

    #[test]
    fn last_day_is_max_date_regardless_of_row_order() {
        let mut rows = Vec::new();
        for day in 1..=20 {
            rows.push(obs("SP", day, day as u64 * 10, day as u64));
            rows.push(obs("RJ", day, day as u64 * 5, 0));
        }
        let mut rng = StdRng::seed_from_u64(7);
        rows.shuffle(&mut rng);
        let ds = Dataset::new(rows);

        let last = last_observations(&ds, &["SP".to_string(), "RJ".to_string(), "XX".to_string()]);
        assert_eq!(last[0].1.unwrap().confirmed, 200);
        assert_eq!(last[1].1.unwrap().confirmed, 100);
        assert_eq!(last[0].1.unwrap().date, ds.date_span().unwrap().1);
        assert!(last[2].1.is_none());
    }

    #[test]
    fn totals_read_the_requested_metric() {
        let ds = Dataset::new(vec![obs("SP", 1, 10, 1), obs("SP", 2, 30, 4)]);
        assert_eq!(totals(&ds, &["SP".to_string()], Metric::Deaths), vec![("SP".to_string(), Some(4))]);
    }

    #[test]
    fn correlation_is_symmetric_with_unit_diagonal() {
        let ds = Dataset::new(vec![
            obs_with_population("SP", 1, 100, 3, Some(1000.0)),
            obs_with_population("RJ", 1, 40, 2, Some(700.0)),
            obs_with_population("AM", 1, 15, 2, Some(300.0)),
            obs_with_population("AC", 1, 5, 0, Some(90.0)),
        ]);
        let m = correlation_matrix(&ds);
        for i in 0..3 {
            assert_eq!(m.get(i, i), Some(1.0));
            for j in 0..3 {
                assert_eq!(m.get(i, j), m.get(j, i));
                let v = m.get(i, j).unwrap();
                assert!((-1.0..=1.0).contains(&v));
            }
        }
        assert_eq!(m.columns[2], "estimated_population");
    }

    #[test]
    fn zero_variance_column_yields_nulls() {
        let ds = Dataset::new(vec![
            obs_with_population("SP", 1, 100, 0, Some(10.0)),
            obs_with_population("SP", 2, 150, 0, Some(10.0)),
            obs_with_population("SP", 3, 190, 0, None),
        ]);
        let m = correlation_matrix(&ds);
        assert_eq!(m.get(0, 0), Some(1.0));
        assert_eq!(m.get(1, 1), None);
        assert_eq!(m.get(0, 1), None);
        assert_eq!(m.get(2, 2), None);
        assert_eq!(m.get(0, 2), None);
    }

    #[test]
    fn region_distributions_cover_each_region() {
        let ds = Dataset::new(vec![obs("SP", 1, 10, 0), obs("SP", 2, 30, 0), obs("RJ", 1, 7, 0)]);
        let d = region_distributions(&ds, &["SP".to_string(), "XX".to_string()], Metric::Confirmed);
        assert_eq!(d[0].1.as_ref().unwrap().median, 20.0);
        assert!(d[1].1.is_none());
        assert_eq!(distribution(&ds, Metric::Confirmed).unwrap().count, 3);
        assert_eq!(metric_histogram(&ds, Metric::Confirmed, 2).len(), 2);
    }
}
