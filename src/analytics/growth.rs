//! Rolling growth rate of new daily events.
//!
//! For a region's date-ordered cumulative series `c`:
//!
//! ```text
//! new[t]    = c[t] - c[t-1]            (undefined at t = 0)
//! growth[t] = new[t] / c[t-1]          (undefined when c[t-1] = 0)
//! result    = mean of the last W defined growth[t] values
//! ```
//!
//! When fewer than W defined values exist the mean is taken over those that do;
//! when none exist (0 or 1 rows, or an all-zero prefix) the result is `None`.

use rayon::prelude::*;

use crate::analytics::series::{RegionSeries, region_series};
use crate::domain::{Dataset, GrowthRate, Metric};
use crate::error::AnalyticsError;
use crate::math::mean;

/// Day-over-day relative growth of a cumulative series. Index 0 is always `None`.
pub fn daily_growth(cumulative: &[u64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(cumulative.len());
    for (i, &current) in cumulative.iter().enumerate() {
        if i == 0 {
            out.push(None);
            continue;
        }
        let prev = cumulative[i - 1];
        if prev == 0 {
            out.push(None);
            continue;
        }
        // Source corrections can make the cumulative count drop.
        let new_events = current as f64 - prev as f64;
        out.push(Some(new_events / prev as f64));
    }
    out
}

/// Mean of the last `window` defined values, or `None` if there are none.
pub fn trailing_mean(values: &[Option<f64>], window: usize) -> (Option<f64>, usize) {
    let recent: Vec<f64> = values.iter().rev().flatten().take(window).copied().collect();
    (mean(&recent), recent.len())
}

/// Growth for one region series.
pub fn growth_rate(series: &RegionSeries<'_>, metric: Metric, window: usize) -> GrowthRate {
    let (mean_growth, samples) = if series.len() < 2 {
        (None, 0)
    } else {
        trailing_mean(&daily_growth(&series.values(metric)), window)
    };
    log::debug!(
        "{} growth for {}: {:?} over {samples} day(s)",
        metric.display_name(),
        series.region,
        mean_growth
    );
    GrowthRate {
        region: series.region.clone(),
        metric,
        window,
        mean_growth,
        samples,
    }
}

/// Growth for every requested region, in `regions` order.
pub fn growth_rates(
    dataset: &Dataset,
    regions: &[String],
    metric: Metric,
    window: usize,
) -> Result<Vec<GrowthRate>, AnalyticsError> {
    if window == 0 {
        return Err(AnalyticsError::InvalidWindow(window));
    }
    Ok(regions
        .par_iter()
        .map(|region| growth_rate(&region_series(dataset, region), metric, window))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testutil::obs;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn daily_growth_matches_hand_computation() {
        let g = daily_growth(&[100, 110, 121, 133]);
        assert_eq!(g[0], None);
        assert!(close(g[1].unwrap(), 0.10));
        assert!(close(g[2].unwrap(), 0.10));
        assert!(close(g[3].unwrap(), 12.0 / 121.0));
    }

    #[test]
    fn window_three_averages_last_three_changes() {
        let ds = Dataset::new(vec![
            obs("SP", 1, 100, 0),
            obs("SP", 2, 110, 0),
            obs("SP", 3, 121, 0),
            obs("SP", 4, 133, 0),
        ]);
        let rates = growth_rates(&ds, &["SP".to_string()], Metric::Confirmed, 3).unwrap();
        let expected = (0.10 + 0.10 + 12.0 / 121.0) / 3.0;
        assert!(close(rates[0].mean_growth.unwrap(), expected));
        assert!((rates[0].mean_growth.unwrap() - 0.0997).abs() < 1e-3);
        assert_eq!(rates[0].samples, 3);
    }

    #[test]
    fn short_history_uses_partial_window() {
        let (m, n) = trailing_mean(&daily_growth(&[10, 20]), 7);
        assert_eq!(n, 1);
        assert!(close(m.unwrap(), 1.0));
    }

    #[test]
    fn single_observation_is_null() {
        let ds = Dataset::new(vec![obs("AC", 1, 50, 1)]);
        let rates = growth_rates(&ds, &["AC".to_string(), "XX".to_string()], Metric::Deaths, 7).unwrap();
        assert_eq!(rates[0].mean_growth, None);
        assert_eq!(rates[1].mean_growth, None);
        assert_eq!(rates[1].samples, 0);
    }

    #[test]
    fn zero_prior_count_is_undefined_not_infinite() {
        let g = daily_growth(&[0, 0, 3, 6]);
        assert_eq!(&g[..3], &[None, None, None]);
        assert!(close(g[3].unwrap(), 1.0));

        let (m, n) = trailing_mean(&daily_growth(&[0, 0, 0]), 7);
        assert_eq!((m, n), (None, 0));
    }

    #[test]
    fn deaths_variant_reads_death_column() {
        let ds = Dataset::new(vec![obs("RJ", 2, 500, 20), obs("RJ", 1, 400, 10)]);
        let rates = growth_rates(&ds, &["RJ".to_string()], Metric::Deaths, 7).unwrap();
        assert!(close(rates[0].mean_growth.unwrap(), 1.0));
        assert_eq!(rates[0].metric, Metric::Deaths);
    }

    #[test]
    fn zero_window_is_rejected() {
        let ds = Dataset::default();
        let err = growth_rates(&ds, &[], Metric::Confirmed, 0).unwrap_err();
        assert_eq!(err, AnalyticsError::InvalidWindow(0));
    }
}
