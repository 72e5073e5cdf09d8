//! Descriptive statistics.
//!
//! Small, allocation-light helpers over `f64` slices. Every function is total:
//! degenerate input (empty, constant) returns `None` instead of NaN.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Five-number summary plus mean/std (box plot input).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n-1); `None` for a single value.
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Linear-interpolated quantile of an ascending slice (`q` in `[0, 1]`).
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Summary statistics; non-finite values are ignored.
pub fn describe(values: &[f64]) -> Option<Distribution> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let m = mean(&sorted)?;
    let std = if n > 1 {
        let var = sorted.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n as f64 - 1.0);
        Some(var.sqrt())
    } else {
        None
    };

    Some(Distribution {
        count: n,
        mean: m,
        std,
        min: sorted[0],
        q1: quantile_sorted(&sorted, 0.25)?,
        median: quantile_sorted(&sorted, 0.5)?,
        q3: quantile_sorted(&sorted, 0.75)?,
        max: sorted[n - 1],
    })
}

/// Equal-width histogram over `[min, max]`; the last bin is closed on the right.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max <= min {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: finite.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &finite {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect()
}

/// Pearson correlation of two equal-length samples.
///
/// Returns `None` for fewer than two points or when either side is constant.
pub fn pearson(x: &DVector<f64>, y: &DVector<f64>) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 || is_constant(x) || is_constant(y) {
        return None;
    }
    let xc = x.add_scalar(-x.mean());
    let yc = y.add_scalar(-y.mean());
    let denom = xc.norm() * yc.norm();
    if !(denom.is_finite() && denom > 0.0) {
        return None;
    }
    Some((xc.dot(&yc) / denom).clamp(-1.0, 1.0))
}

fn is_constant(v: &DVector<f64>) -> bool {
    let first = v[0];
    v.iter().all(|&x| x == first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantiles_interpolate_linearly() {
        let d = describe(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(d.count, 4);
        assert_eq!(d.min, 1.0);
        assert_eq!(d.max, 4.0);
        assert!((d.median - 2.5).abs() < 1e-12);
        assert!((d.q1 - 1.75).abs() < 1e-12);
        assert!((d.q3 - 3.25).abs() < 1e-12);
        assert!((d.std.unwrap() - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn describe_degenerate_inputs() {
        assert!(describe(&[]).is_none());
        assert!(describe(&[f64::NAN]).is_none());
        let one = describe(&[7.0]).unwrap();
        assert_eq!(one.std, None);
        assert_eq!(one.q1, 7.0);
    }

    #[test]
    fn histogram_counts_every_value_once() {
        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        let h = histogram(&values, 10);
        assert_eq!(h.len(), 10);
        assert_eq!(h.iter().map(|b| b.count).sum::<usize>(), 101);
        assert_eq!(h[9].count, 11);
        assert_eq!(h[9].upper, 100.0);
    }

    #[test]
    fn histogram_of_constant_values_is_one_bin() {
        let h = histogram(&[5.0, 5.0, 5.0], 30);
        assert_eq!(h.len(), 1);
        assert_eq!(h[0].count, 3);
    }

    #[test]
    fn pearson_perfect_and_undefined() {
        let x = DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        let y = DVector::from_vec(vec![2.0, 4.0, 6.0, 8.0]);
        let z = DVector::from_vec(vec![8.0, 6.0, 4.0, 2.0]);
        let c = DVector::from_vec(vec![1.0, 1.0, 1.0, 1.0]);
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &z).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&x, &c), None);
    }
}
