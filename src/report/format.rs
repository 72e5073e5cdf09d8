//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the analytics code stays free of presentation concerns
//! - output changes are localized (important for snapshot tests)
//!
//! Null results are always printed as `N/A`.

use crate::domain::{CorrelationMatrix, Dataset, GrowthRate, LethalityRow, Metric, MortalityRow};

const NA: &str = "N/A";

/// Dataset stats: rows read vs kept, rejects, date span, regions.
///
/// `rejected` counts both unparseable records and state rows that failed to normalize.
pub fn format_dataset_summary(dataset: &Dataset, rows_read: usize, unparsed: usize, regions: &[String]) -> String {
    let mut out = String::new();
    out.push_str("=== epi - state-level COVID-19 analytics ===\n");
    out.push_str(&format!(
        "Rows: read={rows_read} | state rows kept={} | rejected={} (unparseable={unparsed})\n",
        dataset.len(),
        dataset.rejected.len() + unparsed
    ));
    match dataset.date_span() {
        Some((first, last)) => out.push_str(&format!("Dates: {first} .. {last}\n")),
        None => out.push_str(&format!("Dates: {NA}\n")),
    }
    out.push_str(&format!("Regions ({}): {}\n", regions.len(), regions.join(", ")));
    out
}

/// Mortality table (latest available day per region).
pub fn format_mortality_table(rows: &[MortalityRow]) -> String {
    let mut out = String::new();
    out.push_str("Mortality rate by state (latest available day):\n");
    out.push_str(
        format!(
            "{:<8} {:<10} {:>12} {:>10} {:>14}",
            "region", "date", "confirmed", "deaths", "mortality_rate"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<8} {:-<10} {:->12} {:->10} {:->14}", "", "", "", "", "").trim_end());
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:<8} {:<10} {:>12} {:>10} {:>14}",
                truncate(&r.region, 8),
                r.date.map(|d| d.to_string()).unwrap_or_else(|| NA.to_string()),
                fmt_opt_u64(r.confirmed),
                fmt_opt_u64(r.deaths),
                fmt_opt_f64(r.mortality_rate, 4),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// Lethality rate per region and date, rows printed in the order given.
pub fn format_lethality_table(rows: &[LethalityRow]) -> String {
    let mut out = String::from("Lethality rate by state and date:\n");
    out.push_str(
        format!(
            "{:<8} {:<10} {:>12} {:>10} {:>14}",
            "region", "date", "confirmed", "deaths", "lethality_rate"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<8} {:-<10} {:->12} {:->10} {:->14}", "", "", "", "", "").trim_end());
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:<8} {:<10} {:>12} {:>10} {:>14}",
                truncate(&r.region, 8),
                r.date,
                r.confirmed,
                r.deaths,
                fmt_opt_f64(r.lethality_rate, 4),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

/// One `region: value` line per region, four decimals.
pub fn format_growth(rates: &[GrowthRate], metric: Metric, window: usize) -> String {
    let noun = match metric {
        Metric::Confirmed => "cases",
        Metric::Deaths => "deaths",
    };
    let mut out = format!("Average daily growth of {noun} (window {window} days):\n");
    for r in rates {
        out.push_str(&format!("{}: {}\n", r.region, fmt_opt_f64(r.mean_growth, 4)));
    }
    out
}

pub fn format_correlation(matrix: &CorrelationMatrix) -> String {
    let width = matrix.columns.iter().map(|c| c.len()).max().unwrap_or(0).max(6);
    let mut out = String::from("Correlation matrix (Pearson):\n");

    out.push_str(&" ".repeat(width));
    for c in &matrix.columns {
        out.push_str(&format!(" {c:>width$}"));
    }
    out.push('\n');

    for (i, name) in matrix.columns.iter().enumerate() {
        out.push_str(&format!("{name:<width$}"));
        for j in 0..matrix.columns.len() {
            out.push_str(&format!(" {:>width$}", fmt_opt_f64(matrix.get(i, j), 2)));
        }
        out.push('\n');
    }
    out
}

pub fn fmt_opt_f64(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{x:.decimals$}"),
        _ => NA.to_string(),
    }
}

fn fmt_opt_u64(v: Option<u64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| NA.to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
