//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size character grids), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Every renderer is a plain function of its data and a `PlotConfig`; there is
//! no shared style state between calls. Missing values are drawn as gaps (line
//! charts) or `N/A` (bars, heatmap cells).

use chrono::NaiveDate;

use crate::domain::CorrelationMatrix;
use crate::math::{Distribution, HistogramBin};

/// Glyphs assigned to series in order; they repeat after the last one.
const GLYPHS: [char; 12] = ['*', 'o', '+', 'x', '#', '@', '%', '&', '=', '~', '$', '^'];

/// Shades for correlation values from -1 (left) to +1 (right).
const SHADES: [char; 9] = ['@', '%', '#', '+', ' ', '.', ':', '=', '*'];

#[derive(Debug, Clone)]
pub struct PlotConfig {
    pub title: String,
    pub width: usize,
    pub height: usize,
}

impl PlotConfig {
    pub fn new(title: impl Into<String>, width: usize, height: usize) -> Self {
        Self {
            title: title.into(),
            width,
            height,
        }
    }
}

/// A labelled date series; `None` values break the line.
#[derive(Debug, Clone)]
pub struct NamedSeries {
    pub label: String,
    pub points: Vec<(NaiveDate, Option<f64>)>,
}

impl NamedSeries {
    pub fn from_values(label: impl Into<String>, points: Vec<(NaiveDate, f64)>) -> Self {
        Self {
            label: label.into(),
            points: points.into_iter().map(|(d, v)| (d, Some(v))).collect(),
        }
    }
}

/// Multi-series line chart over dates.
pub fn render_time_series(series: &[NamedSeries], config: &PlotConfig) -> String {
    let width = config.width.max(10);
    let height = config.height.max(5);

    let defined = series
        .iter()
        .flat_map(|s| s.points.iter())
        .filter_map(|&(d, v)| v.filter(|y| y.is_finite()).map(|y| (d, y)));

    let mut d_min: Option<NaiveDate> = None;
    let mut d_max: Option<NaiveDate> = None;
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for (d, y) in defined {
        d_min = Some(d_min.map_or(d, |m| m.min(d)));
        d_max = Some(d_max.map_or(d, |m| m.max(d)));
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    let mut out = format!("{}\n", config.title);
    let (Some(d_min), Some(d_max)) = (d_min, d_max) else {
        out.push_str("(no data)\n");
        return out;
    };

    if y_max <= y_min {
        y_max = y_min + 1.0;
    }
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);
    let span = ((d_max - d_min).num_days() as f64).max(1.0);

    let mut grid = vec![vec![' '; width]; height];
    for (i, s) in series.iter().enumerate() {
        let glyph = GLYPHS[i % GLYPHS.len()];
        let mut prev: Option<(usize, usize)> = None;
        for &(d, v) in &s.points {
            let Some(y) = v.filter(|y| y.is_finite()) else {
                prev = None;
                continue;
            };
            let x = map_x((d - d_min).num_days() as f64, 0.0, span, width);
            let yy = map_y(y, y_min, y_max, height);
            match prev {
                Some((x0, y0)) => draw_line(&mut grid, x0, y0, x, yy, glyph),
                None => grid[yy][x] = glyph,
            }
            prev = Some((x, yy));
        }
    }

    out.push_str(&format!("x=[{d_min}, {d_max}] | y=[{y_min:.2}, {y_max:.2}]\n"));
    push_grid(&mut out, grid);

    let legend: Vec<String> = series
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{} {}", GLYPHS[i % GLYPHS.len()], s.label))
        .collect();
    out.push_str(&legend.join("  "));
    out.push('\n');
    out
}

/// Vertical histogram, one column group per bin.
pub fn render_histogram(bins: &[HistogramBin], config: &PlotConfig) -> String {
    let mut out = format!("{}\n", config.title);
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0);
    if bins.is_empty() || max_count == 0 {
        out.push_str("(no data)\n");
        return out;
    }

    let height = config.height.max(3);
    let col = (config.width / bins.len()).max(1);
    let mut grid = vec![vec![' '; col * bins.len()]; height];

    for (i, bin) in bins.iter().enumerate() {
        let bar = ((bin.count as f64 / max_count as f64) * height as f64).round() as usize;
        for row in 0..bar.min(height) {
            for c in 0..col {
                grid[height - 1 - row][i * col + c] = '#';
            }
        }
    }

    out.push_str(&format!("max count per bin = {max_count}\n"));
    push_grid(&mut out, grid);
    let lo = bins[0].lower;
    let hi = bins[bins.len() - 1].upper;
    out.push_str(&format!("range=[{lo:.0}, {hi:.0}] | bins={}\n", bins.len()));
    out
}

/// Horizontal bar chart. Negative values are drawn as empty bars.
pub fn render_bar_chart(items: &[(String, Option<f64>)], config: &PlotConfig) -> String {
    let mut out = format!("{}\n", config.title);

    let label_w = items.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let values: Vec<String> = items.iter().map(|(_, v)| fmt_value(*v)).collect();
    let value_w = values.iter().map(String::len).max().unwrap_or(0);
    let bar_w = config.width.saturating_sub(label_w + value_w + 2).max(1);

    let max = items
        .iter()
        .filter_map(|(_, v)| *v)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);

    for ((label, v), value) in items.iter().zip(&values) {
        let len = match v {
            Some(x) if x.is_finite() && max > 0.0 => ((x.max(0.0) / max) * bar_w as f64).round() as usize,
            _ => 0,
        };
        let line = format!("{label:<label_w$} {value:>value_w$} {}", "#".repeat(len));
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// One horizontal box per region on a shared axis.
///
/// `|` whisker ends (min/max), `-` whiskers, `[` `]` quartiles, `=` box, `#` median.
pub fn render_box_plots(items: &[(String, Option<Distribution>)], config: &PlotConfig) -> String {
    let mut out = format!("{}\n", config.title);

    let (lo, hi) = items
        .iter()
        .filter_map(|(_, d)| d.as_ref())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| (lo.min(d.min), hi.max(d.max)));
    if !(lo.is_finite() && hi.is_finite()) {
        out.push_str("(no data)\n");
        return out;
    }
    let hi = if hi > lo { hi } else { lo + 1.0 };

    let label_w = items.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let width = config.width.saturating_sub(label_w + 1).max(10);

    for (label, dist) in items {
        let Some(d) = dist else {
            out.push_str(&format!("{label:<label_w$} N/A\n"));
            continue;
        };
        let mut row = vec![' '; width];
        let x_min = map_x(d.min, lo, hi, width);
        let x_max = map_x(d.max, lo, hi, width);
        let x_q1 = map_x(d.q1, lo, hi, width);
        let x_q3 = map_x(d.q3, lo, hi, width);
        let x_med = map_x(d.median, lo, hi, width);

        for cell in &mut row[x_min..=x_max] {
            *cell = '-';
        }
        for cell in &mut row[x_q1..=x_q3] {
            *cell = '=';
        }
        row[x_min] = '|';
        row[x_max] = '|';
        row[x_q1] = '[';
        row[x_q3] = ']';
        row[x_med] = '#';

        let line: String = row.into_iter().collect();
        out.push_str(format!("{label:<label_w$} {line}").trim_end());
        out.push('\n');
    }
    out.push_str(&format!("axis=[{lo:.0}, {hi:.0}]\n"));
    out
}

/// Correlation heatmap annotated with two-decimal values.
pub fn render_heatmap(matrix: &CorrelationMatrix, config: &PlotConfig) -> String {
    const CELL: usize = 9;
    let mut out = format!("{}\n", config.title);
    let labels: Vec<String> = matrix.columns.iter().map(|c| short_label(c)).collect();
    let label_w = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);

    out.push_str(&" ".repeat(label_w));
    for l in &labels {
        out.push_str(&format!(" {l:>CELL$}"));
    }
    out.push('\n');

    for (i, l) in labels.iter().enumerate() {
        out.push_str(&format!("{l:<label_w$}"));
        for j in 0..labels.len() {
            let cell = match matrix.get(i, j) {
                Some(r) if r.is_finite() => {
                    let shade = shade_for(r);
                    format!("{shade}{shade}{shade} {r:>5.2}")
                }
                _ => "N/A".to_string(),
            };
            out.push_str(&format!(" {cell:>CELL$}"));
        }
        out.push('\n');
    }
    out.push_str(&format!("scale: -1 {} +1\n", SHADES.iter().collect::<String>()));
    out
}

fn shade_for(r: f64) -> char {
    let u = ((r.clamp(-1.0, 1.0) + 1.0) / 2.0) * (SHADES.len() - 1) as f64;
    SHADES[u.round() as usize]
}

fn short_label(column: &str) -> String {
    column
        .trim_start_matches("last_available_")
        .trim_start_matches("estimated_")
        .to_string()
}

fn fmt_value(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() && x.fract() == 0.0 => format!("{x:.0}"),
        Some(x) if x.is_finite() => format!("{x:.4}"),
        _ => "N/A".to_string(),
    }
}

fn push_grid(out: &mut String, grid: Vec<Vec<char>>) {
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only fills empty cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{describe, histogram};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 4, d).unwrap()
    }

    #[test]
    fn bar_chart_golden_snapshot() {
        let items = vec![
            ("SP".to_string(), Some(100.0)),
            ("RJ".to_string(), Some(50.0)),
            ("AC".to_string(), None),
        ];
        let txt = render_bar_chart(&items, &PlotConfig::new("Totals", 30, 0));
        let expected = concat!(
            "Totals\n",
            "SP 100 #######################\n",
            "RJ  50 ############\n",
            "AC N/A\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn time_series_golden_snapshot_small() {
        let series = vec![NamedSeries::from_values("SP", vec![(day(1), 0.0), (day(10), 10.0)])];
        let txt = render_time_series(&series, &PlotConfig::new("Cases", 10, 5));
        let expected = concat!(
            "Cases\n",
            "x=[2020-04-01, 2020-04-10] | y=[-0.50, 10.50]\n",
            "        **\n",
            "      **  \n",
            "    **    \n",
            "  **      \n",
            "**        \n",
            "* SP\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn time_series_leaves_gaps_for_missing_values() {
        let series = vec![NamedSeries {
            label: "RJ".to_string(),
            points: vec![(day(1), Some(1.0)), (day(5), None), (day(10), Some(1.0))],
        }];
        let txt = render_time_series(&series, &PlotConfig::new("Lethality", 10, 5));
        let row_with_points = txt.lines().find(|l| l.contains('*')).unwrap();
        assert_eq!(row_with_points, "*        *");
    }

    #[test]
    fn empty_inputs_render_placeholder() {
        let cfg = PlotConfig::new("t", 20, 5);
        assert_eq!(render_time_series(&[], &cfg), "t\n(no data)\n");
        assert_eq!(render_histogram(&[], &cfg), "t\n(no data)\n");
        assert_eq!(render_box_plots(&[], &cfg), "t\n(no data)\n");
    }

    #[test]
    fn histogram_bar_heights_scale_to_max() {
        let bins = histogram(&[0.0, 0.0, 10.0], 2);
        let txt = render_histogram(&bins, &PlotConfig::new("Hist", 4, 4));
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[1], "max count per bin = 2");
        assert_eq!(lines[2], "##  ");
        assert_eq!(lines[5], "####");
        assert_eq!(lines[6], "range=[0, 10] | bins=2");
    }

    #[test]
    fn box_plot_marks_quartiles_and_median() {
        let items = vec![
            ("SP".to_string(), describe(&[0.0, 25.0, 50.0, 75.0, 100.0])),
            ("XX".to_string(), None),
        ];
        let txt = render_box_plots(&items, &PlotConfig::new("Box", 14, 0));
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[1], "SP |--[=#==]-|");
        assert_eq!(lines[2], "XX N/A");
        assert_eq!(lines[3], "axis=[0, 100]");
    }

    #[test]
    fn heatmap_annotates_values_and_nulls() {
        let m = CorrelationMatrix {
            columns: vec!["last_available_confirmed".to_string(), "estimated_population".to_string()],
            values: vec![vec![Some(1.0), None], vec![None, Some(-1.0)]],
        };
        let txt = render_heatmap(&m, &PlotConfig::new("Corr", 0, 0));
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[1], "           confirmed population");
        assert_eq!(lines[2], "confirmed  ***  1.00       N/A");
        assert_eq!(lines[3], "population       N/A @@@ -1.00");
    }
}
