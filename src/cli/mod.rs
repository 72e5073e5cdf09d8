//! Command-line parsing for the state analytics tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the analytics code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_HISTOGRAM_BINS, DEFAULT_WINDOW, Metric};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "epi", version, about = "State-level COVID-19 analytics (brasil.io dataset)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every analysis: charts, mortality table, growth rates, correlation.
    Report(ReportArgs),
    /// Print the latest-day mortality table.
    Mortality(AnalysisArgs),
    /// Print rolling growth of new cases and/or deaths.
    Growth(GrowthArgs),
    /// Plot the lethality rate over time per region.
    Lethality(ViewArgs),
    /// Print the correlation matrix (and heatmap unless disabled).
    Correlation(ViewArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying pipeline as `epi report`, but renders results
    /// in a terminal UI using Ratatui.
    Tui(AnalysisArgs),
}

/// Where the table comes from. Defaults to the brasil.io download.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Dataset URL (defaults to $EPI_DATASET_URL, then the brasil.io `caso_full` file).
    #[arg(long, conflicts_with_all = ["file", "synthetic"])]
    pub url: Option<String>,

    /// Read a local CSV (plain or .gz) instead of downloading.
    #[arg(short = 'f', long, conflicts_with = "synthetic")]
    pub file: Option<PathBuf>,

    /// Use a generated dataset (no network).
    #[arg(long)]
    pub synthetic: bool,

    /// Seed for `--synthetic`.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Days of data for `--synthetic`.
    #[arg(long, default_value_t = 180)]
    pub days: usize,
}

/// Options shared by every analysis command.
#[derive(Debug, Args, Clone)]
pub struct AnalysisArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Comma-separated state codes (e.g. SP,RJ). Defaults to all states.
    #[arg(short = 's', long = "states", value_delimiter = ',')]
    pub states: Vec<String>,

    /// Rolling window (days) for growth rates.
    #[arg(short = 'w', long, default_value_t = DEFAULT_WINDOW)]
    pub window: usize,

    /// Fail instead of reporting nulls when a requested state has no rows.
    #[arg(long)]
    pub strict_regions: bool,
}

#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Disable terminal charts.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    #[command(flatten)]
    pub plot: PlotArgs,

    /// Histogram bin count.
    #[arg(long, default_value_t = DEFAULT_HISTOGRAM_BINS)]
    pub bins: usize,

    /// Write mortality/lethality/growth CSVs and summary.json into this directory.
    #[arg(long, value_name = "DIR")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct GrowthArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Only this metric (both when omitted).
    #[arg(short = 'm', long, value_enum)]
    pub metric: Option<Metric>,
}

#[derive(Debug, Args, Clone)]
pub struct ViewArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    #[command(flatten)]
    pub plot: PlotArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_report_with_state_list() {
        let cli = Cli::try_parse_from(["epi", "report", "--synthetic", "-s", "SP,RJ", "-w", "14", "--no-plot"]).unwrap();
        let Command::Report(args) = cli.command else {
            panic!("expected report");
        };
        assert!(args.analysis.source.synthetic);
        assert_eq!(args.analysis.states, vec!["SP", "RJ"]);
        assert_eq!(args.analysis.window, 14);
        assert!(args.plot.no_plot);
        assert_eq!(args.bins, 30);
    }

    #[test]
    fn growth_metric_is_optional() {
        let cli = Cli::try_parse_from(["epi", "growth", "--metric", "deaths"]).unwrap();
        let Command::Growth(args) = cli.command else {
            panic!("expected growth");
        };
        assert_eq!(args.metric, Some(Metric::Deaths));
        assert!(args.analysis.states.is_empty());
    }

    #[test]
    fn file_and_synthetic_conflict() {
        assert!(Cli::try_parse_from(["epi", "mortality", "--file", "x.csv", "--synthetic"]).is_err());
    }

    #[test]
    fn lethality_and_correlation_share_view_flags() {
        let cli = Cli::try_parse_from(["epi", "correlation", "--synthetic", "--no-plot", "--width", "60"]).unwrap();
        let Command::Correlation(ViewArgs { analysis, plot }) = cli.command else {
            panic!("expected correlation");
        };
        assert!(analysis.source.synthetic);
        assert!(plot.no_plot);
        assert_eq!(plot.width, 60);

        let cli = Cli::try_parse_from(["epi", "lethality", "-s", "SP"]).unwrap();
        assert!(matches!(cli.command, Command::Lethality(ViewArgs { .. })));
    }
}
