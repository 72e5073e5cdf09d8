//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the dataset (download, local file, or synthetic)
//! - runs the region filter and calculators
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::analytics::{
    lethality_by_region, lethality_table, metric_histogram, region_distributions, region_series_all,
    totals,
};
use crate::cli::{AnalysisArgs, Command, GrowthArgs, PlotArgs, ReportArgs, ViewArgs};
use crate::domain::{AnalysisConfig, DataSource, Metric, RegionPolicy};
use crate::error::AppError;
use crate::plot::{NamedSeries, PlotConfig};

pub mod pipeline;

use pipeline::RunOutput;

/// Entry point for the `epi` binary.
pub fn run() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // We want `epi` and `epi -s SP` to behave like `epi report ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Report(args) => handle_report(args),
        Command::Mortality(args) => handle_mortality(args),
        Command::Growth(args) => handle_growth(args),
        Command::Lethality(args) => handle_lethality(args),
        Command::Correlation(args) => handle_correlation(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn handle_report(args: ReportArgs) -> Result<(), AppError> {
    let mut config = analysis_config_from_args(&args.analysis);
    apply_plot_args(&mut config, &args.plot);
    config.histogram_bins = args.bins;
    config.export_dir = args.export.clone();

    let run = pipeline::run(&config)?;
    println!("{}", render_report(&run, &config));

    if let Some(dir) = &config.export_dir {
        let (first_date, last_date) = match run.dataset.date_span() {
            Some((first, last)) => (Some(first), Some(last)),
            None => (None, None),
        };
        let summary = crate::io::export::SummaryFile {
            tool: "epi",
            first_date,
            last_date,
            regions: &run.regions,
            window: config.window,
            mortality: &run.mortality,
            case_growth: &run.case_growth,
            death_growth: &run.death_growth,
            correlation: &run.correlation,
        };
        let written = crate::io::export::write_export_bundle(dir, &run.lethality, &summary)?;
        for path in written {
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn handle_mortality(args: AnalysisArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args);
    let run = pipeline::run(&config)?;
    println!("{}", crate::report::format_mortality_table(&run.mortality));
    Ok(())
}

fn handle_growth(args: GrowthArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args.analysis);
    let run = pipeline::run(&config)?;

    let metrics = match args.metric {
        Some(metric) => vec![metric],
        None => Metric::ALL.to_vec(),
    };
    for metric in metrics {
        let rates = match metric {
            Metric::Confirmed => &run.case_growth,
            Metric::Deaths => &run.death_growth,
        };
        println!("{}", crate::report::format_growth(rates, metric, config.window));
    }
    Ok(())
}

fn handle_lethality(args: ViewArgs) -> Result<(), AppError> {
    let mut config = analysis_config_from_args(&args.analysis);
    apply_plot_args(&mut config, &args.plot);
    let run = pipeline::run(&config)?;

    if config.plot {
        println!("{}", render_lethality(&run, &config));
    } else {
        let rows = lethality_table(&run.dataset, &run.regions);
        println!("{}", crate::report::format_lethality_table(&rows));
    }
    Ok(())
}

fn handle_correlation(args: ViewArgs) -> Result<(), AppError> {
    let mut config = analysis_config_from_args(&args.analysis);
    apply_plot_args(&mut config, &args.plot);
    let run = pipeline::run(&config)?;

    println!("{}", crate::report::format_correlation(&run.correlation));
    if config.plot {
        let cfg = PlotConfig::new("Correlation heatmap", config.plot_width, config.plot_height);
        println!("{}", crate::plot::render_heatmap(&run.correlation, &cfg));
    }
    Ok(())
}

fn handle_tui(args: AnalysisArgs) -> Result<(), AppError> {
    crate::tui::run(analysis_config_from_args(&args))
}

/// Build the pipeline configuration from the flags shared by every command.
///
/// State codes are trimmed and upper-cased; an empty list means "all states".
/// Without an explicit source the dataset URL comes from `EPI_DATASET_URL`
/// (or `.env`), falling back to the brasil.io download.
pub fn analysis_config_from_args(args: &AnalysisArgs) -> AnalysisConfig {
    let source = if args.source.synthetic {
        DataSource::Synthetic {
            seed: args.source.seed,
            days: args.source.days,
        }
    } else if let Some(path) = &args.source.file {
        DataSource::File(path.clone())
    } else if let Some(url) = &args.source.url {
        DataSource::Url(url.clone())
    } else {
        DataSource::Url(crate::data::dataset_url_from_env())
    };

    let states: Vec<String> = args
        .states
        .iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    AnalysisConfig {
        source,
        regions: (!states.is_empty()).then_some(states),
        window: args.window,
        region_policy: if args.strict_regions {
            RegionPolicy::Fail
        } else {
            RegionPolicy::Skip
        },
        ..AnalysisConfig::default()
    }
}

fn apply_plot_args(config: &mut AnalysisConfig, plot: &PlotArgs) {
    config.plot = !plot.no_plot;
    config.plot_width = plot.width;
    config.plot_height = plot.height;
}

/// Full `report` output: dataset summary, charts (when enabled), and every
/// calculator's table.
pub fn render_report(run: &RunOutput, config: &AnalysisConfig) -> String {
    let mut sections = vec![crate::report::format_dataset_summary(
        &run.dataset,
        run.rows_read,
        run.row_errors.len(),
        &run.regions,
    )];
    let (w, h) = (config.plot_width, config.plot_height);

    if config.plot {
        let series: Vec<NamedSeries> = region_series_all(&run.dataset, &run.regions)
            .iter()
            .map(|s| NamedSeries::from_values(s.region.clone(), s.points(Metric::Confirmed)))
            .collect();
        sections.push(crate::plot::render_time_series(
            &series,
            &PlotConfig::new("Cumulative confirmed cases by state", w, h),
        ));

        let bins = metric_histogram(&run.dataset, Metric::Confirmed, config.histogram_bins);
        sections.push(crate::plot::render_histogram(
            &bins,
            &PlotConfig::new("Distribution of confirmed cases", w, h),
        ));

        let boxes = region_distributions(&run.dataset, &run.regions, Metric::Confirmed);
        sections.push(crate::plot::render_box_plots(
            &boxes,
            &PlotConfig::new("Confirmed cases by state", w, h),
        ));

        for metric in Metric::ALL {
            let bars: Vec<(String, Option<f64>)> = totals(&run.dataset, &run.regions, metric)
                .into_iter()
                .map(|(region, total)| (region, total.map(|v| v as f64)))
                .collect();
            sections.push(crate::plot::render_bar_chart(
                &bars,
                &PlotConfig::new(format!("Total {} by state", metric.display_name()), w, h),
            ));
        }
    }

    sections.push(crate::report::format_mortality_table(&run.mortality));
    sections.push(crate::report::format_growth(
        &run.case_growth,
        Metric::Confirmed,
        config.window,
    ));
    sections.push(crate::report::format_growth(
        &run.death_growth,
        Metric::Deaths,
        config.window,
    ));
    sections.push(crate::report::format_correlation(&run.correlation));

    if config.plot {
        sections.push(crate::plot::render_heatmap(
            &run.correlation,
            &PlotConfig::new("Correlation heatmap", w, h),
        ));
        sections.push(render_lethality(run, config));
    }

    sections.join("\n")
}

fn render_lethality(run: &RunOutput, config: &AnalysisConfig) -> String {
    let series: Vec<NamedSeries> = lethality_by_region(&run.dataset, &run.regions)
        .into_iter()
        .map(|(label, points)| NamedSeries { label, points })
        .collect();
    crate::plot::render_time_series(
        &series,
        &PlotConfig::new(
            "Lethality rate over time by state",
            config.plot_width,
            config.plot_height,
        ),
    )
}

/// Rewrite argv so `epi` defaults to `epi report`.
///
/// Rules:
/// - `epi`                      -> `epi report`
/// - `epi -s SP ...`            -> `epi report -s SP ...`
/// - `epi --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("report".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "report" | "mortality" | "growth" | "lethality" | "correlation" | "tui"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "report flags".
    if arg1.starts_with('-') {
        argv.insert(1, "report".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_report() {
        assert_eq!(rewrite_args(argv(&["epi"])), argv(&["epi", "report"]));
        assert_eq!(
            rewrite_args(argv(&["epi", "-s", "SP"])),
            argv(&["epi", "report", "-s", "SP"])
        );
        assert_eq!(rewrite_args(argv(&["epi", "--help"])), argv(&["epi", "--help"]));
        assert_eq!(
            rewrite_args(argv(&["epi", "growth", "-w", "3"])),
            argv(&["epi", "growth", "-w", "3"])
        );
    }

    #[test]
    fn states_are_normalized_and_strict_flag_maps_to_fail() {
        let cli = Cli::try_parse_from(["epi", "mortality", "--synthetic", "-s", " sp, rj ,", "--strict-regions"])
            .unwrap();
        let Command::Mortality(args) = cli.command else {
            panic!("expected mortality");
        };
        let config = analysis_config_from_args(&args);
        assert_eq!(config.regions, Some(vec!["SP".to_string(), "RJ".to_string()]));
        assert_eq!(config.region_policy, RegionPolicy::Fail);
        assert_eq!(config.source, DataSource::Synthetic { seed: 42, days: 180 });
    }

    #[test]
    fn no_states_means_all_regions() {
        let cli = Cli::try_parse_from(["epi", "mortality", "--file", "data.csv"]).unwrap();
        let Command::Mortality(args) = cli.command else {
            panic!("expected mortality");
        };
        let config = analysis_config_from_args(&args);
        assert_eq!(config.regions, None);
        assert_eq!(config.region_policy, RegionPolicy::Skip);
        assert_eq!(config.source, DataSource::File("data.csv".into()));
    }

    #[test]
    fn report_contains_every_section() {
        let config = AnalysisConfig {
            source: DataSource::Synthetic { seed: 3, days: 30 },
            regions: Some(vec!["SP".to_string(), "RJ".to_string()]),
            plot_width: 60,
            plot_height: 12,
            ..AnalysisConfig::default()
        };
        let run = pipeline::run(&config).unwrap();
        let text = render_report(&run, &config);

        assert!(text.contains("Mortality rate by state"));
        assert!(text.contains("Average daily growth of cases (window 7 days):"));
        assert!(text.contains("Average daily growth of deaths (window 7 days):"));
        assert!(text.contains("Cumulative confirmed cases by state"));
        assert!(text.contains("Correlation heatmap"));
        assert!(text.contains("Lethality rate over time by state"));

        let quiet = AnalysisConfig {
            plot: false,
            ..config
        };
        let text = render_report(&run, &quiet);
        assert!(!text.contains("Correlation heatmap"));
        assert!(text.contains("Mortality rate by state"));
    }
}
