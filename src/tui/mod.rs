//! Ratatui-based terminal UI.
//!
//! The TUI lists the analyzed states, charts the selected state's cumulative
//! counts or lethality over time, and shows its latest-day rates. The table is
//! loaded once; changing the growth window recomputes from memory.

use std::io;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::analytics::{ratio, region_series};
use crate::app::pipeline::{self, RunOutput};
use crate::domain::{AnalysisConfig, Dataset, Metric};
use crate::error::AppError;
use crate::io::ingest::RawTable;
use crate::report::fmt_opt_f64;

mod plotters_chart;

use plotters_chart::SeriesChart;

/// Start the TUI.
pub fn run(config: AnalysisConfig) -> Result<(), AppError> {
    // Load before entering the alternate screen so failures print normally.
    eprintln!("Loading dataset...");
    let table = pipeline::load_table(&config.source)?;
    let mut app = App::new(config, table)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// What the chart panel shows for the selected region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartView {
    Confirmed,
    Deaths,
    Lethality,
}

impl ChartView {
    fn next(self) -> Self {
        match self {
            ChartView::Confirmed => ChartView::Deaths,
            ChartView::Deaths => ChartView::Lethality,
            ChartView::Lethality => ChartView::Confirmed,
        }
    }

    fn title(self) -> &'static str {
        match self {
            ChartView::Confirmed => "Cumulative confirmed cases",
            ChartView::Deaths => "Cumulative deaths",
            ChartView::Lethality => "Lethality rate",
        }
    }

    fn y_label(self) -> &'static str {
        match self {
            ChartView::Confirmed => "cases",
            ChartView::Deaths => "deaths",
            ChartView::Lethality => "deaths / cases",
        }
    }

    fn fmt_y(self) -> fn(f64) -> String {
        match self {
            ChartView::Lethality => fmt_axis_rate,
            _ => fmt_axis_count,
        }
    }
}

struct App {
    config: AnalysisConfig,
    table: RawTable,
    run: RunOutput,
    selected: usize,
    view: ChartView,
    status: String,
}

impl App {
    fn new(config: AnalysisConfig, table: RawTable) -> Result<Self, AppError> {
        let run = pipeline::run_analysis(&table, &config)?;
        let status = format!(
            "{} rows read, {} state rows kept",
            run.rows_read,
            run.dataset.len()
        );
        Ok(Self {
            config,
            table,
            run,
            selected: 0,
            view: ChartView::Confirmed,
            status,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected + 1 < self.run.regions.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Tab | KeyCode::Char('v') => {
                self.view = self.view.next();
                self.status = format!("view: {}", self.view.title());
            }
            KeyCode::Char('+') | KeyCode::Right => self.set_window(self.config.window + 1)?,
            KeyCode::Char('-') | KeyCode::Left => {
                self.set_window(self.config.window.saturating_sub(1).max(1))?
            }
            KeyCode::Char('r') => {
                self.status = "Reloading dataset...".to_string();
                self.table = pipeline::load_table(&self.config.source)?;
                self.recompute()?;
                self.status = format!("Reloaded: {} rows read", self.run.rows_read);
            }
            _ => {}
        }
        Ok(false)
    }

    fn set_window(&mut self, window: usize) -> Result<(), AppError> {
        if window == self.config.window {
            return Ok(());
        }
        self.config.window = window;
        self.recompute()?;
        self.status = format!("growth window: {window} days");
        Ok(())
    }

    fn recompute(&mut self) -> Result<(), AppError> {
        self.run = pipeline::run_analysis(&self.table, &self.config)?;
        if self.selected >= self.run.regions.len() {
            self.selected = self.run.regions.len().saturating_sub(1);
        }
        Ok(())
    }

    fn selected_region(&self) -> Option<&str> {
        self.run.regions.get(self.selected).map(String::as_str)
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let span = self
            .run
            .dataset
            .date_span()
            .map(|(first, last)| format!("{first} to {last}"))
            .unwrap_or_else(|| "-".to_string());

        let lines = vec![
            Line::from(vec![
                Span::styled("epi", Style::default().fg(Color::Cyan)),
                Span::raw(" | state-level COVID-19 analytics"),
            ]),
            Line::from(Span::styled(
                format!(
                    "states: {} | rows: {} | dates: {span} | window: {} days",
                    self.run.regions.len(),
                    self.run.dataset.len(),
                    self.config.window,
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(20), Constraint::Min(0)])
            .split(area);
        self.draw_regions(frame, columns[0]);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(8)])
            .split(columns[1]);
        self.draw_chart(frame, rows[0]);
        self.draw_stats(frame, rows[1]);
    }

    fn draw_regions(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .run
            .mortality
            .iter()
            .map(|row| ListItem::new(format!("{:<4} {:>8}", row.region, fmt_opt_f64(row.mortality_rate, 4))))
            .collect();

        let list = List::new(items)
            .block(Block::default().title("States").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let region = self.selected_region().unwrap_or("-");
        let block = Block::default()
            .title(format!("{} | {region}", self.view.title()))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(data) = chart_series(&self.run.dataset, region, self.view) else {
            let msg = Paragraph::new("No rows for this state.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let (chart_rect, insets) = chart_layout(inner);
        let widget = SeriesChart {
            line: &data.line,
            last: data.line.last().copied(),
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
            x_label: "date",
            y_label: self.view.y_label(),
            fmt_x: fmt_axis_date,
            fmt_y: self.view.fmt_y(),
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, &data, self.view);
        }
    }

    fn draw_stats(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let i = self.selected;
        let mut lines = Vec::new();
        if let Some(row) = self.run.mortality.get(i) {
            let date = row.date.map(|d| d.to_string()).unwrap_or_else(|| "N/A".to_string());
            let count = |v: Option<u64>| v.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string());
            lines.push(Line::from(format!("Latest day:      {date}")));
            lines.push(Line::from(format!(
                "Confirmed:       {} | Deaths: {}",
                count(row.confirmed),
                count(row.deaths)
            )));
            lines.push(Line::from(format!(
                "Mortality rate:  {}",
                fmt_opt_f64(row.mortality_rate, 4)
            )));
        }
        let growth = |rates: &[crate::domain::GrowthRate]| {
            rates
                .get(i)
                .map(|g| format!("{} ({} samples)", fmt_opt_f64(g.mean_growth, 4), g.samples))
                .unwrap_or_else(|| "N/A".to_string())
        };
        lines.push(Line::from(format!("Case growth:     {}", growth(&self.run.case_growth))));
        lines.push(Line::from(format!("Death growth:    {}", growth(&self.run.death_growth))));

        let p = Paragraph::new(Text::from(lines))
            .block(Block::default().title("Latest").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ state  Tab view  +/- window  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Chart input for one region: x is the date as days from the common era.
#[derive(Debug, Clone, PartialEq)]
struct ChartData {
    line: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Build the selected region's series. Undefined lethality points are skipped.
fn chart_series(dataset: &Dataset, region: &str, view: ChartView) -> Option<ChartData> {
    let series = region_series(dataset, region);
    let line: Vec<(f64, f64)> = series
        .observations
        .iter()
        .filter_map(|o| {
            let x = f64::from(o.date.num_days_from_ce());
            let y = match view {
                ChartView::Confirmed => Some(Metric::Confirmed.value(o) as f64),
                ChartView::Deaths => Some(Metric::Deaths.value(o) as f64),
                ChartView::Lethality => ratio(o.deaths, o.confirmed),
            };
            y.map(|y| (x, y))
        })
        .collect();
    if line.is_empty() {
        return None;
    }

    let x0 = line[0].0;
    let mut x1 = line[line.len() - 1].0;
    if x1 <= x0 {
        x1 = x0 + 1.0;
    }

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in &line {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if y_max <= y_min {
        y_max = y_min + 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    Some(ChartData {
        line,
        x_bounds: [x0, x1],
        y_bounds: [y_min - pad, y_max + pad],
    })
}

fn fmt_axis_date(days: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(days.round() as i32)
        .map(|d| d.format("%m-%d").to_string())
        .unwrap_or_default()
}

fn fmt_axis_count(v: f64) -> String {
    if v.abs() >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if v.abs() >= 1e3 {
        format!("{:.0}k", v / 1e3)
    } else {
        format!("{v:.0}")
    }
}

fn fmt_axis_rate(v: f64) -> String {
    format!("{v:.3}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    data: &ChartData,
    view: ChartView,
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);
    let [x0, x1] = data.x_bounds;
    let [y0, y1] = data.y_bounds;
    let fmt_y = view.fmt_y();

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_date(x0 + u * (x1 - x0));
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_y(y0 + u * (y1 - y0));
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("date")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(view.y_label())
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
