use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use tracing::{debug, info};

use crate::models::{ChartRequest, ChartStyle, Column, PriceSeries};
use crate::utils::errors::{render_error, ChartError};
use crate::utils::stats;

/// Directory charts are written to, relative to the working directory
pub const OUTPUT_DIR: &str = "charts";

/// Figure size in pixels (14 x 10 inches at 100 dpi)
pub const FIGURE_SIZE: (u32, u32) = (1400, 1000);

/// Rows reserved in the figure. Only the first three are drawn on.
const PANEL_ROWS: usize = 4;

const RSI_OVERBOUGHT: f64 = 70.0;
const RSI_OVERSOLD: f64 = 30.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

const CLOSE_COLOR: RGBColor = RGBColor(0, 0, 255);
const AVERAGE_COLOR: RGBColor = RGBColor(255, 165, 0);
const RSI_COLOR: RGBColor = RGBColor(128, 0, 128);
const OVERBOUGHT_COLOR: RGBColor = RGBColor(255, 0, 0);
const OVERSOLD_COLOR: RGBColor = RGBColor(0, 128, 0);
const MACD_COLOR: RGBColor = RGBColor(0, 0, 255);
const SIGNAL_COLOR: RGBColor = RGBColor(255, 165, 0);
const BAND_COLOR: RGBColor = RGBColor(128, 128, 128);

type Panel<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

/// Bitmap canvas owned by a single render call.
/// The backend is released when the canvas is dropped, on every exit path.
pub struct Canvas<'a> {
    root: DrawingArea<BitMapBackend<'a>, Shift>,
}

impl<'a> Canvas<'a> {
    pub fn create(path: &'a Path, size: (u32, u32), style: &ChartStyle) -> Result<Self, ChartError> {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&style.background)
            .map_err(|e| render_error("Failed to fill canvas", e))?;
        debug!("Acquired {}x{} canvas for {}", size.0, size.1, path.display());
        Ok(Self { root })
    }

    /// Split the figure into equally sized, vertically stacked rows
    pub fn rows(&self) -> Vec<DrawingArea<BitMapBackend<'a>, Shift>> {
        self.root.split_evenly((PANEL_ROWS, 1))
    }

    /// Flush the figure to its file
    pub fn present(self) -> Result<(), ChartError> {
        self.root.present()
            .map_err(|e| render_error("Failed to save chart", e))
    }
}

impl Drop for Canvas<'_> {
    fn drop(&mut self) {
        debug!("Released chart canvas");
    }
}

/// Renders multi-panel indicator charts into an output directory
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    output_dir: PathBuf,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::in_dir(OUTPUT_DIR)
    }
}

impl ChartRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer writing into `dir` instead of `charts`
    pub fn in_dir<P: Into<PathBuf>>(dir: P) -> Self {
        Self { output_dir: dir.into() }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render price, RSI and MACD panels for `series` and save the figure.
    ///
    /// The style is resolved and the series validated before anything
    /// touches the filesystem, so an unknown style or a missing column never
    /// leaves a file behind. Returns the path of the written image.
    pub fn render(&self, series: &PriceSeries, request: &ChartRequest) -> Result<PathBuf, ChartError> {
        let style = ChartStyle::preset(request.style_name())?;
        debug!("Rendering {} {} with style '{}'", request.ticker, request.period, style.name);

        let rows = series.validate()?;
        let band = std_dev_band(series);
        match band {
            Some((lower, upper)) => {
                debug!("Series has {} rows, deviation band {:.4}..{:.4}", rows, lower, upper)
            }
            None => debug!("Series has {} rows, no finite close for a deviation band", rows),
        }

        if !self.output_dir.exists() {
            debug!("Creating output directory {}", self.output_dir.display());
        }
        fs::create_dir_all(&self.output_dir)?;

        let filepath = self.output_dir.join(request.file_name());

        {
            let canvas = Canvas::create(&filepath, FIGURE_SIZE, &style)?;
            let panels = canvas.rows();

            draw_price_panel(&panels[0], series, band, request, &style)?;
            draw_rsi_panel(&panels[1], series, &style)?;
            draw_macd_panel(&panels[2], series, &style)?;
            // panels[3] is reserved and stays blank

            canvas.present()?;
        }

        info!("📈 Saved {} {} chart to {}", request.ticker, request.period, filepath.display());
        println!("{}", saved_message(&filepath));

        Ok(filepath)
    }
}

/// Render a chart into `charts/` with the default renderer
pub fn render_chart(
    series: &PriceSeries,
    ticker: &str,
    period: &str,
    filename: Option<&str>,
    style: Option<&str>,
) -> Result<PathBuf, ChartError> {
    let mut request = ChartRequest::new(ticker, period);
    request.filename = filename.map(str::to_string);
    request.style = style.map(str::to_string);
    ChartRenderer::new().render(series, &request)
}

/// Confirmation line printed after a chart is written
pub fn saved_message(path: &Path) -> String {
    format!("Saved chart as {}", path.display())
}

/// Shaded band of panel 1: mean(close) ± std(close) over the whole series.
/// `None` when close is absent or has no finite values.
pub fn std_dev_band(series: &PriceSeries) -> Option<(f64, f64)> {
    stats::std_band(series.column(Column::Close)?)
}

fn draw_price_panel<'a, DB: DrawingBackend + 'a>(
    area: &'a DrawingArea<DB, Shift>,
    series: &PriceSeries,
    band: Option<(f64, f64)>,
    request: &ChartRequest,
    style: &ChartStyle,
) -> Result<(), ChartError> {
    let close = series.require(Column::Close)?;
    let moving_average = series.column(Column::MovingAverage);

    let (xs, x_pad, x_desc) = match series.dates() {
        Some(dates) => (
            dates.iter().map(|d| d.timestamp() as f64).collect::<Vec<_>>(),
            SECONDS_PER_DAY,
            Some("Date"),
        ),
        None => (index_axis(close.len()), 0.5, None),
    };
    let (x_min, x_max) = x_bounds(&xs, x_pad);
    let (y_min, y_max) = stats::padded_range(
        close.iter()
            .chain(moving_average.unwrap_or(&[]))
            .chain(band.iter().flat_map(|(lower, upper)| [lower, upper])),
    );

    let title = format!("{} - Close price and moving average for {}", request.ticker, request.period);
    let mut chart = build_panel(area, &title, x_min..x_max, y_min..y_max, style)?;

    let date_labels = |x: &f64| format_timestamp(*x);
    let formatter = series.dates().map(|_| &date_labels as &dyn Fn(&f64) -> String);
    draw_mesh(&mut chart, x_desc, "Price", style, formatter)?;

    if let Some((lower, upper)) = band {
        let band_fill = BAND_COLOR.mix(0.2).filled();
        chart
            .draw_series(std::iter::once(Rectangle::new([(x_min, upper), (x_max, lower)], band_fill)))
            .map_err(|e| render_error("Failed to draw deviation band", e))?
            .label("Standard deviation")
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], band_fill));
    }

    draw_line(&mut chart, &xs, close, CLOSE_COLOR, "Close price", style)?;
    if let Some(average) = moving_average {
        draw_line(&mut chart, &xs, average, AVERAGE_COLOR, "Moving average", style)?;
    }

    draw_legend(&mut chart, style)?;
    debug!("Drew price panel");
    Ok(())
}

// RSI and MACD are plotted against the row index even when dates exist
fn draw_rsi_panel<'a, DB: DrawingBackend + 'a>(
    area: &'a DrawingArea<DB, Shift>,
    series: &PriceSeries,
    style: &ChartStyle,
) -> Result<(), ChartError> {
    let rsi = series.require(Column::Rsi)?;
    let xs = index_axis(rsi.len());
    let (x_min, x_max) = x_bounds(&xs, 0.5);
    let (y_min, y_max) = stats::padded_range(rsi.iter().chain(&[RSI_OVERBOUGHT, RSI_OVERSOLD]));

    let mut chart = build_panel(area, "Relative Strength Index (RSI)", x_min..x_max, y_min..y_max, style)?;
    draw_mesh(&mut chart, Some("Date"), "RSI", style, None)?;

    draw_line(&mut chart, &xs, rsi, RSI_COLOR, "RSI", style)?;
    draw_threshold(&mut chart, (x_min, x_max), RSI_OVERBOUGHT, OVERBOUGHT_COLOR, "Overbought (70)", style)?;
    draw_threshold(&mut chart, (x_min, x_max), RSI_OVERSOLD, OVERSOLD_COLOR, "Oversold (30)", style)?;

    draw_legend(&mut chart, style)?;
    debug!("Drew RSI panel");
    Ok(())
}

fn draw_macd_panel<'a, DB: DrawingBackend + 'a>(
    area: &'a DrawingArea<DB, Shift>,
    series: &PriceSeries,
    style: &ChartStyle,
) -> Result<(), ChartError> {
    let macd = series.require(Column::Macd)?;
    let signal = series.require(Column::SignalLine)?;
    let xs = index_axis(macd.len());
    let (x_min, x_max) = x_bounds(&xs, 0.5);
    let (y_min, y_max) = stats::padded_range(macd.iter().chain(signal));

    let mut chart = build_panel(area, "MACD", x_min..x_max, y_min..y_max, style)?;
    draw_mesh(&mut chart, Some("Date"), "MACD", style, None)?;

    draw_line(&mut chart, &xs, macd, MACD_COLOR, "MACD", style)?;
    draw_line(&mut chart, &xs, signal, SIGNAL_COLOR, "Signal line", style)?;

    draw_legend(&mut chart, style)?;
    debug!("Drew MACD panel");
    Ok(())
}

fn build_panel<'a, DB: DrawingBackend + 'a>(
    area: &'a DrawingArea<DB, Shift>,
    title: &str,
    x_range: std::ops::Range<f64>,
    y_range: std::ops::Range<f64>,
    style: &ChartStyle,
) -> Result<Panel<'a, DB>, ChartError> {
    ChartBuilder::on(area)
        .caption(title, (style.font, style.title_size).into_font().color(&style.foreground))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| render_error("Failed to build chart", e))
}

fn draw_mesh<'a, DB: DrawingBackend + 'a>(
    chart: &mut Panel<'a, DB>,
    x_desc: Option<&str>,
    y_desc: &str,
    style: &ChartStyle,
    x_formatter: Option<&dyn Fn(&f64) -> String>,
) -> Result<(), ChartError> {
    let label_font = (style.font, style.label_size).into_font().color(&style.foreground);

    let mut mesh = chart.configure_mesh();
    mesh.y_desc(y_desc)
        .axis_style(style.foreground)
        .bold_line_style(style.grid.mix(0.6))
        .light_line_style(style.grid.mix(0.2))
        .label_style(label_font.clone())
        .axis_desc_style(label_font);
    if let Some(desc) = x_desc {
        mesh.x_desc(desc);
    }
    if let Some(formatter) = x_formatter {
        mesh.x_label_formatter(formatter);
    }
    mesh.draw()
        .map_err(|e| render_error("Failed to draw mesh", e))
}

/// Draw `ys` against `xs`, breaking the line wherever a value is missing
fn draw_line<'a, DB: DrawingBackend + 'a>(
    chart: &mut Panel<'a, DB>,
    xs: &[f64],
    ys: &[f64],
    color: RGBColor,
    label: &str,
    style: &ChartStyle,
) -> Result<(), ChartError> {
    let line_style = color.stroke_width(style.line_width);
    let mut labelled = false;

    for run in finite_runs(xs, ys) {
        let anno = chart
            .draw_series(LineSeries::new(run, line_style))
            .map_err(|e| render_error("Failed to draw line", e))?;
        if !labelled {
            anno.label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));
            labelled = true;
        }
    }

    Ok(())
}

fn draw_threshold<'a, DB: DrawingBackend + 'a>(
    chart: &mut Panel<'a, DB>,
    (x_min, x_max): (f64, f64),
    level: f64,
    color: RGBColor,
    label: &str,
    style: &ChartStyle,
) -> Result<(), ChartError> {
    let line_style = color.mix(0.5).stroke_width(style.line_width);
    chart
        .draw_series(DashedLineSeries::new(vec![(x_min, level), (x_max, level)], 10, 6, line_style))
        .map_err(|e| render_error("Failed to draw threshold", e))?
        .label(label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));
    Ok(())
}

fn draw_legend<'a, DB: DrawingBackend + 'a>(
    chart: &mut Panel<'a, DB>,
    style: &ChartStyle,
) -> Result<(), ChartError> {
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(style.background.mix(0.8))
        .border_style(style.foreground)
        .label_font((style.font, style.label_size).into_font().color(&style.foreground))
        .draw()
        .map_err(|e| render_error("Failed to draw legend", e))
}

fn index_axis(len: usize) -> Vec<f64> {
    (0..len).map(|i| i as f64).collect()
}

/// Data extent of `xs`, widened by `pad` on both sides when it is a single point
fn x_bounds(xs: &[f64], pad: f64) -> (f64, f64) {
    let min = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if max - min <= 0.0 {
        return (min - pad, max + pad);
    }
    (min, max)
}

fn finite_runs(xs: &[f64], ys: &[f64]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();

    for (&x, &y) in xs.iter().zip(ys) {
        if y.is_finite() {
            current.push((x, y));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

fn format_timestamp(secs: f64) -> String {
    DateTime::<Utc>::from_timestamp(secs.round() as i64, 0)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn temp_renderer(name: &str) -> ChartRenderer {
        let dir = std::env::temp_dir()
            .join(format!("stock_charts_{}_{}", name, uuid::Uuid::new_v4()))
            .join(OUTPUT_DIR);
        ChartRenderer::in_dir(dir)
    }

    fn cleanup(renderer: &ChartRenderer) {
        if let Some(parent) = renderer.output_dir().parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    fn example_series() -> PriceSeries {
        PriceSeries::new()
            .with_column(Column::Close, vec![10.0, 11.0, 9.0, 12.0, 13.0])
            .with_column(Column::Rsi, vec![45.0, 50.0, 55.0, 60.0, 65.0])
            .with_column(Column::Macd, vec![0.1, 0.2, 0.15, 0.3, 0.25])
            .with_column(Column::SignalLine, vec![0.05, 0.15, 0.1, 0.2, 0.2])
    }

    fn dates(count: u32) -> Vec<DateTime<Utc>> {
        (1..=count)
            .map(|day| Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap())
            .collect()
    }

    #[test]
    fn test_end_to_end_example() {
        let renderer = temp_renderer("e2e");
        let request = ChartRequest::new("TST", "5D");

        let path = renderer.render(&example_series(), &request).expect("render failed");

        assert_eq!(path, renderer.output_dir().join("TST_5D.png"));
        assert!(path.is_file());
        assert!(fs::metadata(&path).unwrap().len() > 0);
        cleanup(&renderer);
    }

    #[test]
    fn test_exactly_one_file_with_dates_and_average() {
        let renderer = temp_renderer("dated");
        let series = example_series()
            .with_dates(dates(5))
            .with_column(Column::MovingAverage, vec![f64::NAN, f64::NAN, 10.0, 10.6667, 11.3333]);
        let request = ChartRequest::new("AAPL", "30D").with_filename("aapl.png");

        let path = renderer.render(&series, &request).expect("render failed");

        let files: Vec<_> = fs::read_dir(renderer.output_dir()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(path.file_name().unwrap(), "aapl.png");
        cleanup(&renderer);
    }

    #[test]
    fn test_saved_message_for_default_dir() {
        let path = ChartRenderer::new().output_dir().join(ChartRequest::new("TST", "5D").file_name());
        assert_eq!(saved_message(&path), "Saved chart as charts/TST_5D.png");
    }

    #[test]
    fn test_all_missing_close_renders_without_band() {
        let renderer = temp_renderer("nan_close");
        let series = PriceSeries::new()
            .with_column(Column::Close, vec![f64::NAN, f64::NAN])
            .with_column(Column::Rsi, vec![45.0, 50.0])
            .with_column(Column::Macd, vec![0.1, 0.2])
            .with_column(Column::SignalLine, vec![0.05, 0.15]);
        assert_eq!(std_dev_band(&series), None);

        let path = renderer.render(&series, &ChartRequest::new("TST", "2D")).expect("render failed");
        assert!(path.is_file());
        cleanup(&renderer);
    }

    #[test]
    fn test_without_moving_average() {
        let renderer = temp_renderer("no_ma");
        let series = example_series();
        assert!(series.column(Column::MovingAverage).is_none());

        let path = renderer.render(&series, &ChartRequest::new("TST", "5D")).unwrap();
        assert!(path.is_file());
        cleanup(&renderer);
    }

    #[test]
    fn test_single_row_series() {
        let renderer = temp_renderer("single");
        let series = PriceSeries::new()
            .with_dates(dates(1))
            .with_column(Column::Close, vec![10.0])
            .with_column(Column::Rsi, vec![50.0])
            .with_column(Column::Macd, vec![0.0])
            .with_column(Column::SignalLine, vec![0.0]);

        let path = renderer.render(&series, &ChartRequest::new("ONE", "1D")).unwrap();
        assert!(path.is_file());
        cleanup(&renderer);
    }

    #[test]
    fn test_missing_required_column_writes_nothing() {
        for column in Column::REQUIRED {
            let renderer = temp_renderer("missing");
            let mut series = example_series();
            series.remove_column(column);

            let result = renderer.render(&series, &ChartRequest::new("TST", "5D"));

            match result {
                Err(ChartError::MissingColumn(name)) => assert_eq!(name, column.name()),
                other => panic!("expected MissingColumn for {}, got {:?}", column.name(), other),
            }
            assert!(!renderer.output_dir().join("TST_5D.png").exists());
            cleanup(&renderer);
        }
    }

    #[test]
    fn test_invalid_style_creates_nothing() {
        let renderer = temp_renderer("style");
        let request = ChartRequest::new("TST", "5D").with_style("no-such-style");

        let result = renderer.render(&example_series(), &request);

        assert!(matches!(result, Err(ChartError::InvalidStyle(ref name)) if name == "no-such-style"));
        assert!(!renderer.output_dir().exists());
        cleanup(&renderer);
    }

    #[test]
    fn test_render_chart_rejects_style_before_touching_disk() {
        let result = render_chart(&example_series(), "TST", "5D", Some("never.png"), Some("unknown"));
        assert!(matches!(result, Err(ChartError::InvalidStyle(_))));
        assert!(!Path::new(OUTPUT_DIR).join("never.png").exists());
    }

    #[test]
    fn test_every_preset_renders() {
        let renderer = temp_renderer("presets");
        for name in ChartStyle::available() {
            let request = ChartRequest::new("TST", name).with_style(name);
            let path = renderer.render(&example_series(), &request).unwrap();
            assert!(path.is_file(), "no chart for style {}", name);
        }
        cleanup(&renderer);
    }

    #[test]
    fn test_second_render_overwrites() {
        let renderer = temp_renderer("overwrite");
        let request = ChartRequest::new("TST", "5D");

        let path = renderer.render(&example_series(), &request).unwrap();
        let first = fs::read(&path).unwrap();

        let mut series = example_series();
        series.set_column(Column::Close, vec![100.0, 50.0, 120.0, 40.0, 130.0]);
        let second_path = renderer.render(&series, &request.clone().with_style("dark_background")).unwrap();
        let second = fs::read(&second_path).unwrap();

        assert_eq!(path, second_path);
        assert_ne!(first, second);
        assert_eq!(fs::read_dir(renderer.output_dir()).unwrap().count(), 1);
        cleanup(&renderer);
    }

    #[test]
    fn test_unsupported_extension_is_render_error() {
        let renderer = temp_renderer("ext");
        let request = ChartRequest::new("TST", "5D").with_filename("chart.unknown");

        let result = renderer.render(&example_series(), &request);
        assert!(matches!(result, Err(ChartError::Render(_))));
        cleanup(&renderer);
    }

    #[test]
    fn test_std_dev_band_ignores_dates() {
        let plain = example_series();
        let dated = example_series().with_dates(dates(5));

        let (lower, upper) = std_dev_band(&plain).unwrap();
        let std_dev = 2.0_f64.sqrt();
        assert!((lower - (11.0 - std_dev)).abs() < 1e-12);
        assert!((upper - (11.0 + std_dev)).abs() < 1e-12);
        assert_eq!(std_dev_band(&dated).unwrap(), (lower, upper));
    }

    #[test]
    fn test_default_renderer_uses_charts_dir() {
        assert_eq!(ChartRenderer::new().output_dir(), Path::new("charts"));
    }

    #[test]
    fn test_finite_runs_split_on_missing_values() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [f64::NAN, 1.0, 2.0, f64::NAN, 4.0];
        let runs = finite_runs(&xs, &ys);
        assert_eq!(runs, vec![vec![(1.0, 1.0), (2.0, 2.0)], vec![(4.0, 4.0)]]);
    }

    #[test]
    fn test_x_bounds_widens_single_point() {
        assert_eq!(x_bounds(&[3.0], 0.5), (2.5, 3.5));
        assert_eq!(x_bounds(&[0.0, 4.0], 0.5), (0.0, 4.0));
    }

    #[test]
    fn test_format_timestamp() {
        let day = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(format_timestamp(day.timestamp() as f64), "2024-03-05");
    }
}
