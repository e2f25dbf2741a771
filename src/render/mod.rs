//! SVG rendering and file output for computed [Chart]s
//!
//! The renderer is a thin consumer of chart data: it maps series onto pixel
//! space and never recomputes curves.

mod canvas;
mod style;

pub use canvas::{Anchor, Canvas, Stroke};
pub use style::{color_of, dash_of, Color};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::report::format_time_12h;
use crate::scenario::{Chart, Series};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("refusing to write over directory {0}")]
    IsDirectory(PathBuf),
    #[error("{0} already exists (pass --overwrite to replace it)")]
    Exists(PathBuf),
    #[error("parent directory {0} does not exist (pass --mkdirs to create it)")]
    MissingDirectory(PathBuf),
    #[error("chart has no series to export")]
    NoSeries,
}

/// Page geometry of a rendered chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    pub width: f64,
    pub height: f64,
    pub font_size: f64,
    /// Number of legend columns
    pub legend_columns: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 1300.0,
            height: 700.0,
            font_size: 12.0,
            legend_columns: 2,
        }
    }
}

/// How an output file may be written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    pub overwrite: bool,
    pub mkdirs: bool,
}

const MARKER_DASH: &str = "4 3";

struct Frame {
    left: f64,
    right: f64,
    top: f64,
    bottom: f64,
    x_range: (f64, f64),
    y_max: f64,
}

impl Frame {
    fn x(&self, t: f64) -> f64 {
        let (lo, hi) = self.x_range;
        self.left + (t - lo) / (hi - lo) * (self.right - self.left)
    }

    fn y(&self, v: f64, max: f64) -> f64 {
        self.bottom - v / max * (self.bottom - self.top)
    }
}

/// Tick spacing of 1, 2 or 5 times a power of ten giving at most `max_ticks`
fn nice_step(range: f64, max_ticks: usize) -> f64 {
    if !(range > 0.0) {
        return 1.0;
    }
    let raw = range / max_ticks.max(1) as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * magnitude)
        .find(|&step| step >= raw)
        .unwrap_or(10.0 * magnitude)
}

fn text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * 0.6
}

fn y_ticks(canvas: &mut Canvas, frame: &Frame, max: f64, size: f64, right_side: bool) {
    let step = nice_step(max, 8);
    let grid = Stroke::solid(style::GRID, 0.6).with_opacity(0.5);
    let axis = Stroke::solid(style::TEXT, 1.0);
    let mut v = 0.0;
    while v <= max + 1e-9 {
        let y = frame.y(v, max);
        let label = crate::report::format_number((v * 1e6).round() / 1e6);
        if right_side {
            canvas.line(frame.right, y, frame.right + 4.0, y, &axis);
            let (x, y) = (frame.right + 7.0, y + size * 0.35);
            canvas.text(x, y, &label, size, style::TEXT, Anchor::Start);
        } else {
            canvas.line(frame.left, y, frame.right, y, &grid);
            canvas.line(frame.left - 4.0, y, frame.left, y, &axis);
            let (x, y) = (frame.left - 7.0, y + size * 0.35);
            canvas.text(x, y, &label, size, style::TEXT, Anchor::End);
        }
        v += step;
    }
}

fn draw_series(canvas: &mut Canvas, frame: &Frame, series: &Series, max: f64, clip: usize) {
    let color = color_of(series.color);
    let stroke = Stroke::solid(color, series.width)
        .with_dash(dash_of(series.style, series.width))
        .with_opacity(series.opacity);
    for segment in series.visible_segments() {
        let points = segment
            .into_iter()
            .map(|(t, v)| (frame.x(t), frame.y(v, max)))
            .collect();
        canvas.polyline(points, &stroke, Some(clip));
    }
}

fn draw_legend(canvas: &mut Canvas, frame: &Frame, chart: &Chart, config: &RenderConfig) {
    let entries: Vec<&Series> = chart.legend().collect();
    if entries.is_empty() {
        return;
    }
    let size = config.font_size * 0.85;
    let columns = config.legend_columns.clamp(1, entries.len());
    let rows = entries.len().div_ceil(columns);
    let sample = 26.0;
    let row_height = size * 1.5;
    let column_width = entries
        .iter()
        .map(|s| text_width(&s.label, size))
        .fold(0.0, f64::max)
        + sample
        + 16.0;

    let width = column_width * columns as f64 + 8.0;
    let height = row_height * rows as f64 + 8.0;
    let x0 = frame.right - width - 8.0;
    let y0 = frame.top + 8.0;
    canvas.panel(x0, y0, width, height, Color::rgb(255, 255, 255), 0.85);

    for (i, series) in entries.into_iter().enumerate() {
        let (col, row) = (i / rows, i % rows);
        let x = x0 + 6.0 + col as f64 * column_width;
        let y = y0 + 4.0 + row_height * (row as f64 + 0.5);
        let stroke = Stroke::solid(color_of(series.color), series.width)
            .with_dash(dash_of(series.style, series.width))
            .with_opacity(series.opacity);
        canvas.line(x, y, x + sample, y, &stroke);
        let (tx, ty) = (x + sample + 6.0, y + size * 0.35);
        canvas.text(tx, ty, &series.label, size, style::TEXT, Anchor::Start);
    }
}

/// Render `chart` as a standalone SVG document
pub fn render_svg(chart: &Chart, config: &RenderConfig) -> String {
    let size = config.font_size;
    let title_lines: Vec<&str> = chart.title.lines().collect();
    let right_margin = if chart.secondary_axis.is_some() { 80.0 } else { 25.0 };
    let frame = Frame {
        left: 70.0,
        right: config.width - right_margin,
        top: 20.0 + title_lines.len() as f64 * size * 1.4,
        bottom: config.height - 55.0,
        x_range: chart.x_range,
        y_max: chart.y_max.max(f64::MIN_POSITIVE),
    };
    let mut canvas = Canvas::new(config.width, config.height);

    for (i, line) in title_lines.iter().enumerate() {
        let y = 18.0 + (i as f64 + 0.5) * size * 1.4;
        canvas.text(config.width / 2.0, y, line, size * 1.15, style::TEXT, Anchor::Middle);
    }

    // hourly x ticks with grid
    let grid = Stroke::solid(style::GRID, 0.6).with_opacity(0.5);
    let axis = Stroke::solid(style::TEXT, 1.0);
    let (start, end) = chart.x_range;
    let mut hour = start.ceil();
    while hour <= end + 1e-9 {
        let x = frame.x(hour);
        canvas.line(x, frame.top, x, frame.bottom, &grid);
        canvas.line(x, frame.bottom, x, frame.bottom + 4.0, &axis);
        let label = format_time_12h(hour);
        let y = frame.bottom + 6.0 + size;
        canvas.text(x, y, &label, size * 0.8, style::TEXT, Anchor::Middle);
        hour += 1.0;
    }
    y_ticks(&mut canvas, &frame, frame.y_max, size * 0.85, false);

    let (plot_w, plot_h) = (frame.right - frame.left, frame.bottom - frame.top);
    let clip = canvas.clip(frame.left, frame.top, plot_w, plot_h);
    for marker in &chart.markers {
        if marker.time < start || marker.time > end {
            continue;
        }
        let x = frame.x(marker.time);
        let stroke = Stroke::solid(color_of(marker.color), 1.0)
            .with_dash(Some(MARKER_DASH.to_string()))
            .with_opacity(0.35);
        canvas.clipped_line((x, frame.top), (x, frame.bottom), &stroke, clip);
    }

    let secondary_max = chart
        .secondary_axis
        .as_ref()
        .map(|(_, max)| max.max(f64::MIN_POSITIVE));
    for series in &chart.series {
        let max = match (series.secondary, secondary_max) {
            (true, Some(max)) => max,
            _ => frame.y_max,
        };
        draw_series(&mut canvas, &frame, series, max, clip);
    }

    // axes on top of the data
    canvas.line(frame.left, frame.bottom, frame.right, frame.bottom, &axis);
    canvas.line(frame.left, frame.top, frame.left, frame.bottom, &axis);
    let middle_y = (frame.top + frame.bottom) / 2.0;
    canvas.text(
        (frame.left + frame.right) / 2.0,
        config.height - 12.0,
        &chart.x_label,
        size,
        style::TEXT,
        Anchor::Middle,
    );
    canvas.text_rotated(20.0, middle_y, &chart.y_label, size, style::TEXT);

    if let (Some((label, _)), Some(max)) = (&chart.secondary_axis, secondary_max) {
        canvas.line(frame.right, frame.top, frame.right, frame.bottom, &axis);
        y_ticks(&mut canvas, &frame, max, size * 0.85, true);
        canvas.text_rotated(config.width - 14.0, middle_y, label, size, style::CAFFEINE);
    }

    draw_legend(&mut canvas, &frame, chart, config);
    debug!(series = chart.series.len(), markers = chart.markers.len(), "rendered chart");
    canvas.finish_svg()
}

/// Check that `path` may be written under `options`, creating parents if asked
pub fn prepare_output(path: &Path, options: SaveOptions) -> Result<(), RenderError> {
    if path.is_dir() {
        return Err(RenderError::IsDirectory(path.to_path_buf()));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            if !options.mkdirs {
                return Err(RenderError::MissingDirectory(parent.to_path_buf()));
            }
            fs::create_dir_all(parent)?;
            debug!(dir = %parent.display(), "created output directory");
        }
    }
    if path.exists() && !options.overwrite {
        return Err(RenderError::Exists(path.to_path_buf()));
    }
    Ok(())
}

/// Write an SVG document to `path`
pub fn save_svg(
    svg: &str,
    path: impl AsRef<Path>,
    options: SaveOptions,
) -> Result<(), RenderError> {
    let path = path.as_ref();
    prepare_output(path, options)?;
    fs::write(path, svg)?;
    info!(path = %path.display(), "saved figure");
    Ok(())
}

/// Write every series of `chart` as CSV: a `time` column, then one column
/// per series in drawing order. Hidden points are left empty.
pub fn write_csv(
    chart: &Chart,
    path: impl AsRef<Path>,
    options: SaveOptions,
) -> Result<(), RenderError> {
    let path = path.as_ref();
    prepare_output(path, options)?;
    let first = chart.series.first().ok_or(RenderError::NoSeries)?;

    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["time".to_string()];
    header.extend(chart.series.iter().map(|s| s.label.clone()));
    writer.write_record(&header)?;

    for (i, &t) in first.curve.times().iter().enumerate() {
        let mut record = vec![format!("{t:.6}")];
        for series in &chart.series {
            let cell = series
                .curve
                .values()
                .get(i)
                .filter(|&&v| series.is_visible(t, v))
                .map(|v| format!("{v:.6}"))
                .unwrap_or_default();
            record.push(cell);
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    info!(path = %path.display(), rows = first.curve.len(), "exported series");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{ChartKind, DoseMarker, Scenario, SeriesColor};

    fn chart() -> Chart {
        Scenario::preset(ChartKind::VyvanseWithDex).chart().unwrap()
    }

    #[test]
    fn test_nice_step() {
        assert_eq!(nice_step(40.0, 8), 5.0);
        assert_eq!(nice_step(9.0, 8), 2.0);
        assert_eq!(nice_step(0.0, 8), 1.0);
    }

    #[test]
    fn test_svg_contains_labels() {
        let svg = render_svg(&chart(), &RenderConfig::default());
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Total (Vyvanse + Dex)"));
        assert!(svg.contains(">8am<"));
        assert!(svg.contains(">12pm<"));
        assert!(svg.contains("Hour of Day"));
    }

    #[test]
    fn test_markers_stay_inside_plot() {
        let mut chart = chart();
        chart.markers = vec![
            DoseMarker {
                time: 11.0,
                color: SeriesColor::Dose(0),
            },
            DoseMarker {
                time: 2.0,
                color: SeriesColor::Dose(1),
            },
            DoseMarker {
                time: 40.0,
                color: SeriesColor::Dose(2),
            },
        ];
        let svg = render_svg(&chart, &RenderConfig::default());
        let markers: Vec<&str> = svg
            .lines()
            .filter(|line| line.contains(&format!(r#"stroke-dasharray="{MARKER_DASH}""#)))
            .collect();
        assert_eq!(markers.len(), 1);
        assert!(markers[0].contains(r#"clip-path="url(#clip0)""#));
    }

    #[test]
    fn test_save_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        save_svg("<svg/>", &path, SaveOptions::default()).unwrap();
        let err = save_svg("<svg/>", &path, SaveOptions::default()).unwrap_err();
        assert!(matches!(err, RenderError::Exists(_)));

        let overwrite = SaveOptions {
            overwrite: true,
            ..Default::default()
        };
        save_svg("<svg></svg>", &path, overwrite).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "<svg></svg>");
    }

    #[test]
    fn test_save_checks_directories() {
        let dir = tempfile::tempdir().unwrap();
        let err = save_svg("<svg/>", dir.path(), SaveOptions::default()).unwrap_err();
        assert!(matches!(err, RenderError::IsDirectory(_)));

        let nested = dir.path().join("a").join("b").join("chart.svg");
        let err = save_svg("<svg/>", &nested, SaveOptions::default()).unwrap_err();
        assert!(matches!(err, RenderError::MissingDirectory(_)));

        let mkdirs = SaveOptions {
            mkdirs: true,
            ..Default::default()
        };
        save_svg("<svg/>", &nested, mkdirs).unwrap();
        assert!(nested.exists());
    }

    #[test]
    fn test_csv_export() {
        let chart = chart();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        write_csv(&chart, &path, SaveOptions::default()).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "time");
        assert_eq!(headers.len(), chart.series.len() + 1);
        assert_eq!(reader.records().count(), chart.series[0].curve.len());
    }
}
