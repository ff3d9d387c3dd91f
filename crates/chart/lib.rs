//! PNG renderers for the population table.

use log::{debug, info};
use plotters::prelude::*;
use population::{format_thousands, PopulationTable};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;

pub const TREND_FILE: &str = "lt_population_trend.png";
pub const ABS_CHANGE_FILE: &str = "lt_population_abs_change.png";
pub const PCT_CHANGE_FILE: &str = "lt_population_pct_change.png";

const LINE_COLOR: RGBColor = RGBColor(31, 119, 180);
const BAR_HALF_WIDTH: f64 = 0.4;
const TITLE_PT: f64 = 14.0;
const LABEL_PT: f64 = 10.0;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("cannot create output directory {path:?}: {source}")]
    OutDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to render {path:?}: {message}")]
    Render { path: PathBuf, message: String },
    #[error("nothing to plot for {0}")]
    NoData(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub dpi: u32,
    /// width, height in inches
    pub figure_size: (f64, f64),
    pub out_dir: PathBuf,
    /// first and last year named in the trend title
    pub period: (i32, i32),
}

impl Default for ChartOptions {
    fn default() -> Self {
        ChartOptions {
            dpi: 150,
            figure_size: (10.0, 6.0),
            out_dir: PathBuf::from("."),
            period: (1990, 2024),
        }
    }
}

impl ChartOptions {
    pub fn pixel_size(&self) -> (u32, u32) {
        let (w, h) = self.figure_size;
        let dpi = self.dpi as f64;
        ((w * dpi).round() as u32, (h * dpi).round() as u32)
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.out_dir.join(file_name)
    }

    fn font_px(&self, points: f64) -> u32 {
        (points * self.dpi as f64 / 72.0).round() as u32
    }

    fn trend_title(&self) -> String {
        format!("Population of Lithuania ({}–{})", self.period.0, self.period.1)
    }

    fn prepare(&self, file_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir).map_err(|source| Error::OutDir {
            path: self.out_dir.clone(),
            source,
        })?;
        Ok(self.path(file_name))
    }
}

struct Figure<'a> {
    title: &'a str,
    y_desc: &'a str,
    y_format: fn(&f64) -> String,
    /// every year of the table, sets the x axis even when `points` is empty
    years: Vec<i32>,
    points: Vec<(f64, f64)>,
}

fn count_label(y: &f64) -> String {
    format_thousands(*y)
}

fn percent_label(y: &f64) -> String {
    format!("{:.2}", y)
}

/// Padded value range; `include_zero` keeps the baseline in view.
pub fn value_range(values: &[f64], include_zero: bool) -> Range<f64> {
    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    let span = hi - lo;
    let pad = if span > 0.0 {
        span * 0.05
    } else {
        (hi.abs() * 0.05).max(1.0)
    };
    (lo - pad)..(hi + pad)
}

/// Year axis with half a year of room on each side for the bars.
pub fn year_range(years: &[i32]) -> Range<f64> {
    match (years.iter().min(), years.iter().max()) {
        (Some(&lo), Some(&hi)) => (lo as f64 - 0.5)..(hi as f64 + 0.5),
        _ => 0.0..1.0,
    }
}

/// Opposite corners of the bar for `value` at `year`, anchored on zero.
pub fn bar_bounds(year: i32, value: f64) -> [(f64, f64); 2] {
    let x = year as f64;
    [(x - BAR_HALF_WIDTH, 0.0), (x + BAR_HALF_WIDTH, value)]
}

fn draw(
    path: &Path,
    options: &ChartOptions,
    figure: &Figure,
    bars: bool,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let values: Vec<f64> = figure.points.iter().map(|&(_, y)| y).collect();
    let x_range = year_range(&figure.years);
    let y_range = value_range(&values, bars);
    let (x_min, x_max) = (x_range.start, x_range.end);

    let root = BitMapBackend::new(path, options.pixel_size()).into_drawing_area();
    root.fill(&WHITE)?;

    let label_px = options.font_px(LABEL_PT);
    let label_font = ("sans-serif", label_px as f64);
    let title_font = ("sans-serif", options.font_px(TITLE_PT) as f64);
    let mut chart = ChartBuilder::on(&root)
        .caption(figure.title, title_font)
        .margin(options.font_px(LABEL_PT))
        .x_label_area_size(label_px * 4)
        .y_label_area_size(label_px * 8)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc(figure.y_desc)
        .label_style(label_font)
        .axis_desc_style(label_font)
        .x_labels(12)
        .x_label_formatter(&|x| format!("{:.0}", x))
        .y_label_formatter(&figure.y_format)
        .draw()?;

    if bars {
        chart.draw_series(
            figure
                .points
                .iter()
                .map(|&(x, y)| Rectangle::new(bar_bounds(x as i32, y), LINE_COLOR.filled())),
        )?;
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x_min, 0.0), (x_max, 0.0)],
            BLACK.stroke_width(2),
        )))?;
    } else {
        chart.draw_series(LineSeries::new(
            figure.points.iter().copied(),
            LINE_COLOR.stroke_width(2),
        ))?;
        chart.draw_series(
            figure
                .points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), label_px / 3 + 2, LINE_COLOR.filled())),
        )?;
    }

    root.present()?;
    Ok(())
}

fn render(
    file_name: &'static str,
    options: &ChartOptions,
    figure: Figure,
    bars: bool,
) -> Result<PathBuf> {
    if figure.years.is_empty() {
        return Err(Error::NoData(file_name));
    }
    let path = options.prepare(file_name)?;
    debug!("rendering {} points to {:?}", figure.points.len(), path);
    draw(&path, options, &figure, bars).map_err(|e| Error::Render {
        path: path.clone(),
        message: e.to_string(),
    })?;
    info!("figure saved: {:?}", path);
    Ok(path)
}

/// Line chart with markers of the population by year.
pub fn plot_population_trend(table: &PopulationTable, options: &ChartOptions) -> Result<PathBuf> {
    let points = table
        .records()
        .iter()
        .map(|r| (r.year as f64, r.population))
        .collect();
    let title = options.trend_title();
    let figure = Figure {
        title: &title,
        y_desc: "Population",
        y_format: count_label,
        years: table.years(),
        points,
    };
    render(TREND_FILE, options, figure, false)
}

pub fn plot_abs_change(table: &PopulationTable, options: &ChartOptions) -> Result<PathBuf> {
    let points = table
        .records()
        .iter()
        .filter_map(|r| r.abs_change.map(|v| (r.year as f64, v)))
        .collect();
    let figure = Figure {
        title: "Yearly Absolute Population Change",
        y_desc: "Change in Population",
        y_format: count_label,
        years: table.years(),
        points,
    };
    render(ABS_CHANGE_FILE, options, figure, true)
}

pub fn plot_pct_change(table: &PopulationTable, options: &ChartOptions) -> Result<PathBuf> {
    let points = table
        .records()
        .iter()
        .filter_map(|r| r.pct_change.map(|v| (r.year as f64, v)))
        .collect();
    let figure = Figure {
        title: "Yearly % Population Change",
        y_desc: "Percent Change (%)",
        y_format: percent_label,
        years: table.years(),
        points,
    };
    render(PCT_CHANGE_FILE, options, figure, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use population::{add_change_columns, YearValue};

    #[test]
    fn test_pixel_size() {
        assert_eq!(ChartOptions::default().pixel_size(), (1500, 900));
        let options = ChartOptions {
            dpi: 100,
            figure_size: (6.4, 4.8),
            ..ChartOptions::default()
        };
        assert_eq!(options.pixel_size(), (640, 480));
    }

    #[test]
    fn test_font_scales_with_dpi() {
        let options = ChartOptions {
            dpi: 72,
            ..ChartOptions::default()
        };
        assert_eq!(options.font_px(14.0), 14);
        assert_eq!(ChartOptions::default().font_px(14.0), 29);
    }

    #[test]
    fn test_value_range_includes_zero_for_bars() {
        let r = value_range(&[-50000.0, -10000.0], true);
        assert!(r.start < -50000.0);
        assert!(r.end > 0.0);
        let r = value_range(&[3000000.0, 3700000.0], false);
        assert!(r.start > 0.0 && r.start < 3000000.0);
        assert!(r.end > 3700000.0);
    }

    #[test]
    fn test_value_range_degenerate() {
        let r = value_range(&[5.0], false);
        assert!(r.start < 5.0 && r.end > 5.0);
        assert_eq!(value_range(&[], true), 0.0..1.0);
    }

    #[test]
    fn test_year_range() {
        assert_eq!(year_range(&[1990, 2024, 2000]), 1989.5..2024.5);
        assert_eq!(year_range(&[]), 0.0..1.0);
    }

    #[test]
    fn test_bar_bounds() {
        let [(x0, y0), (x1, y1)] = bar_bounds(1991, -10000.0);
        assert!((x0 - 1990.6).abs() < 1e-9);
        assert!((x1 - 1991.4).abs() < 1e-9);
        assert_eq!(y0, 0.0);
        assert_eq!(y1, -10000.0);
    }

    #[test]
    fn test_trend_title() {
        assert_eq!(
            ChartOptions::default().trend_title(),
            "Population of Lithuania (1990–2024)"
        );
        let options = ChartOptions {
            period: (2000, 2020),
            ..ChartOptions::default()
        };
        assert_eq!(options.trend_title(), "Population of Lithuania (2000–2020)");
    }

    fn png_size(path: &Path) -> (u32, u32) {
        let bytes = fs::read(path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let width = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]);
        let height = u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
        (width, height)
    }

    fn sample_table() -> PopulationTable {
        add_change_columns(
            [(1990, 3704000.0), (1991, 3702000.0), (1992, 3700000.0), (1993, 3629000.0)]
                .iter()
                .map(|&(year, population)| YearValue { year, population })
                .collect(),
        )
    }

    #[test]
    fn test_render_all_charts() {
        let dir = tempfile::tempdir().unwrap();
        let options = ChartOptions {
            out_dir: dir.path().to_path_buf(),
            ..ChartOptions::default()
        };
        let table = sample_table();
        let written = [
            plot_population_trend(&table, &options).unwrap(),
            plot_abs_change(&table, &options).unwrap(),
            plot_pct_change(&table, &options).unwrap(),
        ];
        let expected = [TREND_FILE, ABS_CHANGE_FILE, PCT_CHANGE_FILE];
        for (path, name) in written.iter().zip(expected) {
            assert_eq!(path, &dir.path().join(name));
            assert_eq!(png_size(path), (1500, 900));
        }
    }

    #[test]
    fn test_change_chart_for_single_year() {
        let table = add_change_columns(vec![YearValue {
            year: 2024,
            population: 2885891.0,
        }]);
        let dir = tempfile::tempdir().unwrap();
        let options = ChartOptions {
            out_dir: dir.path().join("charts"),
            period: (2024, 2024),
            ..ChartOptions::default()
        };
        let abs = plot_abs_change(&table, &options).unwrap();
        let pct = plot_pct_change(&table, &options).unwrap();
        assert_eq!(abs, options.out_dir.join(ABS_CHANGE_FILE));
        assert_eq!(pct, options.out_dir.join(PCT_CHANGE_FILE));
        assert_eq!(png_size(&abs), (1500, 900));
        assert_eq!(png_size(&pct), (1500, 900));
    }

    #[test]
    fn test_empty_table_has_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let options = ChartOptions {
            out_dir: dir.path().join("charts"),
            ..ChartOptions::default()
        };
        let table = PopulationTable::default();
        assert!(matches!(
            plot_population_trend(&table, &options),
            Err(Error::NoData(TREND_FILE))
        ));
        assert!(matches!(
            plot_abs_change(&table, &options),
            Err(Error::NoData(ABS_CHANGE_FILE))
        ));
        assert!(!options.out_dir.exists());
    }

    #[test]
    fn test_prepare_creates_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let options = ChartOptions {
            out_dir: dir.path().join("nested").join("charts"),
            ..ChartOptions::default()
        };
        let path = options.prepare(TREND_FILE).unwrap();
        assert!(options.out_dir.is_dir());
        assert_eq!(path, options.out_dir.join(TREND_FILE));
    }
}
