//! Chart rasterization for the report.
//!
//! Charts are drawn without any embedded text so that rendering never depends
//! on system fonts; titles are laid out by the report next to each image.

use std::ops::Range;

use plotters::prelude::*;

use crate::error::ReportError;
use crate::services::i18n::RenderOptions;

pub const DEFAULT_CHART_WIDTH: u32 = 800;
pub const DEFAULT_CHART_HEIGHT: u32 = 300;

const ACCENT: RGBColor = RGBColor(0x4c, 0x72, 0xb0);
const KDE_POINTS: usize = 100;

/// An in-memory RGB image, 3 bytes per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

pub trait ChartRenderer: Send + Sync {
    fn histogram(&self, values: &[f64], options: &RenderOptions) -> Result<Raster, ReportError>;
    fn boxplot(&self, values: &[f64], options: &RenderOptions) -> Result<Raster, ReportError>;
    fn scatter(&self, x: &[f64], y: &[f64], options: &RenderOptions) -> Result<Raster, ReportError>;
}

#[derive(Debug, Clone, Copy)]
struct Theme {
    background: RGBColor,
    foreground: RGBColor,
}

impl Theme {
    fn for_options(options: &RenderOptions) -> Self {
        if options.dark_mode {
            Theme {
                background: RGBColor(0x11, 0x11, 0x11),
                foreground: RGBColor(0xdd, 0xdd, 0xdd),
            }
        } else {
            Theme {
                background: WHITE,
                foreground: RGBColor(0x22, 0x22, 0x22),
            }
        }
    }
}

/// One histogram bin: `[start, end)` and its count; the last bin is closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width bins, Sturges' rule for the bin count.
pub fn histogram_bins(values: &[f64]) -> Vec<Bin> {
    if values.is_empty() {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return vec![Bin {
            start: min - 0.5,
            end: max + 0.5,
            count: values.len(),
        }];
    }

    let k = ((values.len() as f64).log2().ceil() as usize + 1).max(1);
    let width = (max - min) / k as f64;
    let mut bins: Vec<Bin> = (0..k)
        .map(|i| Bin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for &v in values {
        let idx = (((v - min) / width) as usize).min(k - 1);
        bins[idx].count += 1;
    }
    bins
}

/// Gaussian kernel density at each grid point, bandwidth by Scott's rule.
///
/// Empty when the sample has fewer than two values or no spread.
pub fn gaussian_kde(values: &[f64], grid: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n < 2 {
        return Vec::new();
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let bandwidth = variance.sqrt() * (n as f64).powf(-0.2);
    if !(bandwidth > 0.0) {
        return Vec::new();
    }

    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    grid.iter()
        .map(|&x| {
            let sum: f64 = values
                .iter()
                .map(|&v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum();
            sum * norm
        })
        .collect()
}

/// Density curve over the histogram range, scaled from density to bin counts.
fn kde_curve(values: &[f64], bins: &[Bin]) -> Vec<(f64, f64)> {
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        return Vec::new();
    };
    let step = (last.end - first.start) / (KDE_POINTS - 1) as f64;
    let grid: Vec<f64> = (0..KDE_POINTS).map(|i| first.start + step * i as f64).collect();
    let scale = values.len() as f64 * (first.end - first.start);
    grid.iter()
        .zip(gaussian_kde(values, &grid))
        .map(|(&x, density)| (x, density * scale))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Quartiles with linear interpolation and Tukey whiskers at 1.5 IQR.
pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    let (lo_fence, hi_fence) = (q1 - 1.5 * iqr, q3 + 1.5 * iqr);

    let inside = || sorted.iter().copied().filter(|v| *v >= lo_fence && *v <= hi_fence);
    Some(BoxSummary {
        q1,
        median: quantile(&sorted, 0.5),
        q3,
        lower_whisker: inside().fold(f64::INFINITY, f64::min),
        upper_whisker: inside().fold(f64::NEG_INFINITY, f64::max),
        outliers: sorted
            .iter()
            .copied()
            .filter(|v| *v < lo_fence || *v > hi_fence)
            .collect(),
    })
}

fn padded(min: f64, max: f64) -> Range<f64> {
    if min == max {
        return (min - 0.5)..(max + 0.5);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

fn extent(values: &[f64]) -> Range<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    padded(min, max)
}

fn chart_error<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::Chart(e.to_string())
}

/// Renders charts with the plotters bitmap backend.
#[derive(Debug, Clone, Copy)]
pub struct PlottersRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for PlottersRenderer {
    fn default() -> Self {
        Self {
            width: DEFAULT_CHART_WIDTH,
            height: DEFAULT_CHART_HEIGHT,
        }
    }
}

impl PlottersRenderer {
    fn draw<F>(&self, options: &RenderOptions, x: Range<f64>, y: Range<f64>, plot: F) -> Result<Raster, ReportError>
    where
        F: FnOnce(
            &mut ChartContext<'_, BitMapBackend<'_>, Cartesian2d<plotters::coord::types::RangedCoordf64, plotters::coord::types::RangedCoordf64>>,
            Theme,
        ) -> Result<(), ReportError>,
    {
        let theme = Theme::for_options(options);
        let mut pixels = vec![0u8; (self.width * self.height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut pixels, (self.width, self.height)).into_drawing_area();
            root.fill(&theme.background).map_err(chart_error)?;

            let mut chart = ChartBuilder::on(&root)
                .margin(12)
                .build_cartesian_2d(x.clone(), y.clone())
                .map_err(chart_error)?;

            // axes along the bottom and left edges of the plotting area
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(x.start, y.start), (x.end, y.start)],
                    theme.foreground,
                )))
                .map_err(chart_error)?;
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(x.start, y.start), (x.start, y.end)],
                    theme.foreground,
                )))
                .map_err(chart_error)?;

            plot(&mut chart, theme)?;
            root.present().map_err(chart_error)?;
        }
        Ok(Raster {
            width: self.width,
            height: self.height,
            pixels,
        })
    }
}

impl ChartRenderer for PlottersRenderer {
    fn histogram(&self, values: &[f64], options: &RenderOptions) -> Result<Raster, ReportError> {
        let bins = histogram_bins(values);
        let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
            return Err(ReportError::Chart("histogram of an empty column".into()));
        };
        let curve = kde_curve(values, &bins);
        let peak = curve
            .iter()
            .map(|&(_, y)| y)
            .fold(bins.iter().map(|b| b.count).max().unwrap_or(1) as f64, f64::max);

        self.draw(options, first.start..last.end, 0.0..peak * 1.05, |chart, theme| {
            chart
                .draw_series(bins.iter().map(|b| {
                    Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], ACCENT.mix(0.8).filled())
                }))
                .map_err(chart_error)?;
            chart
                .draw_series(bins.iter().map(|b| {
                    Rectangle::new([(b.start, 0.0), (b.end, b.count as f64)], theme.background.stroke_width(1))
                }))
                .map_err(chart_error)?;
            if !curve.is_empty() {
                chart
                    .draw_series(std::iter::once(PathElement::new(curve, theme.foreground.stroke_width(2))))
                    .map_err(chart_error)?;
            }
            Ok(())
        })
    }

    fn boxplot(&self, values: &[f64], options: &RenderOptions) -> Result<Raster, ReportError> {
        let summary = box_summary(values).ok_or_else(|| ReportError::Chart("boxplot of an empty column".into()))?;

        self.draw(options, extent(values), 0.0..1.0, |chart, theme| {
            let line = theme.foreground.stroke_width(2);
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(summary.q1, 0.3), (summary.q3, 0.7)],
                    ACCENT.mix(0.8).filled(),
                )))
                .map_err(chart_error)?;
            chart
                .draw_series(
                    [
                        vec![(summary.q1, 0.3), (summary.q3, 0.3), (summary.q3, 0.7), (summary.q1, 0.7), (summary.q1, 0.3)],
                        vec![(summary.median, 0.3), (summary.median, 0.7)],
                        vec![(summary.lower_whisker, 0.5), (summary.q1, 0.5)],
                        vec![(summary.q3, 0.5), (summary.upper_whisker, 0.5)],
                        vec![(summary.lower_whisker, 0.4), (summary.lower_whisker, 0.6)],
                        vec![(summary.upper_whisker, 0.4), (summary.upper_whisker, 0.6)],
                    ]
                    .into_iter()
                    .map(|points| PathElement::new(points, line)),
                )
                .map_err(chart_error)?;
            chart
                .draw_series(
                    summary
                        .outliers
                        .iter()
                        .map(|v| Circle::new((*v, 0.5), 3, theme.foreground.stroke_width(1))),
                )
                .map_err(chart_error)?;
            Ok(())
        })
    }

    fn scatter(&self, x: &[f64], y: &[f64], options: &RenderOptions) -> Result<Raster, ReportError> {
        if x.is_empty() || x.len() != y.len() {
            return Err(ReportError::Chart("scatter plot needs paired values".into()));
        }
        self.draw(options, extent(x), extent(y), |chart, _theme| {
            chart
                .draw_series(x.iter().zip(y).map(|(a, b)| Circle::new((*a, *b), 3, ACCENT.mix(0.8).filled())))
                .map_err(chart_error)?;
            Ok(())
        })
    }
}
