// src/utils/chart.rs

//! SVG chart rendering for the reporting views.
//!
//! Every renderer returns `Ok(None)` for an empty series so callers can show
//! "no chart" instead of failing.

use plotters::prelude::*;

use crate::error::AppError;

const WIDTH: u32 = 900;
const HEIGHT: u32 = 540;

pub const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
pub const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);
pub const HIGH_GREEN: RGBColor = RGBColor(46, 139, 87);
pub const LOW_RED: RGBColor = RGBColor(205, 92, 92);

/// Caption and axis descriptions of one chart.
pub struct ChartLabels<'a> {
    pub title: &'a str,
    pub x_desc: &'a str,
    pub y_desc: &'a str,
}

fn render_err<E: std::fmt::Display>(err: E) -> AppError {
    AppError::InternalServerError(format!("chart rendering failed: {err}"))
}

/// Upper bound of the value axis with some headroom; never zero.
fn value_ceiling(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0_f64, f64::max);
    if max <= 0.0 { 1.0 } else { max * 1.1 }
}

/// One bar per `(label, value)` pair. `colors` cycles across bars.
pub fn bar_chart(
    labels: &ChartLabels<'_>,
    bars: &[(String, f64)],
    colors: &[RGBColor],
) -> Result<Option<String>, AppError> {
    if bars.is_empty() {
        return Ok(None);
    }
    let palette: &[RGBColor] = if colors.is_empty() { &[SKY_BLUE] } else { colors };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let ceiling = value_ceiling(bars.iter().map(|(_, v)| *v));
        let mut chart = ChartBuilder::on(&root)
            .caption(labels.title, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(70)
            .y_label_area_size(60)
            .build_cartesian_2d((0..bars.len()).into_segmented(), 0.0..ceiling)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(labels.x_desc)
            .y_desc(labels.y_desc)
            .x_labels(bars.len())
            .x_label_formatter(&|x| match x {
                SegmentValue::CenterOf(i) => bars.get(*i).map(|(l, _)| l.clone()).unwrap_or_default(),
                _ => String::new(),
            })
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(bars.iter().enumerate().map(|(i, (_, value))| {
                let color = palette[i % palette.len()];
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *value)],
                    color.filled(),
                );
                bar.set_margin(0, 0, 10, 10);
                bar
            }))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
    }
    Ok(Some(svg))
}

/// A marked line through `points` in the given order.
pub fn line_chart(labels: &ChartLabels<'_>, points: &[(String, f64)]) -> Result<Option<String>, AppError> {
    if points.is_empty() {
        return Ok(None);
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let ceiling = value_ceiling(points.iter().map(|(_, v)| *v));
        let last = points.len().saturating_sub(1).max(1);
        let mut chart = ChartBuilder::on(&root)
            .caption(labels.title, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(70)
            .y_label_area_size(60)
            .build_cartesian_2d(0..last, 0.0..ceiling)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .x_desc(labels.x_desc)
            .y_desc(labels.y_desc)
            .x_labels(points.len().min(12))
            .x_label_formatter(&|i| points.get(*i).map(|(l, _)| l.clone()).unwrap_or_default())
            .draw()
            .map_err(render_err)?;

        chart
            .draw_series(LineSeries::new(
                points.iter().enumerate().map(|(i, (_, v))| (i, *v)),
                BLUE.stroke_width(2),
            ))
            .map_err(render_err)?;
        chart
            .draw_series(
                points
                    .iter()
                    .enumerate()
                    .map(|(i, (_, v))| Circle::new((i, *v), 4, BLUE.filled())),
            )
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
    }
    Ok(Some(svg))
}
