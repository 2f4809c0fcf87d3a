use crate::utils::error::{AgentError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{Datelike, NaiveDate};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

/// Encoded-PNG byte budget for an embeddable chart.
pub const MAX_CHART_BYTES: usize = 100_000;

const FULL_SIZE: (u32, u32) = (640, 480);
const REDUCED_SIZE: (u32, u32) = (400, 300);

fn draw_err<E: std::fmt::Display>(e: E) -> AgentError {
    AgentError::ChartError {
        message: e.to_string(),
    }
}

/// Renders at full size, then once more on the reduced canvas when the
/// encoded PNG misses the byte budget. The second result is kept whether
/// or not it fits; there is no further retry.
fn shrink_to_budget<F>(render: F) -> Result<String>
where
    F: Fn((u32, u32)) -> Result<Vec<u8>>,
{
    let png = render(FULL_SIZE)?;
    let png = if png.len() > MAX_CHART_BYTES {
        render(REDUCED_SIZE)?
    } else {
        png
    };
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(&png)))
}

fn encode_png(raw: &[u8], size: (u32, u32)) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(raw, size.0, size.1, ExtendedColorType::Rgb8)?;
    Ok(png)
}

fn axis_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if min == max {
        return (min - 1.0, max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad, max + pad)
}

/// Scatter of (x, y) points with an optional dashed red trend line
/// `y = slope * x` through the origin.
pub fn scatter_with_trend(
    points: &[(f64, f64)],
    slope: Option<f64>,
    x_label: &str,
    y_label: &str,
) -> Result<String> {
    if points.is_empty() {
        return Err(AgentError::ChartError {
            message: "no data points to plot".to_string(),
        });
    }
    shrink_to_budget(|size| rasterize_scatter(size, points, slope, x_label, y_label))
}

fn rasterize_scatter(
    size: (u32, u32),
    points: &[(f64, f64)],
    slope: Option<f64>,
    x_label: &str,
    y_label: &str,
) -> Result<Vec<u8>> {
    let (x_min, x_max) = axis_bounds(points.iter().map(|p| p.0));
    let (y_min, y_max) = axis_bounds(points.iter().map(|p| p.1));

    let mut raw = vec![0u8; (size.0 * size.1 * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut raw, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(56)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .x_desc(x_label)
            .y_desc(y_label)
            .draw()
            .map_err(draw_err)?;
        chart
            .draw_series(
                points
                    .iter()
                    .map(|(x, y)| Circle::new((*x, *y), 3, BLUE.filled())),
            )
            .map_err(draw_err)?;
        if let Some(m) = slope {
            chart
                .draw_series(DashedLineSeries::new(
                    [(x_min, x_min * m), (x_max, x_max * m)],
                    2,
                    4,
                    RED.stroke_width(2),
                ))
                .map_err(draw_err)?;
        }
        root.present().map_err(draw_err)?;
    }
    encode_png(&raw, size)
}

/// Blue bar chart of one value per category, categories in the given order.
pub fn bar_chart(
    categories: &[String],
    values: &[f64],
    x_label: &str,
    y_label: &str,
) -> Result<String> {
    if categories.is_empty() || categories.len() != values.len() {
        return Err(AgentError::ChartError {
            message: "no categories to plot".to_string(),
        });
    }
    shrink_to_budget(|size| rasterize_bars(size, categories, values, x_label, y_label))
}

fn rasterize_bars(
    size: (u32, u32),
    categories: &[String],
    values: &[f64],
    x_label: &str,
    y_label: &str,
) -> Result<Vec<u8>> {
    let top = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let y_max = if top.is_finite() && top > 0.0 {
        top * 1.05
    } else {
        1.0
    };
    let y_min = values.iter().cloned().fold(0.0_f64, f64::min);

    let mut raw = vec![0u8; (size.0 * size.1 * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut raw, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(56)
            .build_cartesian_2d((0..categories.len()).into_segmented(), y_min..y_max)
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(categories.len())
            .x_label_formatter(&|segment| match segment {
                SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                    categories.get(*i).cloned().unwrap_or_default()
                }
                SegmentValue::Last => String::new(),
            })
            .x_desc(x_label)
            .y_desc(y_label)
            .draw()
            .map_err(draw_err)?;
        chart
            .draw_series(values.iter().enumerate().map(|(i, v)| {
                Rectangle::new(
                    [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), *v)],
                    BLUE.filled(),
                )
            }))
            .map_err(draw_err)?;
        root.present().map_err(draw_err)?;
    }
    encode_png(&raw, size)
}

/// Red line of values against dates, in the given order.
pub fn date_line_chart(
    points: &[(NaiveDate, f64)],
    x_label: &str,
    y_label: &str,
) -> Result<String> {
    if points.is_empty() {
        return Err(AgentError::ChartError {
            message: "no data points to plot".to_string(),
        });
    }
    shrink_to_budget(|size| rasterize_date_line(size, points, x_label, y_label))
}

fn rasterize_date_line(
    size: (u32, u32),
    points: &[(NaiveDate, f64)],
    x_label: &str,
    y_label: &str,
) -> Result<Vec<u8>> {
    let mut x_min = i32::MAX;
    let mut x_max = i32::MIN;
    for (date, _) in points {
        let days = date.num_days_from_ce();
        x_min = x_min.min(days);
        x_max = x_max.max(days);
    }
    if x_min == x_max {
        x_min -= 1;
        x_max += 1;
    }
    let (y_min, y_max) = axis_bounds(points.iter().map(|p| p.1));

    let mut raw = vec![0u8; (size.0 * size.1 * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut raw, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(56)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(draw_err)?;
        chart
            .configure_mesh()
            .x_labels(points.len().min(8))
            .x_label_formatter(&|days| {
                NaiveDate::from_num_days_from_ce_opt(*days)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default()
            })
            .x_desc(x_label)
            .y_desc(y_label)
            .draw()
            .map_err(draw_err)?;
        chart
            .draw_series(LineSeries::new(
                points
                    .iter()
                    .map(|(date, value)| (date.num_days_from_ce(), *value)),
                RED.stroke_width(2),
            ))
            .map_err(draw_err)?;
        root.present().map_err(draw_err)?;
    }
    encode_png(&raw, size)
}
