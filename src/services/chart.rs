// src/services/chart.rs
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;
use std::error::Error;
use std::ops::Range;
use std::path::Path;

use crate::error::{ChartError, Result};
use crate::models::EtfColor;
use crate::services::layout::{dash_segments, place_labels, AxisSide, ChartLayout, Span, DPI};

const FONT: &str = "sans-serif";

/// Points to pixels at the chart resolution.
fn pt(points: f64) -> f64 {
    points * DPI as f64 / 72.0
}

fn rgb(color: EtfColor) -> RGBColor {
    let (r, g, b) = color.rgb();
    RGBColor(r, g, b)
}

/// Draws `layout` into a PNG at `path`. The canvas is exactly the figure
/// size with a white background.
pub fn render_png(layout: &ChartLayout, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, layout.size).into_drawing_area();
    draw(layout, &root).map_err(|e| ChartError::Render(e.to_string()))?;
    root.present().map_err(|e| ChartError::Render(e.to_string()))?;
    info!("Rendered {}x{} chart to {}", layout.size.0, layout.size.1, path.display());
    Ok(())
}

type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn draw(layout: &ChartLayout, root: &Canvas) -> std::result::Result<(), Box<dyn Error>> {
    root.fill(&WHITE)?;

    let text = |size: f64| (FONT, pt(size)).into_font().color(&BLACK);
    let title_height = pt(11.0) * 2.2;
    let (width, _) = layout.size;
    let edge = pt(8.0) as i32;

    // Title on the left, generation time pushed to the right edge.
    root.draw(&Text::new(
        layout.title.clone(),
        (edge, (title_height / 2.0) as i32),
        text(11.0).pos(Pos::new(HPos::Left, VPos::Center)),
    ))?;
    root.draw(&Text::new(
        layout.timestamp.clone(),
        (width as i32 - edge, (title_height / 2.0) as i32),
        text(11.0).pos(Pos::new(HPos::Right, VPos::Center)),
    ))?;

    let (_, body) = root.split_vertically(title_height as u32);

    let tick_font = pt(9.0);
    let axis_area = (tick_font * 3.5) as u32;
    let (left_area, right_area) = match layout.y_axis {
        AxisSide::Left => (axis_area + tick_font as u32 * 2, pt(4.0) as u32),
        // room for tick labels plus the annotation boxes
        AxisSide::Right => (pt(4.0) as u32, axis_area + (tick_font * 9.0) as u32),
    };

    let (x0, x1) = layout.x_range;
    let (y0, y1) = layout.y_range;
    let mut chart = ChartBuilder::on(&body)
        .margin(pt(4.0) as u32)
        .x_label_area_size((tick_font * 3.2) as u32)
        .set_label_area_size(LabelAreaPosition::Left, left_area)
        .set_label_area_size(LabelAreaPosition::Right, right_area)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    let grid = BLACK.mix(0.3).stroke_width(1);
    for (v, _) in &layout.y_ticks {
        chart.draw_series(std::iter::once(PathElement::new(vec![(x0, *v), (x1, *v)], grid)))?;
    }
    for (x, _) in &layout.x_ticks {
        chart.draw_series(std::iter::once(PathElement::new(vec![(*x, y0), (*x, y1)], grid)))?;
    }

    // dashed zero baseline
    let span = x1 - x0;
    let baseline = RGBColor(128, 128, 128).mix(0.7).stroke_width(pt(0.8).max(1.0) as u32);
    if y0 <= 0.0 && 0.0 <= y1 {
        chart.draw_series(
            dash_segments(x0, x1, span / 120.0, span / 240.0)
                .into_iter()
                .map(|(a, b)| PathElement::new(vec![(a, 0.0), (b, 0.0)], baseline)),
        )?;
    }

    let line_width = pt(1.5).round() as u32;
    for series in &layout.series {
        let color = rgb(series.color);
        chart
            .draw_series(LineSeries::new(series.points.iter().copied(), color.stroke_width(line_width)))?
            .label(series.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], color.stroke_width(line_width)));
    }

    chart.draw_series(std::iter::once(Rectangle::new([(x0, y0), (x1, y1)], BLACK.stroke_width(1))))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .margin(pt(6.0) as u32)
        .label_font(text(9.0))
        .background_style(WHITE.mix(0.9))
        .border_style(BLACK.mix(0.3))
        .draw()?;

    let (px, py) = chart.plotting_area().get_pixel_range();
    let tick_len = pt(3.5) as i32;
    let pad = pt(3.0) as i32;

    // x axis: month ticks below the frame, caption at the right end
    for (x, label) in &layout.x_ticks {
        let (sx, sy) = chart.backend_coord(&(*x, y0));
        root.draw(&PathElement::new(vec![(sx, sy), (sx, sy + tick_len)], BLACK.stroke_width(1)))?;
        root.draw(&Text::new(
            label.clone(),
            (sx, sy + tick_len + pad),
            text(9.0).pos(Pos::new(HPos::Center, VPos::Top)),
        ))?;
    }
    root.draw(&Text::new(
        layout.x_caption.clone(),
        (px.end, py.end + tick_len + pad + (tick_font * 1.6) as i32),
        text(9.0).pos(Pos::new(HPos::Right, VPos::Top)),
    ))?;

    // y axis on the configured side
    let mut reserved = Vec::with_capacity(layout.y_ticks.len());
    for (v, label) in &layout.y_ticks {
        let (lx, ly) = chart.backend_coord(&(x0, *v));
        let (rx, _) = chart.backend_coord(&(x1, *v));
        match layout.y_axis {
            AxisSide::Left => {
                root.draw(&PathElement::new(vec![(lx - tick_len, ly), (lx, ly)], BLACK.stroke_width(1)))?;
                root.draw(&Text::new(
                    label.clone(),
                    (lx - tick_len - pad, ly),
                    text(9.0).pos(Pos::new(HPos::Right, VPos::Center)),
                ))?;
            }
            AxisSide::Right => {
                root.draw(&PathElement::new(vec![(rx, ly), (rx + tick_len, ly)], BLACK.stroke_width(1)))?;
                root.draw(&Text::new(
                    label.clone(),
                    (rx + tick_len + pad, ly),
                    text(9.0).pos(Pos::new(HPos::Left, VPos::Center)),
                ))?;
                reserved.push(Span::around(ly as f64, tick_font / 2.0, 0.0));
            }
        }
    }
    if let Some(caption) = &layout.y_caption {
        let style = (FONT, pt(10.0))
            .into_font()
            .transform(FontTransform::Rotate270)
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        root.draw(&Text::new(
            caption.clone(),
            (edge + pt(6.0) as i32, (py.start + py.end) / 2),
            style,
        ))?;
    }

    if !layout.annotations.is_empty() {
        let right_edge = chart.backend_coord(&(x1, 0.0)).0;
        draw_annotations(layout, root, right_edge, py, &reserved, &|v| chart.backend_coord(&(x1, v)).1)?;
    }
    Ok(())
}

/// Colored boxes with each ticker's final return, just right of the plot.
fn draw_annotations(
    layout: &ChartLayout,
    root: &Canvas,
    right_edge: i32,
    py: Range<i32>,
    reserved: &[Span],
    to_pixel_y: &dyn Fn(f64) -> i32,
) -> std::result::Result<(), Box<dyn Error>> {
    let font_px = pt(9.0);
    let box_pad = pt(2.5);
    let box_height = font_px + 2.0 * box_pad;
    let desired: Vec<f64> = layout
        .annotations
        .iter()
        .map(|a| to_pixel_y(a.value) as f64)
        .collect();
    let ys = place_labels(&desired, box_height, pt(2.0), py.start as f64, py.end as f64, reserved);

    let x = right_edge + (font_px * 3.5) as i32;
    for (annotation, y) in layout.annotations.iter().zip(ys) {
        let style = (FONT, font_px).into_font().color(&WHITE);
        let (w, _) = root.estimate_text_size(&annotation.text, &style)?;
        let top = (y - box_height / 2.0) as i32;
        let bottom = (y + box_height / 2.0) as i32;
        root.draw(&Rectangle::new(
            [(x, top), (x + w as i32 + 2 * box_pad as i32, bottom)],
            rgb(annotation.color).filled(),
        ))?;
        root.draw(&Text::new(
            annotation.text.clone(),
            (x + box_pad as i32, y as i32),
            style.pos(Pos::new(HPos::Left, VPos::Center)),
        ))?;
    }
    Ok(())
}
