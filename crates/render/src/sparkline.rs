//! Sparkline rendering: a compact line graph without axes.

use cairo::{Context, LineCap, LineJoin};
use tinydash_types::Color;

/// Appearance of a sparkline
#[derive(Debug, Clone, PartialEq)]
pub struct SparklineStyle {
    pub line: Color,
    pub line_width: f64,
    /// Area under the line, `None` for no fill
    pub fill: Option<Color>,
    pub smooth: bool,
}

impl SparklineStyle {
    pub fn new(line: Color) -> Self {
        Self {
            line,
            line_width: 2.0,
            fill: Some(line.with_alpha(0.25)),
            smooth: true,
        }
    }
}

/// Resample an irregular series onto `samples` evenly spaced positions.
///
/// `points` are (x, value) pairs sorted by x. Positions between two points
/// are linearly interpolated. A single point yields a flat series.
pub fn resample(points: &[(f64, f64)], samples: usize) -> Vec<f64> {
    match points {
        [] => Vec::new(),
        [(_, only)] => vec![*only; samples.max(1)],
        _ => {
            let samples = samples.max(2);
            let start = points[0].0;
            let end = points[points.len() - 1].0;
            let span = end - start;
            if span <= 0.0 {
                return vec![points[points.len() - 1].1; samples];
            }
            let mut out = Vec::with_capacity(samples);
            let mut seg = 0;
            for i in 0..samples {
                let x = start + span * i as f64 / (samples - 1) as f64;
                while seg + 2 < points.len() && points[seg + 1].0 < x {
                    seg += 1;
                }
                let (x0, y0) = points[seg];
                let (x1, y1) = points[seg + 1];
                let t = if x1 > x0 { ((x - x0) / (x1 - x0)).clamp(0.0, 1.0) } else { 1.0 };
                out.push(y0 + (y1 - y0) * t);
            }
            out
        }
    }
}

/// Observed (min, max) of a series
pub fn observed_range(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

/// Draw `values` left to right across the box.
///
/// A flat series (one value, or all equal) is drawn as a horizontal line
/// through the middle of the box.
pub fn draw_sparkline(
    cr: &Context,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    values: &[f64],
    style: &SparklineStyle,
) -> Result<(), cairo::Error> {
    let Some((min_val, max_val)) = observed_range(values) else {
        return Ok(());
    };
    if width <= 0.0 || height <= 0.0 {
        return Ok(());
    }

    let range = max_val - min_val;
    let to_y = |v: f64| -> f64 {
        if range.abs() < f64::EPSILON {
            y + height / 2.0
        } else {
            y + height - ((v - min_val) / range).clamp(0.0, 1.0) * height
        }
    };

    let points: Vec<(f64, f64)> = if values.len() == 1 {
        vec![(x, to_y(values[0])), (x + width, to_y(values[0]))]
    } else {
        let step = width / (values.len() - 1) as f64;
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (x + i as f64 * step, to_y(*v)))
            .collect()
    };

    cr.save()?;
    cr.rectangle(x, y, width, height);
    cr.clip();

    if let Some(fill) = style.fill {
        trace_line(cr, &points, style.smooth);
        cr.line_to(points[points.len() - 1].0, y + height);
        cr.line_to(points[0].0, y + height);
        cr.close_path();
        fill.apply_to_cairo(cr);
        cr.fill()?;
    }

    trace_line(cr, &points, style.smooth);
    style.line.apply_to_cairo(cr);
    cr.set_line_width(style.line_width);
    cr.set_line_cap(LineCap::Round);
    cr.set_line_join(LineJoin::Round);
    cr.stroke()?;

    cr.restore()?;
    Ok(())
}

/// Path through the points, Catmull-Rom style curves when `smooth`
fn trace_line(cr: &Context, points: &[(f64, f64)], smooth: bool) {
    cr.move_to(points[0].0, points[0].1);
    if smooth && points.len() > 2 {
        let tension = 1.0 / 6.0;
        for i in 0..points.len() - 1 {
            let p0 = points[i];
            let p3 = points[i + 1];
            let p_prev = if i > 0 { points[i - 1] } else { p0 };
            let p_next = if i + 2 < points.len() { points[i + 2] } else { p3 };

            let cp1 = (p0.0 + (p3.0 - p_prev.0) * tension, p0.1 + (p3.1 - p_prev.1) * tension);
            let cp2 = (p3.0 - (p_next.0 - p0.0) * tension, p3.1 - (p_next.1 - p0.1) * tension);
            cr.curve_to(cp1.0, cp1.1, cp2.0, cp2.1, p3.0, p3.1);
        }
    } else {
        for &(px, py) in &points[1..] {
            cr.line_to(px, py);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_interpolates() {
        let series = resample(&[(0.0, 0.0), (10.0, 10.0)], 11);
        assert_eq!(series.len(), 11);
        assert!((series[5] - 5.0).abs() < 1e-9);
        assert_eq!(series[10], 10.0);
    }

    #[test]
    fn test_resample_uneven_spacing() {
        let series = resample(&[(0.0, 0.0), (1.0, 10.0), (9.0, 10.0), (10.0, 0.0)], 11);
        assert!((series[0]).abs() < 1e-9);
        assert!((series[5] - 10.0).abs() < 1e-9);
        assert!((series[10]).abs() < 1e-9);
    }

    #[test]
    fn test_single_point_is_flat() {
        assert_eq!(resample(&[(3.0, 7.5)], 4), vec![7.5; 4]);
        assert!(resample(&[], 4).is_empty());
    }

    #[test]
    fn test_observed_range() {
        assert_eq!(observed_range(&[3.0, -1.0, 8.0]), Some((-1.0, 8.0)));
        assert_eq!(observed_range(&[]), None);
    }

    #[test]
    fn test_flat_line_draws_through_middle() {
        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 40, 20).unwrap();
        {
            let cr = Context::new(&surface).unwrap();
            let mut style = SparklineStyle::new(Color::WHITE);
            style.fill = None;
            draw_sparkline(&cr, 0.0, 0.0, 40.0, 20.0, &[5.0], &style).unwrap();
        }
        surface.flush();
        let stride = surface.stride() as usize;
        let mut middle_alpha = 0;
        let mut top_alpha = 0;
        surface
            .with_data(|d| {
                middle_alpha = d[10 * stride + 20 * 4 + 3];
                top_alpha = d[2 * stride + 20 * 4 + 3];
            })
            .unwrap();
        assert!(middle_alpha > 0);
        assert_eq!(top_alpha, 0);
    }
}
