//! Shape primitives shared by the widgets and the compositor.

use cairo::{Context, LineCap};
use std::f64::consts::PI;
use tinydash_types::{Color, PanelStyle};

use crate::pango_text::{draw_text, fit_font_size, Font, HAlign, VAlign};

/// Trace a rounded rectangle path (does not fill or stroke)
pub fn rounded_rectangle(cr: &Context, x: f64, y: f64, width: f64, height: f64, radius: f64) {
    let r = radius.min(width / 2.0).min(height / 2.0).max(0.0);
    if r <= 0.0 {
        cr.rectangle(x, y, width, height);
        return;
    }
    cr.new_sub_path();
    cr.arc(x + width - r, y + r, r, -PI / 2.0, 0.0);
    cr.arc(x + width - r, y + height - r, r, 0.0, PI / 2.0);
    cr.arc(x + r, y + height - r, r, PI / 2.0, PI);
    cr.arc(x + r, y + r, r, PI, 3.0 * PI / 2.0);
    cr.close_path();
}

/// Filled, optionally bordered panel
pub fn draw_panel(
    cr: &Context,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    style: &PanelStyle,
) -> Result<(), cairo::Error> {
    cr.save()?;
    rounded_rectangle(cr, x, y, width, height, style.corner_radius);
    style.fill.apply_to_cairo(cr);
    cr.fill_preserve()?;
    if let Some(border) = style.border {
        if style.border_width > 0.0 {
            border.apply_to_cairo(cr);
            cr.set_line_width(style.border_width);
            cr.stroke()?;
        }
    }
    cr.new_path();
    cr.restore()?;
    Ok(())
}

/// Dashed outline with centered text, used when a slot has nothing to show
pub fn draw_placeholder(
    cr: &Context,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    color: Color,
    text: &str,
    caption: Option<&str>,
    family: &str,
) -> Result<(), cairo::Error> {
    if width < 4.0 || height < 4.0 {
        return Ok(());
    }
    cr.save()?;
    color.apply_to_cairo(cr);
    cr.set_line_width(1.0);
    cr.set_dash(&[4.0, 3.0], 0.0);
    rounded_rectangle(cr, x + 1.5, y + 1.5, width - 3.0, height - 3.0, 6.0);
    cr.stroke()?;
    cr.set_dash(&[], 0.0);

    let base = Font::new(family, (height * 0.25).min(22.0)).bold();
    let size = fit_font_size(cr, text, &base, width * 0.8, height * 0.4, base.size);
    let cx = x + width / 2.0;
    match caption.filter(|c| !c.is_empty()) {
        Some(caption) if height >= 40.0 => {
            draw_text(cr, text, &base.sized(size), color, cx, y + height * 0.45, HAlign::Center, VAlign::Middle)?;
            let small = Font::new(family, (height * 0.12).clamp(7.0, 11.0));
            let caption = crate::text::truncate_chars(caption, ((width - 8.0) / (small.size * 0.6)) as usize);
            draw_text(cr, &caption, &small, color, cx, y + height * 0.72, HAlign::Center, VAlign::Middle)?;
        }
        _ => {
            draw_text(cr, text, &base.sized(size), color, cx, y + height / 2.0, HAlign::Center, VAlign::Middle)?;
        }
    }
    cr.restore()?;
    Ok(())
}

/// Horizontal bar with a track and a fill covering `fraction` of it
pub fn draw_bar(
    cr: &Context,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    fraction: f64,
    fill: Color,
    track: Color,
) -> Result<(), cairo::Error> {
    let radius = height / 2.0;
    cr.save()?;
    rounded_rectangle(cr, x, y, width, height, radius);
    track.apply_to_cairo(cr);
    cr.fill()?;

    let filled = width * fraction.clamp(0.0, 1.0);
    if filled > 0.0 {
        // Clip to the track so a short fill keeps the rounded left end
        rounded_rectangle(cr, x, y, width, height, radius);
        cr.clip();
        rounded_rectangle(cr, x, y, filled.max(height.min(width)), height, radius);
        fill.apply_to_cairo(cr);
        cr.fill()?;
    }
    cr.restore()?;
    Ok(())
}

/// Arc track plus a value arc, angles in radians (0 = 3 o'clock, clockwise)
pub fn draw_arc_gauge(
    cr: &Context,
    cx: f64,
    cy: f64,
    radius: f64,
    thickness: f64,
    start_angle: f64,
    sweep: f64,
    fraction: f64,
    fill: Color,
    track: Color,
) -> Result<(), cairo::Error> {
    if radius <= 0.0 {
        return Ok(());
    }
    cr.save()?;
    cr.set_line_width(thickness);
    cr.set_line_cap(LineCap::Round);

    track.apply_to_cairo(cr);
    cr.arc(cx, cy, radius, start_angle, start_angle + sweep);
    cr.stroke()?;

    let fraction = fraction.clamp(0.0, 1.0);
    if fraction > 0.0 {
        fill.apply_to_cairo(cr);
        cr.arc(cx, cy, radius, start_angle, start_angle + sweep * fraction);
        cr.stroke()?;
    }
    cr.restore()?;
    Ok(())
}

/// Filled circle
pub fn draw_dot(cr: &Context, cx: f64, cy: f64, radius: f64, color: Color) -> Result<(), cairo::Error> {
    cr.save()?;
    color.apply_to_cairo(cr);
    cr.arc(cx, cy, radius, 0.0, 2.0 * PI);
    cr.fill()?;
    cr.restore()?;
    Ok(())
}

/// Frame around the whole canvas
pub fn draw_border(cr: &Context, width: f64, height: f64, color: Color, line_width: f64) -> Result<(), cairo::Error> {
    cr.save()?;
    color.apply_to_cairo(cr);
    cr.set_line_width(line_width);
    let half = line_width / 2.0;
    cr.rectangle(half, half, width - line_width, height - line_width);
    cr.stroke()?;
    cr.restore()?;
    Ok(())
}
