//! Small vector glyphs drawn with Cairo paths.
//!
//! Icons are centered on (cx, cy) and scaled to `size` pixels.

use cairo::{Context, LineCap};
use std::f64::consts::PI;
use tinydash_types::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Sun,
    Moon,
    Cloud,
    PartlyCloudy,
    Rain,
    Snow,
    Lightning,
    Fog,
    Play,
    Pause,
    Power,
    Dot,
}

impl Icon {
    /// Icon for a weather condition string ("sunny", "rainy", ...)
    pub fn for_condition(condition: &str) -> Icon {
        let c = condition.to_ascii_lowercase();
        if c.contains("lightning") || c.contains("thunder") {
            Icon::Lightning
        } else if c.contains("snow") || c.contains("hail") {
            Icon::Snow
        } else if c.contains("rain") || c.contains("pouring") {
            Icon::Rain
        } else if c.contains("fog") {
            Icon::Fog
        } else if c.contains("partly") {
            Icon::PartlyCloudy
        } else if c.contains("cloud") || c.contains("overcast") {
            Icon::Cloud
        } else if c.contains("night") {
            Icon::Moon
        } else {
            Icon::Sun
        }
    }

    /// Icon named in a widget option
    pub fn from_name(name: &str) -> Option<Icon> {
        match name.to_ascii_lowercase().as_str() {
            "sun" | "sunny" => Some(Icon::Sun),
            "moon" => Some(Icon::Moon),
            "cloud" => Some(Icon::Cloud),
            "rain" => Some(Icon::Rain),
            "snow" => Some(Icon::Snow),
            "bolt" | "lightning" => Some(Icon::Lightning),
            "fog" => Some(Icon::Fog),
            "play" => Some(Icon::Play),
            "pause" => Some(Icon::Pause),
            "power" => Some(Icon::Power),
            "dot" => Some(Icon::Dot),
            _ => None,
        }
    }
}

pub fn draw_icon(cr: &Context, icon: Icon, cx: f64, cy: f64, size: f64, color: Color) -> Result<(), cairo::Error> {
    let s = size / 2.0;
    cr.save()?;
    color.apply_to_cairo(cr);
    cr.set_line_width((size / 12.0).max(1.0));
    cr.set_line_cap(LineCap::Round);

    match icon {
        Icon::Sun => {
            cr.arc(cx, cy, s * 0.45, 0.0, 2.0 * PI);
            cr.fill()?;
            for i in 0..8 {
                let a = i as f64 * PI / 4.0;
                cr.move_to(cx + a.cos() * s * 0.65, cy + a.sin() * s * 0.65);
                cr.line_to(cx + a.cos() * s * 0.95, cy + a.sin() * s * 0.95);
            }
            cr.stroke()?;
        }
        Icon::Moon => {
            cr.arc(cx, cy, s * 0.8, 0.0, 2.0 * PI);
            cr.new_sub_path();
            cr.arc_negative(cx + s * 0.35, cy - s * 0.2, s * 0.65, 2.0 * PI, 0.0);
            cr.set_fill_rule(cairo::FillRule::EvenOdd);
            cr.fill()?;
        }
        Icon::Cloud => cloud(cr, cx, cy, s)?,
        Icon::PartlyCloudy => {
            cr.arc(cx - s * 0.3, cy - s * 0.3, s * 0.4, 0.0, 2.0 * PI);
            cr.fill()?;
            cloud(cr, cx + s * 0.1, cy + s * 0.1, s * 0.85)?;
        }
        Icon::Rain | Icon::Snow => {
            cloud(cr, cx, cy - s * 0.25, s * 0.85)?;
            for i in 0..3 {
                let dx = (i as f64 - 1.0) * s * 0.45;
                if icon == Icon::Rain {
                    cr.move_to(cx + dx, cy + s * 0.45);
                    cr.line_to(cx + dx - s * 0.12, cy + s * 0.85);
                    cr.stroke()?;
                } else {
                    cr.arc(cx + dx, cy + s * 0.65, s * 0.1, 0.0, 2.0 * PI);
                    cr.fill()?;
                }
            }
        }
        Icon::Lightning => {
            cr.move_to(cx + s * 0.15, cy - s * 0.9);
            cr.line_to(cx - s * 0.45, cy + s * 0.1);
            cr.line_to(cx, cy + s * 0.1);
            cr.line_to(cx - s * 0.15, cy + s * 0.9);
            cr.line_to(cx + s * 0.45, cy - s * 0.15);
            cr.line_to(cx, cy - s * 0.15);
            cr.close_path();
            cr.fill()?;
        }
        Icon::Fog => {
            for i in 0..3 {
                let y = cy + (i as f64 - 1.0) * s * 0.5;
                cr.move_to(cx - s * 0.8, y);
                cr.line_to(cx + s * 0.8, y);
            }
            cr.stroke()?;
        }
        Icon::Play => {
            cr.move_to(cx - s * 0.5, cy - s * 0.7);
            cr.line_to(cx + s * 0.7, cy);
            cr.line_to(cx - s * 0.5, cy + s * 0.7);
            cr.close_path();
            cr.fill()?;
        }
        Icon::Pause => {
            cr.rectangle(cx - s * 0.55, cy - s * 0.7, s * 0.4, s * 1.4);
            cr.rectangle(cx + s * 0.15, cy - s * 0.7, s * 0.4, s * 1.4);
            cr.fill()?;
        }
        Icon::Power => {
            cr.arc(cx, cy + s * 0.1, s * 0.7, -PI / 2.0 + 0.6, 3.0 * PI / 2.0 - 0.6);
            cr.stroke()?;
            cr.move_to(cx, cy - s * 0.85);
            cr.line_to(cx, cy);
            cr.stroke()?;
        }
        Icon::Dot => {
            cr.arc(cx, cy, s * 0.5, 0.0, 2.0 * PI);
            cr.fill()?;
        }
    }

    cr.restore()?;
    Ok(())
}

fn cloud(cr: &Context, cx: f64, cy: f64, s: f64) -> Result<(), cairo::Error> {
    cr.new_sub_path();
    cr.arc(cx - s * 0.4, cy + s * 0.1, s * 0.35, 0.0, 2.0 * PI);
    cr.new_sub_path();
    cr.arc(cx + s * 0.05, cy - s * 0.15, s * 0.45, 0.0, 2.0 * PI);
    cr.new_sub_path();
    cr.arc(cx + s * 0.45, cy + s * 0.1, s * 0.35, 0.0, 2.0 * PI);
    cr.rectangle(cx - s * 0.4, cy + s * 0.05, s * 0.85, s * 0.4);
    cr.set_fill_rule(cairo::FillRule::Winding);
    cr.fill()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_mapping() {
        assert_eq!(Icon::for_condition("sunny"), Icon::Sun);
        assert_eq!(Icon::for_condition("partlycloudy"), Icon::PartlyCloudy);
        assert_eq!(Icon::for_condition("lightning-rainy"), Icon::Lightning);
        assert_eq!(Icon::for_condition("snowy-rainy"), Icon::Snow);
        assert_eq!(Icon::for_condition("clear-night"), Icon::Moon);
        assert_eq!(Icon::for_condition("cloudy"), Icon::Cloud);
    }
}
