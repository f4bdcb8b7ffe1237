//! Gauge widget: a numeric value against a min/max range as a bar, ring or arc.

use cairo::Context;
use serde_json::json;
use std::f64::consts::PI;
use tinydash_core::{
    ConfigError, ConfigOption, ConfigSchema, RenderError, WidgetContext, WidgetRenderer,
};
use tinydash_render::{
    draw_arc_gauge, draw_bar, draw_text, fit_font_size, font, format_number,
    format_value_with_unit, truncate_to_width, FontRole, HAlign, VAlign,
};
use tinydash_types::{EntityState, Options, WidgetKind};

use crate::helpers::{fill_fraction, numeric_value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeStyle {
    Bar,
    Ring,
    Arc,
}

impl GaugeStyle {
    pub fn from_options(options: &Options) -> Result<Self, ConfigError> {
        match options.str_or("style", "ring").to_ascii_lowercase().as_str() {
            "bar" => Ok(GaugeStyle::Bar),
            "ring" => Ok(GaugeStyle::Ring),
            "arc" => Ok(GaugeStyle::Arc),
            other => Err(ConfigError::InvalidOption {
                key: "style".to_string(),
                reason: format!("'{}' is not one of bar, ring, arc", other),
            }),
        }
    }

    /// (start angle, sweep) in radians
    fn angles(&self) -> (f64, f64) {
        match self {
            GaugeStyle::Ring => (-PI / 2.0, 2.0 * PI),
            _ => (3.0 * PI / 4.0, 3.0 * PI / 2.0),
        }
    }
}

/// Fraction and display text for a numeric entity
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub fraction: f64,
    pub text: String,
}

pub fn reading(state: &EntityState, options: &Options) -> Result<Reading, RenderError> {
    let min = options.f64_or("min", 0.0);
    let max = options.f64_or("max", 100.0);
    let value = numeric_value(state)?;
    let fraction = fill_fraction(value, min, max)?;
    let unit = options.str("unit").or_else(|| state.unit());
    Ok(Reading {
        fraction,
        text: format_value_with_unit(&format_number(value, None), unit),
    })
}

pub struct GaugeWidget;

impl WidgetRenderer for GaugeWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Gauge
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new(vec![
            ConfigOption::new("style", "string", json!("ring"), "bar, ring or arc"),
            ConfigOption::new("min", "number", json!(0), "Value drawn as empty"),
            ConfigOption::new("max", "number", json!(100), "Value drawn as full"),
            ConfigOption::new("show_value", "boolean", json!(true), "Value text"),
            ConfigOption::new("unit", "string", json!(null), "Overrides the entity unit"),
        ])
    }

    fn draw(&self, cr: &Context, ctx: &WidgetContext) -> Result<(), RenderError> {
        let options = ctx.options();
        let style = GaugeStyle::from_options(options)?;
        let state = ctx.primary_state()?;
        let reading = reading(state, options)?;

        let theme = ctx.theme;
        let accent = ctx.accent();
        let (w, h) = (ctx.width, ctx.height);
        let label = ctx.label_or(Some(state), &state.entity_id);
        let label_font = font(theme, FontRole::Small, w, h);
        let label = truncate_to_width(cr, &label, &label_font, w * 0.9);
        let show_value = options.bool_or("show_value", true);

        match style {
            GaugeStyle::Bar => {
                let pad = (w * 0.08).clamp(3.0, 12.0);
                let bar_h = (h * 0.14).clamp(4.0, 18.0);
                let bar_y = h * 0.58;
                if show_value {
                    let base = font(theme, FontRole::Large, w, h).bold();
                    let size = fit_font_size(cr, &reading.text, &base, w - 2.0 * pad, bar_y * 0.6, base.size);
                    draw_text(cr, &reading.text, &base.sized(size), theme.text_primary, w / 2.0, bar_y * 0.55, HAlign::Center, VAlign::Middle)?;
                }
                draw_bar(cr, pad, bar_y, w - 2.0 * pad, bar_h, reading.fraction, accent, theme.track)?;
                draw_text(cr, &label, &label_font, theme.text_secondary, w / 2.0, bar_y + bar_h + (h - bar_y - bar_h) / 2.0, HAlign::Center, VAlign::Middle)?;
            }
            GaugeStyle::Ring | GaugeStyle::Arc => {
                let label_h = label_font.size * 1.6;
                let area_h = h - label_h;
                let radius = (w.min(area_h) / 2.0) * 0.78;
                let thickness = (radius * 0.2).max(2.0);
                let (cx, cy) = (w / 2.0, area_h / 2.0 + 2.0);
                let (start, sweep) = style.angles();
                draw_arc_gauge(cr, cx, cy, radius, thickness, start, sweep, reading.fraction, accent, theme.track)?;
                if show_value {
                    let base = font(theme, FontRole::Large, w, h).bold();
                    let inner = (radius - thickness) * 1.5;
                    let size = fit_font_size(cr, &reading.text, &base, inner, inner * 0.6, base.size);
                    draw_text(cr, &reading.text, &base.sized(size), theme.text_primary, cx, cy, HAlign::Center, VAlign::Middle)?;
                }
                draw_text(cr, &label, &label_font, theme.text_secondary, w / 2.0, h - label_h / 2.0, HAlign::Center, VAlign::Middle)?;
            }
        }
        Ok(())
    }
}
