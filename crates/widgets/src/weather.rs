//! Weather widget: current condition and temperature with a short forecast.

use cairo::Context;
use chrono::{DateTime, FixedOffset};
use serde_json::{json, Value};
use tinydash_core::{ConfigOption, ConfigSchema, RenderError, WidgetContext, WidgetRenderer};
use tinydash_render::{
    draw_icon, draw_text, fit_font_size, font, format_number, FontRole, HAlign, Icon, VAlign,
};
use tinydash_types::{EntityState, WidgetKind};

/// One forecast column
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDay {
    pub label: String,
    pub condition: String,
    pub temperature: Option<f64>,
}

/// Parse up to `days` forecast entries from the `forecast` attribute.
///
/// Day labels are weekday abbreviations in the snapshot's offset.
pub fn forecast_days(state: &EntityState, now: DateTime<FixedOffset>, days: usize) -> Vec<ForecastDay> {
    let Some(Value::Array(entries)) = state.attribute("forecast") else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let condition = entry.get("condition")?.as_str()?.to_string();
            let label = entry
                .get("datetime")
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(now.offset()).format("%a").to_string())
                .unwrap_or_default();
            Some(ForecastDay {
                label,
                condition,
                temperature: entry.get("temperature").and_then(Value::as_f64),
            })
        })
        .take(days)
        .collect()
}

fn temperature_text(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{}{}", format_number(v, Some(0)), unit),
        None => "--".to_string(),
    }
}

pub struct WeatherWidget;

impl WidgetRenderer for WeatherWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Weather
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new(vec![
            ConfigOption::new("show_forecast", "boolean", json!(true), "Forecast row"),
            ConfigOption::new("forecast_days", "number", json!(3), "Forecast columns (1-5)"),
            ConfigOption::new("show_humidity", "boolean", json!(true), "Humidity line"),
        ])
    }

    fn draw(&self, cr: &Context, ctx: &WidgetContext) -> Result<(), RenderError> {
        let state = ctx.primary_state()?;
        let options = ctx.options();
        let theme = ctx.theme;
        let accent = ctx.accent();
        let (w, h) = (ctx.width, ctx.height);
        let unit = state.attribute_str("temperature_unit").unwrap_or("°");

        let forecast = if options.bool_or("show_forecast", true) && h >= 90.0 {
            let days = options.u32_or("forecast_days", 3).clamp(1, 5) as usize;
            forecast_days(state, ctx.snapshots.now, days)
        } else {
            Vec::new()
        };
        let current_h = if forecast.is_empty() { h } else { h * 0.62 };

        // Current conditions: icon on the left, temperature on the right
        let icon_size = (current_h * 0.5).min(w * 0.35);
        draw_icon(cr, Icon::for_condition(&state.state), w * 0.27, current_h * 0.42, icon_size, accent)?;

        let temp = temperature_text(state.attribute_f64("temperature"), unit);
        let temp_font = font(theme, FontRole::XLarge, w, h).bold();
        let size = fit_font_size(cr, &temp, &temp_font, w * 0.45, current_h * 0.4, temp_font.size);
        draw_text(cr, &temp, &temp_font.sized(size), theme.text_primary, w * 0.72, current_h * 0.38, HAlign::Center, VAlign::Middle)?;

        let small = font(theme, FontRole::Small, w, h);
        let mut detail = state.state.replace('-', " ");
        if options.bool_or("show_humidity", true) {
            if let Some(humidity) = state.attribute_f64("humidity") {
                detail = format!("{}  {}%", detail, format_number(humidity, Some(0)));
            }
        }
        draw_text(cr, &detail, &small, theme.text_secondary, w / 2.0, current_h * 0.82, HAlign::Center, VAlign::Middle)?;

        if !forecast.is_empty() {
            let col_w = w / forecast.len() as f64;
            let row_top = current_h;
            let tiny = font(theme, FontRole::Tiny, w, h);
            let glyph = ((h - row_top) * 0.3).min(col_w * 0.4);
            for (i, day) in forecast.iter().enumerate() {
                let cx = col_w * (i as f64 + 0.5);
                draw_text(cr, &day.label, &tiny, theme.text_secondary, cx, row_top + 2.0, HAlign::Center, VAlign::Top)?;
                draw_icon(cr, Icon::for_condition(&day.condition), cx, row_top + (h - row_top) * 0.5, glyph, accent)?;
                draw_text(cr, &temperature_text(day.temperature, "°"), &tiny, theme.text_primary, cx, h - 2.0, HAlign::Center, VAlign::Bottom)?;
            }
        }
        Ok(())
    }
}
