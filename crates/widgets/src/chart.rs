//! Chart widget: sparkline of an entity's recent history.

use cairo::Context;
use serde_json::json;
use tinydash_core::constants::DEFAULT_CHART_HOURS;
use tinydash_core::{
    ConfigOption, ConfigSchema, Dependencies, RenderError, WidgetContext, WidgetRenderer,
};
use tinydash_render::{
    draw_sparkline, draw_text, font, format_number, format_value_with_unit, observed_range,
    resample, truncate_to_width, FontRole, HAlign, SparklineStyle, VAlign,
};
use tinydash_types::{HistoryPoint, Options, SlotConfig, WidgetKind};

fn hours(options: &Options) -> u32 {
    options.u32_or("hours", DEFAULT_CHART_HOURS).clamp(1, 24 * 7)
}

/// Series as (seconds since first sample, value), ready for resampling
pub fn series_points(history: &[HistoryPoint]) -> Vec<(f64, f64)> {
    let Some(first) = history.first() else {
        return Vec::new();
    };
    history
        .iter()
        .filter(|p| p.value.is_finite())
        .map(|p| {
            let secs = (p.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0;
            (secs, p.value)
        })
        .collect()
}

pub struct ChartWidget;

impl WidgetRenderer for ChartWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Chart
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new(vec![
            ConfigOption::new("hours", "number", json!(DEFAULT_CHART_HOURS), "History window"),
            ConfigOption::new("show_value", "boolean", json!(true), "Current value overlay"),
            ConfigOption::new("show_range", "boolean", json!(true), "Observed min/max overlay"),
            ConfigOption::new("fill", "boolean", json!(true), "Shade the area under the line"),
        ])
    }

    fn dependencies(&self, slot: &SlotConfig) -> Dependencies {
        match slot.entity_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => Dependencies::default()
                .entity(id)
                .history(id, hours(&slot.options)),
            None => Dependencies::default(),
        }
    }

    fn draw(&self, cr: &Context, ctx: &WidgetContext) -> Result<(), RenderError> {
        let options = ctx.options();
        let entity_id = ctx
            .entity_id()
            .ok_or_else(|| RenderError::DataUnavailable(String::new()))?;
        let current = ctx.snapshots.available(entity_id);

        let mut points = ctx
            .snapshots
            .history(entity_id, hours(options))
            .map(series_points)
            .unwrap_or_default();
        if points.is_empty() {
            if let Some(v) = current.and_then(|s| s.numeric()) {
                points.push((0.0, v));
            }
        }
        if points.is_empty() {
            return Err(RenderError::DataUnavailable(entity_id.to_string()));
        }

        let theme = ctx.theme;
        let accent = ctx.accent();
        let (w, h) = (ctx.width, ctx.height);
        let pad = (w * 0.05).clamp(3.0, 10.0);
        let small = font(theme, FontRole::Small, w, h);
        let unit = current.and_then(|s| s.unit());

        let header_h = small.size * 1.5;
        let label = ctx.label_or(current, entity_id);
        let mut label_width = w - 2.0 * pad;

        if options.bool_or("show_value", true) {
            let latest = current
                .and_then(|s| s.numeric())
                .unwrap_or(points[points.len() - 1].1);
            let value = format_value_with_unit(&format_number(latest, None), unit);
            let value_font = small.clone().bold();
            let extents = draw_text(cr, &value, &value_font, accent, w - pad, pad, HAlign::Right, VAlign::Top)?;
            label_width -= extents.width + pad;
        }
        if label_width > 10.0 {
            let label = truncate_to_width(cr, &label, &small, label_width);
            draw_text(cr, &label, &small, theme.text_secondary, pad, pad, HAlign::Left, VAlign::Top)?;
        }

        let show_range = options.bool_or("show_range", true);
        let footer_h = if show_range { small.size * 1.4 } else { 0.0 };
        let plot_y = pad + header_h;
        let plot_h = h - plot_y - footer_h - pad;
        let plot_w = w - 2.0 * pad;
        if plot_h <= 2.0 || plot_w <= 2.0 {
            return Ok(());
        }

        let samples = (plot_w / 2.0).round().clamp(2.0, 240.0) as usize;
        let values = resample(&points, samples);
        let mut style = SparklineStyle::new(accent);
        if !options.bool_or("fill", true) {
            style.fill = None;
        }
        draw_sparkline(cr, pad, plot_y, plot_w, plot_h, &values, &style)?;

        if show_range {
            if let Some((min, max)) = observed_range(&values) {
                let tiny = font(theme, FontRole::Tiny, w, h);
                let y = h - pad;
                draw_text(cr, &format_number(min, None), &tiny, theme.text_secondary, pad, y, HAlign::Left, VAlign::Bottom)?;
                draw_text(cr, &format_number(max, None), &tiny, theme.text_secondary, w - pad, y, HAlign::Right, VAlign::Bottom)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_series_points_relative_seconds() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let history = vec![
            HistoryPoint::new(t0, 1.0),
            HistoryPoint::new(t0 + chrono::Duration::minutes(30), 4.0),
            HistoryPoint::new(t0 + chrono::Duration::hours(1), f64::NAN),
        ];
        assert_eq!(series_points(&history), vec![(0.0, 1.0), (1800.0, 4.0)]);
        assert!(series_points(&[]).is_empty());
    }

    #[test]
    fn test_dependencies_include_history_window() {
        let slot = SlotConfig::new(0, "chart").entity("sensor.power").option("hours", 6);
        let deps = ChartWidget.dependencies(&slot);
        assert!(deps.entities.contains("sensor.power"));
        assert!(deps.histories.contains(&("sensor.power".to_string(), 6)));
    }
}
