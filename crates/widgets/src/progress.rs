//! Progress widgets: a single labelled bar, or a stack of them.

use cairo::Context;
use serde_json::json;
use tinydash_core::{
    ConfigOption, ConfigSchema, Dependencies, RenderError, WidgetContext, WidgetRenderer,
};
use tinydash_render::{
    draw_bar, draw_text, font, format_number, format_value_with_unit, truncate_to_width,
    FontRole, HAlign, VAlign,
};
use tinydash_types::{Color, SlotConfig, WidgetKind};

use crate::helpers::{fill_fraction, numeric_value, parse_entity_list, range_options};

/// One labelled bar with its right-aligned value text
fn draw_row(
    cr: &Context,
    ctx: &WidgetContext,
    y: f64,
    row_h: f64,
    label: &str,
    value_text: Option<&str>,
    fraction: f64,
    color: Color,
) -> Result<(), RenderError> {
    let theme = ctx.theme;
    let w = ctx.width;
    let pad = (w * 0.06).clamp(3.0, 10.0);
    let text_font = font(theme, FontRole::Small, w, row_h * 2.0);
    let bar_h = (row_h * 0.28).clamp(3.0, 14.0);
    let text_y = y + row_h * 0.38;

    let mut label_width = w - 2.0 * pad;
    if let Some(value_text) = value_text {
        let extents = draw_text(cr, value_text, &text_font.clone().bold(), color, w - pad, text_y, HAlign::Right, VAlign::Middle)?;
        label_width -= extents.width + pad;
    }
    if label_width > 8.0 {
        let label = truncate_to_width(cr, label, &text_font, label_width);
        draw_text(cr, &label, &text_font, theme.text_primary, pad, text_y, HAlign::Left, VAlign::Middle)?;
    }
    draw_bar(cr, pad, y + row_h * 0.62, w - 2.0 * pad, bar_h, fraction, color, theme.track)?;
    Ok(())
}

pub struct ProgressWidget;

impl WidgetRenderer for ProgressWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Progress
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new(vec![
            ConfigOption::new("min", "number", json!(0), "Value drawn as empty"),
            ConfigOption::new("max", "number", json!(100), "Value drawn as full (the goal)"),
            ConfigOption::new("show_value", "boolean", json!(true), "\"value / max\" text"),
            ConfigOption::new("unit", "string", json!(null), "Overrides the entity unit"),
        ])
    }

    fn draw(&self, cr: &Context, ctx: &WidgetContext) -> Result<(), RenderError> {
        let (min, max) = range_options(ctx)?;
        let state = ctx.primary_state()?;
        let value = numeric_value(state)?;
        let fraction = fill_fraction(value, min, max)?;
        let options = ctx.options();

        let value_text = options.bool_or("show_value", true).then(|| {
            let unit = options.str("unit").or_else(|| state.unit());
            format_value_with_unit(
                &format!("{} / {}", format_number(value, None), format_number(max, None)),
                unit,
            )
        });
        let label = ctx.label_or(Some(state), &state.entity_id);
        let row_h = ctx.height.min(64.0);
        let y = (ctx.height - row_h) / 2.0;
        draw_row(cr, ctx, y, row_h, &label, value_text.as_deref(), fraction, ctx.accent())
    }
}

pub struct MultiProgressWidget;

impl WidgetRenderer for MultiProgressWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::MultiProgress
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new(vec![
            ConfigOption::new("title", "string", json!(null), "Heading above the bars"),
            ConfigOption::new(
                "items",
                "list",
                json!([]),
                "Bars as {entity_id, label?, min?, max?, color?}",
            ),
        ])
    }

    fn dependencies(&self, slot: &SlotConfig) -> Dependencies {
        let mut deps = Dependencies::default();
        for entry in parse_entity_list(slot.options.array("items")) {
            deps.entities.insert(entry.entity_id);
        }
        if let Some(id) = slot.entity_id.as_deref().filter(|id| !id.is_empty()) {
            deps.entities.insert(id.to_string());
        }
        deps
    }

    fn draw(&self, cr: &Context, ctx: &WidgetContext) -> Result<(), RenderError> {
        let mut entries = parse_entity_list(ctx.options().array("items"));
        if entries.is_empty() {
            if let Some(id) = ctx.entity_id() {
                entries = parse_entity_list(Some(&vec![json!(id)]));
            }
        }

        let mut top = 0.0;
        if let Some(title) = ctx.options().str("title").or(ctx.slot.label.as_deref()) {
            top = crate::helpers::draw_title(cr, ctx, title, ctx.theme.text_secondary)?;
        }

        let rows: Vec<_> = entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| {
                let state = ctx.snapshots.available(&entry.entity_id)?;
                let value = state.numeric()?;
                let min = entry.value.get("min").and_then(|v| v.as_f64()).unwrap_or(0.0);
                let max = entry.value.get("max").and_then(|v| v.as_f64()).unwrap_or(100.0);
                let fraction = fill_fraction(value, min, max).ok()?;
                let color = entry
                    .value
                    .get("color")
                    .and_then(Color::from_value)
                    .unwrap_or_else(|| ctx.theme.accent(ctx.slot_index + i));
                let label = entry
                    .label
                    .clone()
                    .or_else(|| state.friendly_name().map(str::to_string))
                    .unwrap_or_else(|| entry.entity_id.clone());
                let text = format_value_with_unit(&format_number(value, None), state.unit());
                Some((label, text, fraction, color))
            })
            .collect();

        if rows.is_empty() {
            let first = entries.first().map(|e| e.entity_id.clone()).unwrap_or_default();
            return Err(RenderError::DataUnavailable(first));
        }

        let row_h = ((ctx.height - top) / rows.len() as f64).min(56.0);
        for (i, (label, text, fraction, color)) in rows.iter().enumerate() {
            draw_row(cr, ctx, top + i as f64 * row_h, row_h, label, Some(text), *fraction, *color)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_progress_dependencies() {
        let slot = SlotConfig::new(0, "multi_progress").option(
            "items",
            json!([{"entity_id": "sensor.steps", "max": 10000}, "sensor.water"]),
        );
        let deps = MultiProgressWidget.dependencies(&slot);
        let ids: Vec<_> = deps.entities.iter().map(String::as_str).collect();
        assert_eq!(ids, vec!["sensor.steps", "sensor.water"]);
    }
}
