//! Binary status widgets: a single indicator, or a list of them.

use cairo::Context;
use serde_json::json;
use tinydash_core::{
    ConfigOption, ConfigSchema, Dependencies, RenderError, WidgetContext, WidgetRenderer,
};
use tinydash_render::{
    draw_dot, draw_icon, draw_text, fit_font_size, font, truncate_to_width, FontRole, HAlign,
    Icon, VAlign,
};
use tinydash_types::{Color, EntityState, SlotConfig, WidgetKind};

use crate::helpers::{draw_title, is_on, parse_entity_list};

/// Colors and texts for the two states
#[derive(Debug, Clone, PartialEq)]
pub struct Indicator {
    pub on: bool,
    pub color: Color,
    pub text: String,
}

pub fn indicator(state: &EntityState, ctx: &WidgetContext) -> Indicator {
    let options = ctx.options();
    let on = is_on(&state.state);
    let (color, text) = if on {
        (
            ctx.color_or("on_color", ctx.theme.on_color),
            options.str_or("on_text", "ON"),
        )
    } else {
        (
            ctx.color_or("off_color", ctx.theme.off_color),
            options.str_or("off_text", "OFF"),
        )
    };
    Indicator {
        on,
        color,
        text: text.to_string(),
    }
}

fn color_options() -> Vec<ConfigOption> {
    vec![
        ConfigOption::new("on_color", "color", json!(null), "Indicator color when on, theme default"),
        ConfigOption::new("off_color", "color", json!(null), "Indicator color when off, theme default"),
        ConfigOption::new("on_text", "string", json!("ON"), "Text when on"),
        ConfigOption::new("off_text", "string", json!("OFF"), "Text when off"),
    ]
}

pub struct StatusWidget;

impl WidgetRenderer for StatusWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Status
    }

    fn config_schema(&self) -> ConfigSchema {
        let mut options = color_options();
        options.push(ConfigOption::new("show_status_text", "boolean", json!(true), "ON/OFF text"));
        options.push(ConfigOption::new("icon", "string", json!(null), "Glyph instead of a dot"));
        ConfigSchema::new(options)
    }

    fn draw(&self, cr: &Context, ctx: &WidgetContext) -> Result<(), RenderError> {
        let state = ctx.primary_state()?;
        let ind = indicator(state, ctx);
        let theme = ctx.theme;
        let (w, h) = (ctx.width, ctx.height);
        let show_text = ctx.options().bool_or("show_status_text", true);

        let size = (h.min(w) * 0.32).max(6.0);
        let cy = if show_text { h * 0.36 } else { h * 0.42 };
        match ctx.options().str("icon").and_then(Icon::from_name) {
            Some(icon) => draw_icon(cr, icon, w / 2.0, cy, size, ind.color)?,
            None => {
                // Halo then solid dot
                draw_dot(cr, w / 2.0, cy, size * 0.55, ind.color.with_alpha(0.25))?;
                draw_dot(cr, w / 2.0, cy, size * 0.38, ind.color)?;
            }
        }

        let small = font(theme, FontRole::Small, w, h);
        let mut y = cy + size * 0.6 + 2.0;
        if show_text {
            let base = small.clone().bold();
            let text_size = fit_font_size(cr, &ind.text, &base, w * 0.9, h * 0.18, base.size);
            y += draw_text(cr, &ind.text, &base.sized(text_size), ind.color, w / 2.0, y, HAlign::Center, VAlign::Top)?.height;
        }
        let label = ctx.label_or(Some(state), &state.entity_id);
        let label = truncate_to_width(cr, &label, &small, w * 0.92);
        draw_text(cr, &label, &small, theme.text_secondary, w / 2.0, y.max(h * 0.8), HAlign::Center, VAlign::Middle)?;
        Ok(())
    }
}

pub struct StatusListWidget;

impl WidgetRenderer for StatusListWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::StatusList
    }

    fn config_schema(&self) -> ConfigSchema {
        let mut options = color_options();
        options.push(ConfigOption::new("title", "string", json!(null), "Heading above the list"));
        options.push(ConfigOption::new(
            "entities",
            "list",
            json!([]),
            "Rows as \"id\", [id, label] or {entity_id, label}",
        ));
        ConfigSchema::new(options)
    }

    fn dependencies(&self, slot: &SlotConfig) -> Dependencies {
        let mut deps = Dependencies::default();
        for entry in parse_entity_list(slot.options.array("entities")) {
            deps.entities.insert(entry.entity_id);
        }
        if let Some(id) = slot.entity_id.as_deref().filter(|id| !id.is_empty()) {
            deps.entities.insert(id.to_string());
        }
        deps
    }

    fn draw(&self, cr: &Context, ctx: &WidgetContext) -> Result<(), RenderError> {
        let mut entries = parse_entity_list(ctx.options().array("entities"));
        if let Some(id) = ctx.entity_id() {
            if !entries.iter().any(|e| e.entity_id == id) {
                entries.extend(parse_entity_list(Some(&vec![json!(id)])));
            }
        }
        if entries
            .iter()
            .all(|e| ctx.snapshots.available(&e.entity_id).is_none())
        {
            let first = entries.first().map(|e| e.entity_id.clone()).unwrap_or_default();
            return Err(RenderError::DataUnavailable(first));
        }

        let theme = ctx.theme;
        let (w, h) = (ctx.width, ctx.height);
        let pad = (w * 0.05).clamp(3.0, 10.0);
        let mut top = pad * 0.5;
        if let Some(title) = ctx.options().str("title").or(ctx.slot.label.as_deref()) {
            top = draw_title(cr, ctx, title, theme.text_secondary)? + pad * 0.5;
        }

        let row_h = ((h - top - pad * 0.5) / entries.len() as f64).min(28.0);
        if row_h < 6.0 {
            return Ok(());
        }
        let row_font = font(theme, FontRole::Small, w, (row_h * 5.0).min(h));
        for (i, entry) in entries.iter().enumerate() {
            let cy = top + row_h * (i as f64 + 0.5);
            let state = ctx.snapshots.available(&entry.entity_id);
            let (color, text) = match state {
                Some(s) => {
                    let ind = indicator(s, ctx);
                    (ind.color, ind.text)
                }
                None => (theme.placeholder, "?".to_string()),
            };
            draw_dot(cr, pad + row_h * 0.25, cy, (row_h * 0.22).max(2.0), color)?;
            let status = draw_text(cr, &text, &row_font, color, w - pad, cy, HAlign::Right, VAlign::Middle)?;

            let label = entry
                .label
                .clone()
                .or_else(|| state.and_then(|s| s.friendly_name()).map(str::to_string))
                .unwrap_or_else(|| entry.entity_id.clone());
            let label_x = pad + row_h * 0.6;
            let label_w = w - label_x - status.width - 2.0 * pad;
            if label_w > 8.0 {
                let label = truncate_to_width(cr, &label, &row_font, label_w);
                draw_text(cr, &label, &row_font, theme.text_primary, label_x, cy, HAlign::Left, VAlign::Middle)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use tinydash_types::{SnapshotSet, Theme};

    #[test]
    fn test_indicator_uses_options_and_theme() {
        let slot = SlotConfig::new(0, "status")
            .entity("lock.front")
            .option("on_text", "LOCKED")
            .option("off_color", "#0000ff");
        let now = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let snapshots = SnapshotSet::new(now);
        let theme = Theme::default();
        let ctx = WidgetContext {
            slot: &slot,
            slot_index: 0,
            width: 80.0,
            height: 80.0,
            snapshots: &snapshots,
            theme: &theme,
        };

        let locked = indicator(&EntityState::new("lock.front", "locked"), &ctx);
        assert!(locked.on);
        assert_eq!(locked.text, "LOCKED");
        assert_eq!(locked.color, theme.on_color);

        let unlocked = indicator(&EntityState::new("lock.front", "unlocked"), &ctx);
        assert!(!unlocked.on);
        assert_eq!(unlocked.text, "OFF");
        assert_eq!(unlocked.color, Color::from_rgb8(0, 0, 255));
    }

    #[test]
    fn test_status_list_dependencies() {
        let slot = SlotConfig::new(0, "status_list")
            .option("entities", json!(["light.a", ["lock.b", "Back"]]))
            .entity("light.a");
        let deps = StatusListWidget.dependencies(&slot);
        assert_eq!(deps.entities.len(), 2);
    }
}
