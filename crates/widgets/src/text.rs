//! Text widget: static text, optionally templated with an entity's state.

use cairo::Context;
use serde_json::json;
use tinydash_core::{ConfigOption, ConfigSchema, RenderError, WidgetContext, WidgetRenderer};
use tinydash_render::{draw_text, fit_font_size, font, FontRole, HAlign, VAlign};
use tinydash_types::{EntityState, WidgetKind};

/// Replace `{state}`, `{unit}` and `{name}` with values from the entity
pub fn expand_template(template: &str, state: Option<&EntityState>) -> String {
    let Some(state) = state else {
        return template.to_string();
    };
    template
        .replace("{state}", &state.state)
        .replace("{unit}", state.unit().unwrap_or(""))
        .replace("{name}", state.friendly_name().unwrap_or(&state.entity_id))
}

pub struct TextWidget;

impl WidgetRenderer for TextWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Text
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new(vec![
            ConfigOption::new("text", "string", json!(""), "Text to show, supports {state} {unit} {name}"),
            ConfigOption::new("size", "string", json!("regular"), "small, regular, large or xlarge"),
            ConfigOption::new("align", "string", json!("center"), "left, center or right"),
        ])
    }

    fn wants_panel(&self) -> bool {
        false
    }

    fn draw(&self, cr: &Context, ctx: &WidgetContext) -> Result<(), RenderError> {
        let options = ctx.options();
        let state = ctx.entity_id().and_then(|id| ctx.snapshots.available(id));
        let template = options
            .str("text")
            .filter(|t| !t.is_empty())
            .or(ctx.slot.label.as_deref())
            .unwrap_or("");
        let text = expand_template(template, state);
        if text.is_empty() {
            return Ok(());
        }

        let (w, h) = (ctx.width, ctx.height);
        let role = FontRole::from_name(options.str_or("size", "regular")).unwrap_or(FontRole::Regular);
        let base = font(ctx.theme, role, w, h);
        let pad = (w * 0.05).clamp(2.0, 10.0);
        let size = fit_font_size(cr, &text, &base, w - 2.0 * pad, h - 2.0 * pad, base.size);
        let align = HAlign::from_name(options.str_or("align", "center"));
        let x = match align {
            HAlign::Left => pad,
            HAlign::Center => w / 2.0,
            HAlign::Right => w - pad,
        };
        let color = ctx.color_or("color", ctx.theme.text_primary);
        draw_text(cr, &text, &base.sized(size), color, x, h / 2.0, align, VAlign::Middle)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_expansion() {
        let state = EntityState::new("sensor.co2", "612")
            .with_unit("ppm")
            .with_attribute("friendly_name", "Office CO2");
        assert_eq!(
            expand_template("{name}: {state} {unit}", Some(&state)),
            "Office CO2: 612 ppm"
        );
        assert_eq!(expand_template("Hello {state}", None), "Hello {state}");
    }
}
