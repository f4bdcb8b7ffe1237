//! Entity widget: one value with its unit and name.

use cairo::Context;
use serde_json::json;
use tinydash_core::{ConfigOption, ConfigSchema, RenderError, WidgetContext, WidgetRenderer};
use tinydash_render::{
    draw_icon, draw_text, fit_font_size, font, format_number, format_value_with_unit,
    truncate_to_width, FontRole, HAlign, Icon, VAlign,
};
use tinydash_types::{EntityState, Options, WidgetKind};

/// Value text as shown on screen ("21.5°C", "on")
pub fn display_value(state: &EntityState, options: &Options) -> String {
    let precision = options.f64("precision").map(|p| p.clamp(0.0, 6.0) as usize);
    let value = match state.numeric() {
        Some(v) => format_number(v, precision),
        None => state.state.clone(),
    };
    if options.bool_or("show_unit", true) {
        format_value_with_unit(&value, state.unit())
    } else {
        value
    }
}

pub struct EntityWidget;

impl WidgetRenderer for EntityWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Entity
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new(vec![
            ConfigOption::new("show_name", "boolean", json!(true), "Entity name under the value"),
            ConfigOption::new("show_unit", "boolean", json!(true), "Append the unit"),
            ConfigOption::new("precision", "number", json!(null), "Decimals, adaptive when unset"),
            ConfigOption::new("icon", "string", json!(null), "Glyph above the value"),
        ])
    }

    fn draw(&self, cr: &Context, ctx: &WidgetContext) -> Result<(), RenderError> {
        let state = ctx.primary_state()?;
        let options = ctx.options();
        let (w, h) = (ctx.width, ctx.height);
        let theme = ctx.theme;
        let accent = ctx.accent();

        let icon = options.str("icon").and_then(Icon::from_name);
        let show_name = options.bool_or("show_name", true);

        let mut top = 0.0;
        if let Some(icon) = icon {
            let size = (h * 0.22).min(w * 0.3);
            draw_icon(cr, icon, w / 2.0, h * 0.08 + size / 2.0, size, accent)?;
            top = h * 0.08 + size;
        }
        let bottom = if show_name { h * 0.75 } else { h };

        let value = display_value(state, options);
        let base = font(theme, FontRole::XLarge, w, h).bold();
        let size = fit_font_size(cr, &value, &base, w * 0.88, (bottom - top) * 0.8, base.size);
        draw_text(
            cr,
            &value,
            &base.sized(size),
            accent,
            w / 2.0,
            (top + bottom) / 2.0,
            HAlign::Center,
            VAlign::Middle,
        )?;

        if show_name {
            let name = ctx.label_or(Some(state), &state.entity_id);
            let name_font = font(theme, FontRole::Small, w, h);
            let name = truncate_to_width(cr, &name, &name_font, w * 0.92);
            draw_text(cr, &name, &name_font, theme.text_secondary, w / 2.0, h * 0.86, HAlign::Center, VAlign::Middle)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_value() {
        let temp = EntityState::new("sensor.t", "21.549").with_unit("°C");
        assert_eq!(display_value(&temp, &Options::new()), "21.5°C");
        assert_eq!(display_value(&temp, &Options::new().with("precision", 2)), "21.55°C");
        assert_eq!(display_value(&temp, &Options::new().with("show_unit", false)), "21.5");

        let door = EntityState::new("binary_sensor.door", "open");
        assert_eq!(display_value(&door, &Options::new()), "open");
    }
}
