//! Helpers shared by several widgets.

use cairo::Context;
use serde_json::Value;
use tinydash_core::{ConfigError, RenderError, WidgetContext};
use tinydash_render::{draw_text, font, truncate_to_width, FontRole, HAlign, VAlign};
use tinydash_types::{Color, EntityState};

/// States that count as "on" for binary indicators
pub const ON_STATES: [&str; 6] = ["on", "true", "home", "locked", "open", "1"];

pub fn is_on(state: &str) -> bool {
    let state = state.trim();
    ON_STATES.iter().any(|s| state.eq_ignore_ascii_case(s))
}

/// Fraction of the way from `min` to `max`, clamped to [0, 1].
///
/// A range with `max <= min` is a configuration error.
pub fn fill_fraction(value: f64, min: f64, max: f64) -> Result<f64, ConfigError> {
    if !(max > min) {
        return Err(ConfigError::InvalidRange { min, max });
    }
    Ok(((value - min) / (max - min)).clamp(0.0, 1.0))
}

/// Numeric state of an entity, unavailable if it does not parse
pub fn numeric_value(state: &EntityState) -> Result<f64, RenderError> {
    state
        .numeric()
        .ok_or_else(|| RenderError::DataUnavailable(state.entity_id.clone()))
}

/// Range options `min`/`max`, validated
pub fn range_options(ctx: &WidgetContext) -> Result<(f64, f64), ConfigError> {
    let min = ctx.options().f64_or("min", 0.0);
    let max = ctx.options().f64_or("max", 100.0);
    if !(max > min) {
        return Err(ConfigError::InvalidRange { min, max });
    }
    Ok((min, max))
}

/// One row of a list-style widget (status_list, multi_progress)
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub entity_id: String,
    pub label: Option<String>,
    pub value: Value,
}

/// Parse a list option whose items are `"id"`, `["id", "label"]` or
/// `{"entity_id": "id", "label": "..."}`. Malformed items are skipped.
pub fn parse_entity_list(items: Option<&Vec<Value>>) -> Vec<ListEntry> {
    let Some(items) = items else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let (entity_id, label) = match item {
                Value::String(id) => (id.clone(), None),
                Value::Array(pair) => (
                    pair.first()?.as_str()?.to_string(),
                    pair.get(1).and_then(Value::as_str).map(str::to_string),
                ),
                Value::Object(map) => (
                    map.get("entity_id")?.as_str()?.to_string(),
                    map.get("label").and_then(Value::as_str).map(str::to_string),
                ),
                _ => return None,
            };
            if entity_id.is_empty() {
                return None;
            }
            Some(ListEntry {
                entity_id,
                label,
                value: item.clone(),
            })
        })
        .collect()
}

/// Short label drawn along the top edge of a slot
pub fn draw_title(cr: &Context, ctx: &WidgetContext, title: &str, color: Color) -> Result<f64, cairo::Error> {
    let title_font = font(ctx.theme, FontRole::Small, ctx.width, ctx.height);
    let pad = (ctx.height * 0.06).clamp(3.0, 10.0);
    let text = truncate_to_width(cr, title, &title_font, ctx.width - 2.0 * pad);
    let extents = draw_text(cr, &text, &title_font, color, ctx.width / 2.0, pad, HAlign::Center, VAlign::Top)?;
    Ok(pad + extents.height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fill_fraction_bounds() {
        assert_eq!(fill_fraction(0.0, 0.0, 100.0), Ok(0.0));
        assert_eq!(fill_fraction(100.0, 0.0, 100.0), Ok(1.0));
        assert_eq!(fill_fraction(50.0, 0.0, 100.0), Ok(0.5));
        assert_eq!(fill_fraction(-20.0, 0.0, 100.0), Ok(0.0));
        assert_eq!(fill_fraction(250.0, 0.0, 100.0), Ok(1.0));
        assert_eq!(fill_fraction(15.0, 10.0, 20.0), Ok(0.5));
    }

    #[test]
    fn test_fill_fraction_rejects_empty_range() {
        assert!(matches!(fill_fraction(5.0, 10.0, 10.0), Err(ConfigError::InvalidRange { .. })));
        assert!(fill_fraction(5.0, 10.0, 0.0).is_err());
        assert!(fill_fraction(5.0, 0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_on_states() {
        for s in ["on", "ON", "home", "locked", "true", "1", "open"] {
            assert!(is_on(s), "{} should be on", s);
        }
        for s in ["off", "away", "unlocked", "0", "closed"] {
            assert!(!is_on(s), "{} should be off", s);
        }
    }

    #[test]
    fn test_parse_entity_list_shapes() {
        let items = json!([
            "light.kitchen",
            ["lock.front", "Front door"],
            {"entity_id": "switch.fan", "label": "Fan"},
            42,
            {"label": "no id"},
            ""
        ]);
        let entries = parse_entity_list(items.as_array());
        let ids: Vec<_> = entries.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["light.kitchen", "lock.front", "switch.fan"]);
        assert_eq!(entries[1].label.as_deref(), Some("Front door"));
        assert_eq!(entries[0].label, None);
    }
}
