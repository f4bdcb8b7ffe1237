//! Media player widget: title, artist and playback progress.

use cairo::Context;
use chrono::{DateTime, FixedOffset};
use serde_json::json;
use tinydash_core::{ConfigOption, ConfigSchema, RenderError, WidgetContext, WidgetRenderer};
use tinydash_render::{
    draw_bar, draw_icon, draw_text, font, format_duration, truncate_to_width, FontRole, HAlign,
    Icon, VAlign,
};
use tinydash_types::{EntityState, WidgetKind};

/// Player states that show the idle face instead of track info
const IDLE_STATES: [&str; 3] = ["off", "idle", "standby"];

pub fn is_idle(state: &EntityState) -> bool {
    IDLE_STATES.iter().any(|s| state.state.eq_ignore_ascii_case(s))
        || state.attribute_str("media_title").map_or(true, str::is_empty)
}

/// (position, duration) in seconds.
///
/// While playing, the reported position is advanced by the time elapsed
/// since `media_position_updated_at`, measured against the snapshot time.
pub fn playback_position(state: &EntityState, now: DateTime<FixedOffset>) -> Option<(f64, f64)> {
    let duration = state.attribute_f64("media_duration").filter(|d| *d > 0.0)?;
    let mut position = state.attribute_f64("media_position").unwrap_or(0.0);
    if state.state.eq_ignore_ascii_case("playing") {
        if let Some(updated) = state
            .attribute_str("media_position_updated_at")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        {
            let elapsed = (now - updated).num_milliseconds() as f64 / 1000.0;
            position += elapsed.max(0.0);
        }
    }
    Some((position.clamp(0.0, duration), duration))
}

pub struct MediaWidget;

impl WidgetRenderer for MediaWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Media
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new(vec![
            ConfigOption::new("show_artist", "boolean", json!(true), "Artist line"),
            ConfigOption::new("show_album", "boolean", json!(false), "Album line"),
            ConfigOption::new("show_progress", "boolean", json!(true), "Position bar and times"),
        ])
    }

    fn draw(&self, cr: &Context, ctx: &WidgetContext) -> Result<(), RenderError> {
        let state = ctx.primary_state()?;
        let options = ctx.options();
        let theme = ctx.theme;
        let accent = ctx.accent();
        let (w, h) = (ctx.width, ctx.height);
        let pad = (w * 0.06).clamp(3.0, 12.0);

        if is_idle(state) {
            let size = (h.min(w) * 0.3).max(8.0);
            draw_icon(cr, Icon::Pause, w / 2.0, h * 0.42, size, theme.text_secondary)?;
            let label_font = font(theme, FontRole::Small, w, h).bold();
            draw_text(cr, "PAUSED", &label_font, theme.text_secondary, w / 2.0, h * 0.42 + size * 0.8, HAlign::Center, VAlign::Top)?;
            return Ok(());
        }

        let playing = state.state.eq_ignore_ascii_case("playing");
        let glyph = (h * 0.16).clamp(8.0, 24.0);
        draw_icon(cr, if playing { Icon::Play } else { Icon::Pause }, pad + glyph / 2.0, pad + glyph / 2.0, glyph, accent)?;

        let mut y = pad + glyph + pad * 0.5;
        let title_font = font(theme, FontRole::Medium, w, h).bold();
        let title = truncate_to_width(cr, state.attribute_str("media_title").unwrap_or(""), &title_font, w - 2.0 * pad);
        y += draw_text(cr, &title, &title_font, theme.text_primary, pad, y, HAlign::Left, VAlign::Top)?.height;

        let line_font = font(theme, FontRole::Small, w, h);
        let mut lines = Vec::new();
        if options.bool_or("show_artist", true) {
            lines.extend(state.attribute_str("media_artist"));
        }
        if options.bool_or("show_album", false) {
            lines.extend(state.attribute_str("media_album_name"));
        }
        for line in lines.into_iter().filter(|l| !l.is_empty()) {
            let text = truncate_to_width(cr, line, &line_font, w - 2.0 * pad);
            y += draw_text(cr, &text, &line_font, theme.text_secondary, pad, y, HAlign::Left, VAlign::Top)?.height;
        }

        if options.bool_or("show_progress", true) {
            if let Some((position, duration)) = playback_position(state, ctx.snapshots.now) {
                let time_font = font(theme, FontRole::Tiny, w, h);
                let bar_h = (h * 0.04).clamp(3.0, 6.0);
                let bar_y = h - pad - time_font.size * 1.4 - bar_h;
                if bar_y > y {
                    draw_bar(cr, pad, bar_y, w - 2.0 * pad, bar_h, position / duration, accent, theme.track)?;
                    let ty = bar_y + bar_h + 2.0;
                    draw_text(cr, &format_duration(position), &time_font, theme.text_secondary, pad, ty, HAlign::Left, VAlign::Top)?;
                    draw_text(cr, &format_duration(duration), &time_font, theme.text_secondary, w - pad, ty, HAlign::Right, VAlign::Top)?;
                }
            }
        }
        Ok(())
    }
}
