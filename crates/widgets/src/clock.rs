//! Clock widget: time with an optional date line.
//!
//! The time comes from the snapshot, never the system clock, so the same
//! snapshot always draws the same face.

use cairo::Context;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde_json::json;
use std::fmt::Write;
use tinydash_core::{ConfigError, ConfigOption, ConfigSchema, RenderError, WidgetContext, WidgetRenderer};
use tinydash_render::{draw_text, fit_font_size, font, text_extents, FontRole, HAlign, VAlign};
use tinydash_types::{Options, WidgetKind};

pub const DEFAULT_DATE_FORMAT: &str = "%a %d %b";

/// Text content of a clock face
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockFace {
    pub time: String,
    /// "AM"/"PM" in 12-hour mode
    pub meridiem: Option<String>,
    pub date: Option<String>,
}

/// Format the snapshot time according to the clock options
pub fn clock_face(now: DateTime<FixedOffset>, options: &Options) -> Result<ClockFace, ConfigError> {
    match options.str("timezone").map(str::parse::<Tz>) {
        Some(Ok(tz)) => format_face(&now.with_timezone(&tz), options),
        Some(Err(_)) => {
            log::debug!("Unknown timezone {:?}, using snapshot offset", options.str("timezone"));
            format_face(&now, options)
        }
        None => format_face(&now, options),
    }
}

/// Format with a user-supplied strftime pattern, rejecting bad specifiers
fn format_pattern<T>(now: &DateTime<T>, key: &str, pattern: &str) -> Result<String, ConfigError>
where
    T: chrono::TimeZone,
    T::Offset: std::fmt::Display,
{
    let invalid = || ConfigError::InvalidOption {
        key: key.to_string(),
        reason: format!("'{}' is not a valid strftime pattern", pattern),
    };
    let items: Vec<Item> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }
    let mut out = String::new();
    write!(out, "{}", now.format_with_items(items.iter())).map_err(|_| invalid())?;
    Ok(out)
}

fn format_face<T>(now: &DateTime<T>, options: &Options) -> Result<ClockFace, ConfigError>
where
    T: chrono::TimeZone,
    T::Offset: std::fmt::Display,
{
    let seconds = options.bool_or("show_seconds", false);
    let twelve_hour = options.str_or("time_format", "24h").eq_ignore_ascii_case("12h");

    let pattern = match (twelve_hour, seconds) {
        (false, false) => "%H:%M",
        (false, true) => "%H:%M:%S",
        (true, false) => "%-I:%M",
        (true, true) => "%-I:%M:%S",
    };
    let date = if options.bool_or("show_date", true) {
        let date_format = options.str_or("date_format", DEFAULT_DATE_FORMAT);
        Some(format_pattern(now, "date_format", date_format)?)
    } else {
        None
    };

    Ok(ClockFace {
        time: now.format(pattern).to_string(),
        meridiem: twelve_hour.then(|| now.format("%p").to_string()),
        date,
    })
}

pub struct ClockWidget;

impl WidgetRenderer for ClockWidget {
    fn kind(&self) -> WidgetKind {
        WidgetKind::Clock
    }

    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new(vec![
            ConfigOption::new("show_seconds", "boolean", json!(false), "Include seconds"),
            ConfigOption::new("show_date", "boolean", json!(true), "Date line below the time"),
            ConfigOption::new("time_format", "string", json!("24h"), "24h or 12h"),
            ConfigOption::new("timezone", "string", json!(null), "IANA zone, defaults to the snapshot offset"),
            ConfigOption::new("date_format", "string", json!(DEFAULT_DATE_FORMAT), "strftime pattern for the date"),
        ])
    }

    fn draw(&self, cr: &Context, ctx: &WidgetContext) -> Result<(), RenderError> {
        let face = clock_face(ctx.snapshots.now, ctx.options())?;
        let theme = ctx.theme;
        let (w, h) = (ctx.width, ctx.height);
        let color = ctx.color_or("color", theme.text_primary);

        let time_share = if face.date.is_some() { 0.5 } else { 0.7 };
        let base = font(theme, FontRole::Huge, w, h).bold();
        let size = fit_font_size(cr, &face.time, &base, w * 0.78, h * time_share, base.size);
        let time_font = base.sized(size);

        let time_cy = if face.date.is_some() { h * 0.42 } else { h / 2.0 };
        let time_extents = text_extents(cr, &face.time, &time_font);
        let meridiem_font = time_font.sized((size * 0.35).max(6.0));
        let meridiem_width = face
            .meridiem
            .as_deref()
            .map(|m| text_extents(cr, m, &meridiem_font).width + 3.0)
            .unwrap_or(0.0);

        let left = (w - time_extents.width - meridiem_width) / 2.0;
        draw_text(cr, &face.time, &time_font, color, left, time_cy, HAlign::Left, VAlign::Middle)?;
        if let Some(meridiem) = &face.meridiem {
            draw_text(
                cr,
                meridiem,
                &meridiem_font,
                theme.text_secondary,
                left + time_extents.width + 3.0,
                time_cy + time_extents.height / 2.0 - time_extents.height * 0.15,
                HAlign::Left,
                VAlign::Bottom,
            )?;
        }

        if let Some(date) = &face.date {
            let date_font = font(theme, FontRole::Medium, w, h);
            let date_size = fit_font_size(cr, date, &date_font, w * 0.9, h * 0.2, date_font.size);
            draw_text(
                cr,
                date,
                &date_font.sized(date_size),
                theme.text_secondary,
                w / 2.0,
                h * 0.76,
                HAlign::Center,
                VAlign::Middle,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn seven_oh_five() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 7, 5, 0)
            .unwrap()
    }

    #[test]
    fn test_24h_without_seconds() {
        let opts = Options::new()
            .with("show_seconds", false)
            .with("show_date", true)
            .with("time_format", "24h");
        let face = clock_face(seven_oh_five(), &opts).unwrap();
        assert_eq!(face.time, "07:05");
        assert_eq!(face.meridiem, None);
        assert_eq!(face.date.as_deref(), Some("Mon 01 Jan"));
    }

    #[test]
    fn test_24h_with_seconds() {
        let opts = Options::new()
            .with("show_seconds", true)
            .with("show_date", true)
            .with("time_format", "24h");
        assert_eq!(clock_face(seven_oh_five(), &opts).unwrap().time, "07:05:00");
    }

    #[test]
    fn test_12h_and_no_date() {
        let opts = Options::new().with("time_format", "12h").with("show_date", false);
        let face = clock_face(seven_oh_five(), &opts).unwrap();
        assert_eq!(face.time, "7:05");
        assert_eq!(face.meridiem.as_deref(), Some("AM"));
        assert_eq!(face.date, None);
    }

    #[test]
    fn test_timezone_option() {
        let opts = Options::new().with("timezone", "Asia/Tokyo").with("show_date", false);
        assert_eq!(clock_face(seven_oh_five(), &opts).unwrap().time, "16:05");

        let bogus = Options::new().with("timezone", "Mars/Olympus");
        assert_eq!(clock_face(seven_oh_five(), &bogus).unwrap().time, "07:05");
    }

    #[test]
    fn test_date_format() {
        let opts = Options::new().with("date_format", "%Y-%m-%d");
        let face = clock_face(seven_oh_five(), &opts).unwrap();
        assert_eq!(face.date.as_deref(), Some("2024-01-01"));

        let broken = Options::new().with("date_format", "%a %Q");
        assert!(matches!(
            clock_face(seven_oh_five(), &broken),
            Err(ConfigError::InvalidOption { key, .. }) if key == "date_format"
        ));

        // Never formatted when the date line is off
        let hidden = broken.with("show_date", false);
        assert!(clock_face(seven_oh_five(), &hidden).is_ok());
    }
}
