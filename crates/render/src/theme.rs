//! Theme engine: theme lookup plus font sizing relative to a slot.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use tinydash_types::{Theme, ThemeKind};

use crate::pango_text::Font;

static THEMES: Lazy<HashMap<ThemeKind, Theme>> = Lazy::new(|| {
    ThemeKind::ALL
        .into_iter()
        .map(|kind| (kind, Theme::for_kind(kind)))
        .collect()
});

/// Relative text sizes widgets ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontRole {
    Tiny,
    Small,
    Regular,
    Medium,
    Large,
    XLarge,
    Huge,
}

impl FontRole {
    /// Size in pixels on a 120 px tall reference slot
    fn base_size(&self) -> f64 {
        match self {
            FontRole::Tiny => 9.0,
            FontRole::Small => 11.0,
            FontRole::Regular => 13.0,
            FontRole::Medium => 16.0,
            FontRole::Large => 22.0,
            FontRole::XLarge => 32.0,
            FontRole::Huge => 46.0,
        }
    }

    pub fn from_name(name: &str) -> Option<FontRole> {
        match name.to_ascii_lowercase().as_str() {
            "tiny" => Some(FontRole::Tiny),
            "small" => Some(FontRole::Small),
            "regular" | "normal" => Some(FontRole::Regular),
            "medium" => Some(FontRole::Medium),
            "large" => Some(FontRole::Large),
            "xlarge" => Some(FontRole::XLarge),
            "huge" => Some(FontRole::Huge),
            _ => None,
        }
    }
}

/// Stateless theme lookup, shared read-only by every device
#[derive(Debug, Clone, Copy, Default)]
pub struct ThemeEngine;

impl ThemeEngine {
    /// Theme for an id, `classic` when the id is unknown
    pub fn theme(&self, id: &str) -> &'static Theme {
        let kind = id.parse::<ThemeKind>().unwrap_or_else(|e| {
            log::warn!("{}, falling back to classic", e);
            ThemeKind::Classic
        });
        self.theme_for(kind)
    }

    pub fn theme_for(&self, kind: ThemeKind) -> &'static Theme {
        // Every kind is inserted when the map is built
        &THEMES[&kind]
    }
}

/// Font for a role, scaled to the slot it is drawn in
pub fn font(theme: &Theme, role: FontRole, slot_width: f64, slot_height: f64) -> Font {
    let scale = (slot_height / 120.0).min(slot_width / 100.0).clamp(0.5, 2.5);
    Font::new(&theme.font_family, (role.base_size() * scale).round().max(6.0))
}
