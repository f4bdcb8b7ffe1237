//! Theme palettes.
//!
//! A theme fixes every color a widget may use plus the panel style, so
//! widgets never pick raw colors themselves except from their own options.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::color::Color;

/// Built-in theme identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeKind {
    #[default]
    Classic,
    Minimal,
    Neon,
    Retro,
    Soft,
    Light,
    Ocean,
    Sunset,
    Forest,
    Candy,
}

impl ThemeKind {
    pub const ALL: [ThemeKind; 10] = [
        ThemeKind::Classic,
        ThemeKind::Minimal,
        ThemeKind::Neon,
        ThemeKind::Retro,
        ThemeKind::Soft,
        ThemeKind::Light,
        ThemeKind::Ocean,
        ThemeKind::Sunset,
        ThemeKind::Forest,
        ThemeKind::Candy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeKind::Classic => "classic",
            ThemeKind::Minimal => "minimal",
            ThemeKind::Neon => "neon",
            ThemeKind::Retro => "retro",
            ThemeKind::Soft => "soft",
            ThemeKind::Light => "light",
            ThemeKind::Ocean => "ocean",
            ThemeKind::Sunset => "sunset",
            ThemeKind::Forest => "forest",
            ThemeKind::Candy => "candy",
        }
    }
}

impl fmt::Display for ThemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        ThemeKind::ALL
            .into_iter()
            .find(|t| t.as_str() == name)
            .ok_or_else(|| format!("unknown theme '{}'", s))
    }
}

/// Panel drawn behind widgets that ask for one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelStyle {
    pub fill: Color,
    pub border: Option<Color>,
    pub border_width: f64,
    pub corner_radius: f64,
}

/// Fully resolved theme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub kind: ThemeKind,
    pub background: Color,
    pub panel: PanelStyle,
    /// Whether widgets get a panel unless their `show_panel` option says otherwise
    pub panels_by_default: bool,
    pub text_primary: Color,
    pub text_secondary: Color,
    /// Track color behind bars, rings and arcs
    pub track: Color,
    pub placeholder: Color,
    pub on_color: Color,
    pub off_color: Color,
    pub accents: Vec<Color>,
    /// Frame drawn around the whole canvas after all slots
    pub canvas_border: Option<Color>,
    /// Pixels each slot is inset by when drawn
    pub slot_gap: f64,
    pub font_family: String,
}

impl Theme {
    /// Accent for a slot, cycling through the palette
    pub fn accent(&self, slot_index: usize) -> Color {
        if self.accents.is_empty() {
            return self.text_primary;
        }
        self.accents[slot_index % self.accents.len()]
    }

    pub fn for_kind(kind: ThemeKind) -> Self {
        let rgb = Color::from_rgb8;
        let base = Theme {
            kind,
            background: Color::BLACK,
            panel: PanelStyle {
                fill: rgb(18, 18, 18),
                border: Some(rgb(40, 40, 40)),
                border_width: 1.0,
                corner_radius: 8.0,
            },
            panels_by_default: true,
            text_primary: Color::WHITE,
            text_secondary: rgb(128, 128, 128),
            track: rgb(50, 50, 50),
            placeholder: rgb(90, 90, 90),
            on_color: rgb(0, 255, 0),
            off_color: rgb(255, 0, 0),
            accents: vec![
                rgb(0, 255, 255),
                rgb(168, 85, 247),
                rgb(251, 146, 60),
                rgb(96, 165, 250),
                rgb(244, 114, 182),
                rgb(255, 215, 0),
            ],
            canvas_border: None,
            slot_gap: 4.0,
            font_family: "Sans".to_string(),
        };

        match kind {
            ThemeKind::Classic => base,
            ThemeKind::Minimal => Theme {
                panel: PanelStyle {
                    fill: Color::BLACK,
                    border: None,
                    border_width: 0.0,
                    corner_radius: 0.0,
                },
                panels_by_default: false,
                accents: vec![Color::WHITE, rgb(170, 170, 170)],
                slot_gap: 6.0,
                ..base
            },
            ThemeKind::Neon => Theme {
                background: rgb(8, 0, 20),
                panel: PanelStyle {
                    fill: rgb(20, 6, 40),
                    border: Some(rgb(255, 0, 255)),
                    border_width: 1.5,
                    corner_radius: 4.0,
                },
                text_secondary: rgb(170, 120, 220),
                track: rgb(45, 20, 70),
                on_color: rgb(57, 255, 20),
                off_color: rgb(255, 20, 147),
                accents: vec![rgb(255, 0, 255), rgb(0, 255, 255), rgb(57, 255, 20)],
                ..base
            },
            ThemeKind::Retro => Theme {
                background: rgb(10, 14, 8),
                panel: PanelStyle {
                    fill: rgb(16, 24, 12),
                    border: Some(rgb(60, 110, 40)),
                    border_width: 1.0,
                    corner_radius: 0.0,
                },
                text_primary: rgb(120, 255, 80),
                text_secondary: rgb(70, 160, 50),
                track: rgb(30, 50, 24),
                accents: vec![rgb(120, 255, 80), rgb(255, 176, 0)],
                font_family: "Monospace".to_string(),
                ..base
            },
            ThemeKind::Soft => Theme {
                background: rgb(30, 30, 36),
                panel: PanelStyle {
                    fill: rgb(44, 44, 54),
                    border: None,
                    border_width: 0.0,
                    corner_radius: 14.0,
                },
                text_secondary: rgb(160, 160, 175),
                track: rgb(64, 64, 78),
                on_color: rgb(134, 239, 172),
                off_color: rgb(252, 165, 165),
                accents: vec![rgb(165, 180, 252), rgb(249, 168, 212), rgb(134, 239, 172)],
                ..base
            },
            ThemeKind::Light => Theme {
                background: rgb(240, 240, 240),
                panel: PanelStyle {
                    fill: Color::WHITE,
                    border: Some(rgb(210, 210, 210)),
                    border_width: 1.0,
                    corner_radius: 8.0,
                },
                text_primary: rgb(20, 20, 20),
                text_secondary: rgb(110, 110, 110),
                track: rgb(220, 220, 220),
                placeholder: rgb(180, 180, 180),
                on_color: rgb(22, 163, 74),
                off_color: rgb(220, 38, 38),
                accents: vec![rgb(37, 99, 235), rgb(234, 88, 12), rgb(147, 51, 234)],
                ..base
            },
            ThemeKind::Ocean => Theme {
                background: rgb(2, 16, 30),
                panel: PanelStyle {
                    fill: rgb(8, 36, 60),
                    border: Some(rgb(20, 70, 110)),
                    border_width: 1.0,
                    corner_radius: 10.0,
                },
                text_secondary: rgb(125, 170, 200),
                track: rgb(18, 56, 86),
                accents: vec![rgb(56, 189, 248), rgb(45, 212, 191), rgb(129, 140, 248)],
                ..base
            },
            ThemeKind::Sunset => Theme {
                background: rgb(28, 10, 18),
                panel: PanelStyle {
                    fill: rgb(48, 18, 30),
                    border: Some(rgb(90, 34, 50)),
                    border_width: 1.0,
                    corner_radius: 10.0,
                },
                text_secondary: rgb(220, 150, 140),
                track: rgb(70, 30, 44),
                accents: vec![rgb(251, 146, 60), rgb(244, 63, 94), rgb(250, 204, 21)],
                ..base
            },
            ThemeKind::Forest => Theme {
                background: rgb(8, 20, 12),
                panel: PanelStyle {
                    fill: rgb(18, 40, 24),
                    border: Some(rgb(34, 70, 44)),
                    border_width: 1.0,
                    corner_radius: 8.0,
                },
                text_secondary: rgb(140, 180, 140),
                track: rgb(30, 60, 38),
                accents: vec![rgb(74, 222, 128), rgb(163, 230, 53), rgb(250, 204, 21)],
                ..base
            },
            ThemeKind::Candy => Theme {
                background: rgb(36, 12, 44),
                panel: PanelStyle {
                    fill: rgb(60, 22, 72),
                    border: Some(rgb(244, 114, 182)),
                    border_width: 1.0,
                    corner_radius: 16.0,
                },
                text_secondary: rgb(230, 170, 220),
                track: rgb(86, 40, 100),
                accents: vec![rgb(244, 114, 182), rgb(192, 132, 252), rgb(103, 232, 249)],
                canvas_border: Some(rgb(244, 114, 182)),
                ..base
            },
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::for_kind(ThemeKind::Classic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_theme_has_accents() {
        for kind in ThemeKind::ALL {
            let theme = Theme::for_kind(kind);
            assert_eq!(theme.kind, kind);
            assert!(!theme.accents.is_empty(), "{} has no accents", kind);
        }
    }

    #[test]
    fn test_accent_cycles() {
        let theme = Theme::for_kind(ThemeKind::Neon);
        assert_eq!(theme.accent(0), theme.accent(3));
        assert_ne!(theme.accent(0), theme.accent(1));
    }

    #[test]
    fn test_parse_theme_names() {
        assert_eq!("Ocean".parse::<ThemeKind>(), Ok(ThemeKind::Ocean));
        assert!("vaporwave".parse::<ThemeKind>().is_err());
    }
}
