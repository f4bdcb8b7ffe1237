//! Layout kinds and the option keys they understand.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::options::Options;

pub const DEFAULT_HERO_RATIO: f64 = 0.7;
pub const HERO_RATIO_MIN: f64 = 0.5;
pub const HERO_RATIO_MAX: f64 = 0.8;
pub const DEFAULT_FOOTER_SLOTS: u32 = 3;
pub const MAX_FOOTER_SLOTS: u32 = 6;
pub const DEFAULT_SPLIT_RATIO: f64 = 0.5;
pub const SPLIT_RATIO_MIN: f64 = 0.2;
pub const SPLIT_RATIO_MAX: f64 = 0.8;

/// Named partitioning schemes for a screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutType {
    /// 2 rows x 2 columns
    Grid2x2,
    /// 2 rows x 3 columns
    Grid2x3,
    /// 3 rows x 2 columns
    Grid3x2,
    /// 3 rows x 3 columns
    Grid3x3,
    /// Full-width hero on top, a row of footer slots below
    Hero,
    /// Two halves, side by side or stacked
    Split,
    /// Three columns with configurable ratios
    ThreeColumn,
}

impl LayoutType {
    pub const ALL: [LayoutType; 7] = [
        LayoutType::Grid2x2,
        LayoutType::Grid2x3,
        LayoutType::Grid3x2,
        LayoutType::Grid3x3,
        LayoutType::Hero,
        LayoutType::Split,
        LayoutType::ThreeColumn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutType::Grid2x2 => "grid_2x2",
            LayoutType::Grid2x3 => "grid_2x3",
            LayoutType::Grid3x2 => "grid_3x2",
            LayoutType::Grid3x3 => "grid_3x3",
            LayoutType::Hero => "hero",
            LayoutType::Split => "split",
            LayoutType::ThreeColumn => "three_column",
        }
    }

    /// Grid dimensions as (rows, columns), for grid layouts only
    pub fn grid_dimensions(&self) -> Option<(u32, u32)> {
        match self {
            LayoutType::Grid2x2 => Some((2, 2)),
            LayoutType::Grid2x3 => Some((2, 3)),
            LayoutType::Grid3x2 => Some((3, 2)),
            LayoutType::Grid3x3 => Some((3, 3)),
            _ => None,
        }
    }

    /// Number of slots this layout produces with the given options
    pub fn slot_count(&self, options: &Options) -> usize {
        match self {
            LayoutType::Hero => 1 + footer_slots(options) as usize,
            LayoutType::Split => 2,
            LayoutType::ThreeColumn => 3,
            grid => grid
                .grid_dimensions()
                .map(|(rows, cols)| (rows * cols) as usize)
                .unwrap_or(0),
        }
    }
}

/// `footer_slots` option of the hero layout, clamped to a drawable range
pub fn footer_slots(options: &Options) -> u32 {
    options
        .u32_or("footer_slots", DEFAULT_FOOTER_SLOTS)
        .clamp(1, MAX_FOOTER_SLOTS)
}

impl fmt::Display for LayoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a layout name is not recognized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLayout(pub String);

impl fmt::Display for UnknownLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown layout '{}'", self.0)
    }
}

impl std::error::Error for UnknownLayout {}

impl FromStr for LayoutType {
    type Err = UnknownLayout;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        LayoutType::ALL
            .into_iter()
            .find(|layout| layout.as_str() == normalized)
            .ok_or_else(|| UnknownLayout(s.to_string()))
    }
}

/// Orientation of the split layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitOrientation {
    /// Left | right
    #[default]
    Vertical,
    /// Top / bottom
    Horizontal,
}

impl SplitOrientation {
    pub fn from_options(options: &Options) -> Self {
        match options.str("orientation") {
            Some(s) if s.eq_ignore_ascii_case("horizontal") => SplitOrientation::Horizontal,
            _ => SplitOrientation::Vertical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("grid_2x2".parse::<LayoutType>(), Ok(LayoutType::Grid2x2));
        assert_eq!("Three-Column".parse::<LayoutType>(), Ok(LayoutType::ThreeColumn));
        assert!("mosaic".parse::<LayoutType>().is_err());
        for layout in LayoutType::ALL {
            assert_eq!(layout.as_str().parse::<LayoutType>(), Ok(layout));
        }
    }

    #[test]
    fn test_slot_counts() {
        let none = Options::new();
        assert_eq!(LayoutType::Grid2x2.slot_count(&none), 4);
        assert_eq!(LayoutType::Grid2x3.slot_count(&none), 6);
        assert_eq!(LayoutType::Grid3x3.slot_count(&none), 9);
        assert_eq!(LayoutType::Hero.slot_count(&none), 4);
        assert_eq!(LayoutType::Split.slot_count(&none), 2);
        assert_eq!(
            LayoutType::Hero.slot_count(&Options::new().with("footer_slots", 20)),
            1 + MAX_FOOTER_SLOTS as usize
        );
    }
}
