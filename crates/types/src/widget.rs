//! Widget kinds

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of widget kinds a slot can host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    Clock,
    Entity,
    Media,
    Chart,
    Text,
    Gauge,
    Progress,
    MultiProgress,
    Weather,
    Status,
    StatusList,
    Camera,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 12] = [
        WidgetKind::Clock,
        WidgetKind::Entity,
        WidgetKind::Media,
        WidgetKind::Chart,
        WidgetKind::Text,
        WidgetKind::Gauge,
        WidgetKind::Progress,
        WidgetKind::MultiProgress,
        WidgetKind::Weather,
        WidgetKind::Status,
        WidgetKind::StatusList,
        WidgetKind::Camera,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Clock => "clock",
            WidgetKind::Entity => "entity",
            WidgetKind::Media => "media",
            WidgetKind::Chart => "chart",
            WidgetKind::Text => "text",
            WidgetKind::Gauge => "gauge",
            WidgetKind::Progress => "progress",
            WidgetKind::MultiProgress => "multi_progress",
            WidgetKind::Weather => "weather",
            WidgetKind::Status => "status",
            WidgetKind::StatusList => "status_list",
            WidgetKind::Camera => "camera",
        }
    }

    /// Whether a slot of this kind needs entity data to draw anything useful
    pub fn requires_entity(&self) -> bool {
        !matches!(self, WidgetKind::Clock | WidgetKind::Text)
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownWidget(pub String);

impl fmt::Display for UnknownWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown widget type '{}'", self.0)
    }
}

impl std::error::Error for UnknownWidget {}

impl FromStr for WidgetKind {
    type Err = UnknownWidget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        WidgetKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| UnknownWidget(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_requirement() {
        let free: Vec<_> = WidgetKind::ALL
            .into_iter()
            .filter(|k| !k.requires_entity())
            .collect();
        assert_eq!(free, vec![WidgetKind::Clock, WidgetKind::Text]);
    }

    #[test]
    fn test_round_trip_names() {
        for kind in WidgetKind::ALL {
            assert_eq!(kind.as_str().parse::<WidgetKind>(), Ok(kind));
        }
        assert_eq!("status-list".parse::<WidgetKind>(), Ok(WidgetKind::StatusList));
        assert!("sparkles".parse::<WidgetKind>().is_err());
    }
}
