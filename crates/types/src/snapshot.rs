//! Point-in-time entity values handed to widgets for one render pass.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// States that mean "no data" regardless of entity domain
pub const UNAVAILABLE_STATES: [&str; 2] = ["unavailable", "unknown"];

/// Current state of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Encoded still image (JPEG or PNG), only filled for camera-like entities
    #[serde(skip)]
    pub image: Option<Arc<Vec<u8>>>,
}

impl EntityState {
    pub fn new(entity_id: &str, state: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            state: state.to_string(),
            unit: None,
            attributes: Map::new(),
            image: None,
        }
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    pub fn with_attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn with_image(mut self, encoded: Vec<u8>) -> Self {
        self.image = Some(Arc::new(encoded));
        self
    }

    pub fn is_available(&self) -> bool {
        let state = self.state.trim();
        !state.is_empty()
            && !UNAVAILABLE_STATES
                .iter()
                .any(|s| state.eq_ignore_ascii_case(s))
    }

    /// State parsed as a number, if it is one
    pub fn numeric(&self) -> Option<f64> {
        self.state.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn attribute_f64(&self, key: &str) -> Option<f64> {
        match self.attributes.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attribute_str("friendly_name")
    }

    /// Unit from the state, falling back to the `unit_of_measurement` attribute
    pub fn unit(&self) -> Option<&str> {
        self.unit
            .as_deref()
            .or_else(|| self.attribute_str("unit_of_measurement"))
    }
}

/// One sample of a history series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl HistoryPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Every value a screen needs for one render pass, resolved up front.
///
/// `now` is the declared current time. Widgets that show time read it from
/// here, never from the system clock, so a pass can be replayed exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSet {
    pub now: DateTime<FixedOffset>,
    states: BTreeMap<String, EntityState>,
    histories: BTreeMap<(String, u32), Vec<HistoryPoint>>,
}

impl SnapshotSet {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now,
            states: BTreeMap::new(),
            histories: BTreeMap::new(),
        }
    }

    pub fn insert_state(&mut self, state: EntityState) {
        self.states.insert(state.entity_id.clone(), state);
    }

    pub fn with_state(mut self, state: EntityState) -> Self {
        self.insert_state(state);
        self
    }

    /// Store a series, sorted by timestamp
    pub fn insert_history(&mut self, entity_id: &str, hours: u32, mut points: Vec<HistoryPoint>) {
        points.sort_by_key(|p| p.timestamp);
        self.histories.insert((entity_id.to_string(), hours), points);
    }

    pub fn with_history(mut self, entity_id: &str, hours: u32, points: Vec<HistoryPoint>) -> Self {
        self.insert_history(entity_id, hours, points);
        self
    }

    /// Raw state, whether or not it is available
    pub fn state(&self, entity_id: &str) -> Option<&EntityState> {
        self.states.get(entity_id)
    }

    /// State only if present and not unavailable/unknown
    pub fn available(&self, entity_id: &str) -> Option<&EntityState> {
        self.states.get(entity_id).filter(|s| s.is_available())
    }

    pub fn history(&self, entity_id: &str, hours: u32) -> Option<&[HistoryPoint]> {
        self.histories
            .get(&(entity_id.to_string(), hours))
            .map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_availability() {
        assert!(EntityState::new("sensor.a", "21.5").is_available());
        assert!(!EntityState::new("sensor.a", "unavailable").is_available());
        assert!(!EntityState::new("sensor.a", "Unknown").is_available());
        assert!(!EntityState::new("sensor.a", "").is_available());
    }

    #[test]
    fn test_unit_fallback_and_numeric() {
        let s = EntityState::new("sensor.t", "21.5").with_attribute("unit_of_measurement", "°C");
        assert_eq!(s.unit(), Some("°C"));
        assert_eq!(s.numeric(), Some(21.5));
        assert_eq!(EntityState::new("light.x", "on").numeric(), None);
    }

    #[test]
    fn test_history_sorted_on_insert() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let earlier = Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap();
        let set = SnapshotSet::new(now.fixed_offset()).with_history(
            "sensor.t",
            24,
            vec![HistoryPoint::new(now, 2.0), HistoryPoint::new(earlier, 1.0)],
        );
        let series = set.history("sensor.t", 24).unwrap();
        assert_eq!(series[0].value, 1.0);
        assert!(set.history("sensor.t", 12).is_none());
    }
}
