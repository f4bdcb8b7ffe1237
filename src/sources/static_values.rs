//! Value source backed by a snapshot file.
//!
//! Used for offline renders, demos and tests. The file looks like:
//!
//! ```json
//! {
//!   "now": "2024-01-01T07:05:00+01:00",
//!   "states": [{"entity_id": "sensor.cpu", "state": "42", "unit": "%"}],
//!   "history": {"sensor.cpu": [{"timestamp": "2024-01-01T05:00:00Z", "value": 40.0}]},
//!   "images": {"camera.door": "door.jpg"}
//! }
//! ```
//!
//! Image paths (JPEG or PNG) are relative to the snapshot file.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tinydash_core::ValueResolver;
use tinydash_types::{EntityState, HistoryPoint};

/// On-disk snapshot format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    /// Time to render at, defaults to the current time
    #[serde(default)]
    pub now: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub states: Vec<EntityState>,
    #[serde(default)]
    pub history: BTreeMap<String, Vec<HistoryPoint>>,
    #[serde(default)]
    pub images: BTreeMap<String, PathBuf>,
}

/// Serves fixed states and series from memory
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    now: Option<DateTime<FixedOffset>>,
    states: BTreeMap<String, EntityState>,
    history: BTreeMap<String, Vec<HistoryPoint>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, state: EntityState) -> Self {
        self.states.insert(state.entity_id.clone(), state);
        self
    }

    pub fn with_history(mut self, entity_id: &str, mut points: Vec<HistoryPoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        self.history.insert(entity_id.to_string(), points);
        self
    }

    /// Render time declared by the snapshot file, if any
    pub fn now(&self) -> Option<DateTime<FixedOffset>> {
        self.now
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading snapshot file {}", path.display()))?;
        let file: SnapshotFile = serde_json::from_str(&content)
            .with_context(|| format!("parsing snapshot file {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_file(file, base)
    }

    pub fn from_file(file: SnapshotFile, base_dir: &Path) -> Result<Self> {
        let mut resolver = Self {
            now: file.now,
            ..Self::default()
        };
        for state in file.states {
            resolver = resolver.with_state(state);
        }
        for (entity_id, points) in file.history {
            resolver = resolver.with_history(&entity_id, points);
        }
        for (entity_id, image) in file.images {
            let path = base_dir.join(&image);
            let still = std::fs::read(&path)
                .with_context(|| format!("reading image for {} from {}", entity_id, path.display()))?;
            let state = resolver
                .states
                .remove(&entity_id)
                .unwrap_or_else(|| EntityState::new(&entity_id, "idle"));
            resolver = resolver.with_state(state.with_image(still));
        }
        log::info!(
            "Loaded {} states and {} history series",
            resolver.states.len(),
            resolver.history.len()
        );
        Ok(resolver)
    }
}

#[async_trait]
impl ValueResolver for StaticResolver {
    fn name(&self) -> &str {
        "static"
    }

    async fn resolve(&self, entity_id: &str) -> Option<EntityState> {
        self.states.get(entity_id).cloned()
    }

    /// Points within `hours` of the newest sample (or of `now` when set)
    async fn resolve_history(&self, entity_id: &str, hours: u32) -> Option<Vec<HistoryPoint>> {
        let points = self.history.get(entity_id)?;
        let newest = match self.now {
            Some(now) => now.to_utc(),
            None => points.last()?.timestamp,
        };
        let since = newest - ChronoDuration::hours(hours as i64);
        Some(
            points
                .iter()
                .filter(|p| p.timestamp >= since && p.timestamp <= newest)
                .copied()
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_history_window() {
        let at = |h| HistoryPoint::new(Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap(), h as f64);
        let resolver = StaticResolver::new().with_history("sensor.t", vec![at(10), at(2), at(6)]);
        let points = resolver.resolve_history("sensor.t", 5).await.unwrap();
        let values: Vec<_> = points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![6.0, 10.0]);
        assert!(resolver.resolve_history("sensor.none", 5).await.is_none());
    }

    #[tokio::test]
    async fn test_parse_snapshot_file() {
        let file: SnapshotFile = serde_json::from_str(
            r#"{
                "now": "2024-01-01T07:05:00+01:00",
                "states": [{"entity_id": "sensor.cpu", "state": "42", "unit": "%"}],
                "history": {"sensor.cpu": [{"timestamp": "2024-01-01T05:00:00Z", "value": 40.0}]}
            }"#,
        )
        .unwrap();
        let resolver = StaticResolver::from_file(file, Path::new(".")).unwrap();
        assert_eq!(resolver.now().map(|n| n.to_rfc3339()), Some("2024-01-01T07:05:00+01:00".to_string()));
        let cpu = resolver.resolve("sensor.cpu").await.unwrap();
        assert_eq!(cpu.unit.as_deref(), Some("%"));
        assert_eq!(resolver.resolve_history("sensor.cpu", 24).await.map(|h| h.len()), Some(1));
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let mut file = SnapshotFile::default();
        file.images.insert("camera.door".into(), PathBuf::from("does-not-exist.png"));
        assert!(StaticResolver::from_file(file, Path::new("/nonexistent")).is_err());
    }
}
