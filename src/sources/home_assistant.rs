//! Home Assistant REST API value source

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tinydash_core::{Bitmap, ValueResolver};
use tinydash_types::{EntityState, HistoryPoint};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// State object as returned by `/api/states/{entity_id}`
#[derive(Debug, Deserialize)]
struct ApiState {
    entity_id: String,
    state: String,
    #[serde(default)]
    attributes: Map<String, Value>,
}

/// Entry of `/api/history/period` with `minimal_response`
#[derive(Debug, Deserialize)]
struct ApiHistoryEntry {
    state: String,
    last_changed: DateTime<Utc>,
}

impl From<ApiState> for EntityState {
    fn from(api: ApiState) -> Self {
        let unit = api
            .attributes
            .get("unit_of_measurement")
            .and_then(Value::as_str)
            .map(str::to_string);
        EntityState {
            entity_id: api.entity_id,
            state: api.state,
            unit,
            attributes: api.attributes,
            image: None,
        }
    }
}

/// Numeric samples from a history response, unparsable states skipped
fn history_points(entries: Vec<ApiHistoryEntry>) -> Vec<HistoryPoint> {
    entries
        .into_iter()
        .filter_map(|e| {
            let value = e.state.trim().parse::<f64>().ok()?;
            value.is_finite().then(|| HistoryPoint::new(e.last_changed, value))
        })
        .collect()
}

pub struct HomeAssistantResolver {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HomeAssistantResolver {
    pub fn new(base_url: &str, token: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        })
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?
            .error_for_status()
    }

    async fn camera_still(&self, entity_id: &str) -> Option<Vec<u8>> {
        let response = self
            .get(&format!("/api/camera_proxy/{}", entity_id), &[])
            .await
            .map_err(|e| log::debug!("Camera still for {} failed: {}", entity_id, e))
            .ok()?;
        let body = response.bytes().await.ok()?;
        match Bitmap::sniff_format(&body) {
            Some(format) => {
                log::trace!("Camera {}: {:?} still, {} bytes", entity_id, format, body.len());
                Some(body.to_vec())
            }
            None => {
                log::debug!("Camera {} returned neither JPEG nor PNG, skipping image", entity_id);
                None
            }
        }
    }
}

#[async_trait]
impl ValueResolver for HomeAssistantResolver {
    fn name(&self) -> &str {
        "home_assistant"
    }

    async fn resolve(&self, entity_id: &str) -> Option<EntityState> {
        let response = match self.get(&format!("/api/states/{}", entity_id), &[]).await {
            Ok(r) => r,
            Err(e) => {
                log::debug!("State for {} unavailable: {}", entity_id, e);
                return None;
            }
        };
        let mut state: EntityState = match response.json::<ApiState>().await {
            Ok(api) => api.into(),
            Err(e) => {
                log::warn!("Malformed state for {}: {}", entity_id, e);
                return None;
            }
        };
        if entity_id.starts_with("camera.") && state.is_available() {
            if let Some(still) = self.camera_still(entity_id).await {
                state = state.with_image(still);
            }
        }
        Some(state)
    }

    async fn resolve_history(&self, entity_id: &str, hours: u32) -> Option<Vec<HistoryPoint>> {
        let start = (Utc::now() - ChronoDuration::hours(hours as i64))
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let response = self
            .get(
                &format!("/api/history/period/{}", start),
                &[
                    ("filter_entity_id", entity_id),
                    ("minimal_response", ""),
                    ("no_attributes", ""),
                ],
            )
            .await
            .map_err(|e| log::debug!("History for {} unavailable: {}", entity_id, e))
            .ok()?;
        let series: Vec<Vec<ApiHistoryEntry>> = response
            .json()
            .await
            .map_err(|e| log::warn!("Malformed history for {}: {}", entity_id, e))
            .ok()?;
        Some(history_points(series.into_iter().next().unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_conversion_takes_unit_from_attributes() {
        let api: ApiState = serde_json::from_str(
            r#"{"entity_id": "sensor.power", "state": "512",
                "attributes": {"unit_of_measurement": "W", "friendly_name": "Power"},
                "last_changed": "2024-01-01T00:00:00+00:00"}"#,
        )
        .unwrap();
        let state: EntityState = api.into();
        assert_eq!(state.unit.as_deref(), Some("W"));
        assert_eq!(state.friendly_name(), Some("Power"));
        assert_eq!(state.numeric(), Some(512.0));
    }

    #[test]
    fn test_history_skips_non_numeric_states() {
        let entries: Vec<ApiHistoryEntry> = serde_json::from_str(
            r#"[{"state": "20.5", "last_changed": "2024-01-01T00:00:00+00:00"},
                {"state": "unavailable", "last_changed": "2024-01-01T01:00:00+00:00"},
                {"state": "21", "last_changed": "2024-01-01T02:00:00+00:00"}]"#,
        )
        .unwrap();
        let values: Vec<_> = history_points(entries).iter().map(|p| p.value).collect();
        assert_eq!(values, vec![20.5, 21.0]);
    }

    #[test]
    fn test_base_url_trimmed() {
        let resolver = HomeAssistantResolver::new("http://ha.local:8123/", "token").unwrap();
        assert_eq!(resolver.base_url, "http://ha.local:8123");
    }
}
