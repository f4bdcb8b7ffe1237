//! Device, screen and slot configuration.
//!
//! These structures are owned by whatever layer edits the configuration;
//! the rendering pipeline only ever reads them.

use serde::{Deserialize, Serialize};

use crate::options::Options;

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 10;
pub const MIN_INTERVAL_SECS: u64 = 5;
pub const MAX_INTERVAL_SECS: u64 = 300;
pub const MAX_SCREENS: usize = 10;
pub const DEFAULT_BRIGHTNESS: u8 = 70;
pub const DEFAULT_THEME: &str = "classic";
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Container the device expects on its upload endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "dashboard.jpg",
            ImageFormat::Png => "dashboard.png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }
}

/// Pixel dimensions of a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::new(240, 240)
    }
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn default_brightness() -> u8 {
    DEFAULT_BRIGHTNESS
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_layout() -> String {
    "grid_2x2".to_string()
}

/// One physical display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Host name or IP (optionally with port) of the device
    pub address: String,
    /// Friendly name, defaults to the address
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default = "default_brightness")]
    pub brightness: u8,
    /// Seconds between refreshes of the current screen
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
    /// Seconds between automatic screen advances, 0 disables cycling
    #[serde(default)]
    pub screen_cycle_interval: u64,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default)]
    pub image_format: ImageFormat,
    /// 1-100, only used for JPEG uploads
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default)]
    pub screens: Vec<ScreenConfig>,
}

impl DeviceConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
            resolution: Resolution::default(),
            brightness: DEFAULT_BRIGHTNESS,
            refresh_interval: DEFAULT_REFRESH_INTERVAL_SECS,
            screen_cycle_interval: 0,
            theme: default_theme(),
            image_format: ImageFormat::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            screens: Vec::new(),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }

    /// Return a copy with every field pulled into its legal range.
    ///
    /// Brightness is clamped to 0-100, JPEG quality to 1-100, the refresh interval to 5-300 s, the
    /// cycle interval to 0 or 5-300 s and the screen list to 1-10 entries
    /// (an empty list becomes a single clock screen). Duplicate slot indices
    /// keep their first occurrence.
    pub fn validated(&self) -> Self {
        let mut device = self.clone();
        device.brightness = device.brightness.min(100);
        device.jpeg_quality = device.jpeg_quality.clamp(1, 100);
        device.refresh_interval = device
            .refresh_interval
            .clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS);
        if device.screen_cycle_interval != 0 {
            device.screen_cycle_interval = device
                .screen_cycle_interval
                .clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS);
        }
        if device.screens.len() > MAX_SCREENS {
            log::warn!(
                "Device {} has {} screens, keeping the first {}",
                device.address,
                device.screens.len(),
                MAX_SCREENS
            );
            device.screens.truncate(MAX_SCREENS);
        }
        if device.screens.is_empty() {
            device.screens.push(ScreenConfig::default_clock());
        }
        for screen in &mut device.screens {
            screen.dedup_slots();
        }
        if device.resolution.width == 0 || device.resolution.height == 0 {
            device.resolution = Resolution::default();
        }
        device
    }
}

/// A named set of slots under one layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenConfig {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    /// Layout name, kept as text so unknown names can fall back at render time
    #[serde(default = "default_layout")]
    pub layout: String,
    #[serde(default)]
    pub layout_options: Options,
    /// Overrides the device theme for this screen
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub slots: Vec<SlotConfig>,
}

impl ScreenConfig {
    pub fn new(name: impl Into<String>, layout: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            layout: layout.into(),
            layout_options: Options::new(),
            theme: None,
            slots: Vec::new(),
        }
    }

    pub fn with_slot(mut self, slot: SlotConfig) -> Self {
        self.slots.push(slot);
        self
    }

    /// Screen used when a device has none configured
    pub fn default_clock() -> Self {
        Self::new("Clock", "split")
            .with_layout_option("orientation", "horizontal")
            .with_slot(SlotConfig::new(0, "clock"))
    }

    pub fn with_layout_option(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.layout_options.insert(key, value);
        self
    }

    fn dedup_slots(&mut self) {
        let mut seen = std::collections::BTreeSet::new();
        let name = &self.name;
        self.slots.retain(|slot| {
            let fresh = seen.insert(slot.index);
            if !fresh {
                log::warn!("Screen '{}' repeats slot {}, ignoring duplicate", name, slot.index);
            }
            fresh
        });
    }
}

/// One positioned widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotConfig {
    #[serde(alias = "slot")]
    pub index: usize,
    /// Widget kind name, `None` or empty leaves the slot blank
    #[serde(default, alias = "type")]
    pub widget_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub options: Options,
}

impl SlotConfig {
    pub fn new(index: usize, widget_type: &str) -> Self {
        Self {
            index,
            widget_type: Some(widget_type.to_string()),
            entity_id: None,
            label: None,
            options: Options::new(),
        }
    }

    pub fn entity(mut self, entity_id: &str) -> Self {
        self.entity_id = Some(entity_id.to_string());
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn option(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key, value);
        self
    }

    /// Widget type with blank strings treated as "no widget"
    pub fn widget_name(&self) -> Option<&str> {
        self.widget_type
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validated_clamps_ranges() {
        let mut device = DeviceConfig::new("192.168.1.50");
        device.brightness = 180;
        device.refresh_interval = 1;
        device.screen_cycle_interval = 900;
        let device = device.validated();

        assert_eq!(device.brightness, 100);
        assert_eq!(device.jpeg_quality, DEFAULT_JPEG_QUALITY);
        assert_eq!(device.refresh_interval, MIN_INTERVAL_SECS);
        assert_eq!(device.screen_cycle_interval, MAX_INTERVAL_SECS);
        assert_eq!(device.screens.len(), 1);
    }

    #[test]
    fn test_cycle_zero_stays_disabled() {
        let device = DeviceConfig::new("display.local").validated();
        assert_eq!(device.screen_cycle_interval, 0);
    }

    #[test]
    fn test_screen_limit_and_duplicate_slots() {
        let mut device = DeviceConfig::new("display.local");
        for i in 0..14 {
            device.screens.push(
                ScreenConfig::new(format!("s{}", i), "grid_2x2")
                    .with_slot(SlotConfig::new(0, "clock"))
                    .with_slot(SlotConfig::new(0, "text")),
            );
        }
        let device = device.validated();
        assert_eq!(device.screens.len(), MAX_SCREENS);
        assert_eq!(device.screens[0].slots.len(), 1);
        assert_eq!(device.screens[0].slots[0].widget_name(), Some("clock"));
    }

    #[test]
    fn test_image_format_defaults_to_jpeg() {
        let device: DeviceConfig = serde_json::from_value(json!({"address": "frame.local"})).unwrap();
        assert_eq!(device.image_format, ImageFormat::Jpeg);
        assert_eq!(device.jpeg_quality, DEFAULT_JPEG_QUALITY);

        let device: DeviceConfig = serde_json::from_value(json!({
            "address": "frame.local",
            "image_format": "png",
            "jpeg_quality": 0
        }))
        .unwrap();
        assert_eq!(device.image_format, ImageFormat::Png);
        assert_eq!(device.validated().jpeg_quality, 1);
        assert_eq!(ImageFormat::Png.file_name(), "dashboard.png");
    }

    #[test]
    fn test_slot_aliases_deserialize() {
        let slot: SlotConfig = serde_json::from_value(json!({
            "slot": 2,
            "type": "gauge",
            "entity_id": "sensor.cpu",
            "options": {"style": "ring"}
        }))
        .unwrap();
        assert_eq!(slot.index, 2);
        assert_eq!(slot.widget_name(), Some("gauge"));
        assert_eq!(slot.options.str("style"), Some("ring"));

        let blank: SlotConfig = serde_json::from_value(json!({"index": 1, "widget_type": "  "})).unwrap();
        assert_eq!(blank.widget_name(), None);
    }
}
