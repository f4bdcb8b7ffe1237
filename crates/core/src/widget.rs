//! WidgetRenderer trait and related types

use cairo::Context;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use tinydash_types::{Color, EntityState, Options, SlotConfig, SnapshotSet, Theme, WidgetKind};

use crate::bitmap::Bitmap;
use crate::error::{ConfigError, RenderError};

/// Options every widget understands in addition to its own schema
pub const COMMON_OPTION_KEYS: [&str; 2] = ["color", "show_panel"];

/// Configuration schema entry for a widget option
#[derive(Debug, Clone)]
pub struct ConfigOption {
    /// Option key
    pub key: &'static str,
    /// Description
    pub description: &'static str,
    /// Value type (e.g., "color", "number", "string", "boolean", "list")
    pub value_type: &'static str,
    /// Default value
    pub default: Value,
}

impl ConfigOption {
    pub fn new(key: &'static str, value_type: &'static str, default: Value, description: &'static str) -> Self {
        Self {
            key,
            description,
            value_type,
            default,
        }
    }
}

/// Configuration schema for a widget
#[derive(Debug, Clone, Default)]
pub struct ConfigSchema {
    /// Available configuration options
    pub options: Vec<ConfigOption>,
}

impl ConfigSchema {
    pub fn new(options: Vec<ConfigOption>) -> Self {
        Self { options }
    }

    pub fn knows(&self, key: &str) -> bool {
        COMMON_OPTION_KEYS.contains(&key) || self.options.iter().any(|o| o.key == key)
    }
}

/// Everything a widget reads before a render pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    pub entities: BTreeSet<String>,
    /// (entity id, hours)
    pub histories: BTreeSet<(String, u32)>,
}

impl Dependencies {
    pub fn entity(mut self, entity_id: &str) -> Self {
        self.entities.insert(entity_id.to_string());
        self
    }

    pub fn history(mut self, entity_id: &str, hours: u32) -> Self {
        self.histories.insert((entity_id.to_string(), hours));
        self
    }

    pub fn merge(&mut self, other: Dependencies) {
        self.entities.extend(other.entities);
        self.histories.extend(other.histories);
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.histories.is_empty()
    }
}

/// Read-only view of one slot during a render pass
pub struct WidgetContext<'a> {
    pub slot: &'a SlotConfig,
    /// Position of the slot on its screen, drives accent cycling
    pub slot_index: usize,
    pub width: f64,
    pub height: f64,
    pub snapshots: &'a SnapshotSet,
    pub theme: &'a Theme,
}

impl<'a> WidgetContext<'a> {
    pub fn options(&self) -> &'a Options {
        &self.slot.options
    }

    pub fn entity_id(&self) -> Option<&'a str> {
        self.slot.entity_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Slot accent: the `color` option, else the theme palette
    pub fn accent(&self) -> Color {
        self.slot
            .options
            .color("color")
            .unwrap_or_else(|| self.theme.accent(self.slot_index))
    }

    /// Color option with a fallback
    pub fn color_or(&self, key: &str, fallback: Color) -> Color {
        self.slot.options.color(key).unwrap_or(fallback)
    }

    /// The slot's entity, which must exist and be available
    pub fn primary_state(&self) -> Result<&'a EntityState, RenderError> {
        let entity_id = self
            .entity_id()
            .ok_or_else(|| ConfigError::MissingEntity(self.slot.widget_name().unwrap_or("?").to_string()))?;
        self.snapshots
            .available(entity_id)
            .ok_or_else(|| RenderError::DataUnavailable(entity_id.to_string()))
    }

    /// Label override, then the entity's friendly name, then `fallback`
    pub fn label_or(&self, state: Option<&EntityState>, fallback: &str) -> String {
        self.slot
            .label
            .clone()
            .filter(|l| !l.is_empty())
            .or_else(|| state.and_then(|s| s.friendly_name()).map(str::to_string))
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Why a slot shows a placeholder instead of its widget
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceholderReason {
    DataUnavailable(String),
    Misconfigured(ConfigError),
}

impl fmt::Display for PlaceholderReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceholderReason::DataUnavailable(id) => write!(f, "no data for {}", id),
            PlaceholderReason::Misconfigured(e) => write!(f, "{}", e),
        }
    }
}

/// Outcome of rendering one slot
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetRender {
    Ok(Bitmap),
    Placeholder(PlaceholderReason),
    Error(String),
}

impl WidgetRender {
    /// Classify a widget's own error
    pub fn from_error(error: RenderError) -> Self {
        match error {
            RenderError::DataUnavailable(id) => {
                WidgetRender::Placeholder(PlaceholderReason::DataUnavailable(id))
            }
            RenderError::Config(e) => WidgetRender::Placeholder(PlaceholderReason::Misconfigured(e)),
            other => WidgetRender::Error(other.to_string()),
        }
    }
}

/// Trait for all widget renderers
///
/// A renderer is stateless: everything it draws comes from the
/// [`WidgetContext`]. It draws into a context whose origin is the slot's
/// top-left corner and whose size is `ctx.width` x `ctx.height`.
pub trait WidgetRenderer: Send + Sync {
    /// Widget kind this renderer draws
    fn kind(&self) -> WidgetKind;

    /// Whether the slot must reference entity data
    fn requires_entity(&self) -> bool {
        self.kind().requires_entity()
    }

    /// Options with their documented defaults
    fn config_schema(&self) -> ConfigSchema;

    /// Whether the compositor should draw a themed panel behind this widget
    fn wants_panel(&self) -> bool {
        true
    }

    /// Entities and history series this slot will read
    fn dependencies(&self, slot: &SlotConfig) -> Dependencies {
        match slot.entity_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => Dependencies::default().entity(id),
            None => Dependencies::default(),
        }
    }

    /// Render the widget
    fn draw(&self, cr: &Context, ctx: &WidgetContext) -> Result<(), RenderError>;
}

/// Boxed renderer stored in the registry
pub type BoxedRenderer = Box<dyn WidgetRenderer>;
