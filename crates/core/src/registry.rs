//! Widget registry: maps each widget kind to its renderer.
//!
//! The registry is filled once at startup and only read afterwards. It is
//! also the slot boundary: nothing a renderer does, including panicking,
//! escapes [`WidgetRegistry::render_slot`].

use cairo::Context;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tinydash_types::{SlotConfig, SnapshotSet, Theme, WidgetKind};

use crate::bitmap::Bitmap;
use crate::error::{ConfigError, RenderError};
use crate::widget::{
    BoxedRenderer, Dependencies, PlaceholderReason, WidgetContext, WidgetRender, WidgetRenderer,
};

/// Information about a registered widget
#[derive(Debug, Clone)]
pub struct WidgetInfo {
    pub kind: WidgetKind,
    pub requires_entity: bool,
    pub option_keys: Vec<&'static str>,
}

#[derive(Default)]
pub struct WidgetRegistry {
    renderers: BTreeMap<WidgetKind, BoxedRenderer>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer, replacing any previous one for the same kind
    pub fn register(&mut self, renderer: BoxedRenderer) {
        let kind = renderer.kind();
        if self.renderers.insert(kind, renderer).is_some() {
            log::warn!("Widget renderer for '{}' registered twice", kind);
        }
    }

    pub fn get(&self, kind: WidgetKind) -> Option<&dyn WidgetRenderer> {
        self.renderers.get(&kind).map(|r| r.as_ref())
    }

    pub fn kinds(&self) -> impl Iterator<Item = WidgetKind> + '_ {
        self.renderers.keys().copied()
    }

    pub fn list(&self) -> Vec<WidgetInfo> {
        self.renderers
            .values()
            .map(|r| WidgetInfo {
                kind: r.kind(),
                requires_entity: r.requires_entity(),
                option_keys: r.config_schema().options.iter().map(|o| o.key).collect(),
            })
            .collect()
    }

    /// Resolve a slot's widget name to a registered renderer
    pub fn lookup(&self, name: &str) -> Result<&dyn WidgetRenderer, ConfigError> {
        name.parse::<WidgetKind>()
            .ok()
            .and_then(|kind| self.get(kind))
            .ok_or_else(|| ConfigError::UnknownWidget(name.to_string()))
    }

    /// What a slot will read, empty for blank or unknown widgets
    pub fn dependencies(&self, slot: &SlotConfig) -> Dependencies {
        slot.widget_name()
            .and_then(|name| self.lookup(name).ok())
            .map(|renderer| renderer.dependencies(slot))
            .unwrap_or_default()
    }

    /// Render one slot into its own bitmap.
    ///
    /// Missing configuration or data turns into a placeholder, renderer
    /// failures and panics into an error outcome.
    pub fn render_slot(
        &self,
        slot: &SlotConfig,
        slot_index: usize,
        width: u32,
        height: u32,
        snapshots: &SnapshotSet,
        theme: &Theme,
    ) -> WidgetRender {
        let Some(name) = slot.widget_name() else {
            return WidgetRender::Placeholder(PlaceholderReason::Misconfigured(
                ConfigError::UnknownWidget(String::new()),
            ));
        };
        let renderer = match self.lookup(name) {
            Ok(r) => r,
            Err(e) => return WidgetRender::Placeholder(PlaceholderReason::Misconfigured(e)),
        };

        let schema = renderer.config_schema();
        for key in slot.options.keys().filter(|k| !schema.knows(k)) {
            log::debug!("Slot {} ({}): ignoring unknown option '{}'", slot_index, name, key);
        }

        if renderer.requires_entity() && renderer.dependencies(slot).entities.is_empty() {
            return WidgetRender::Placeholder(PlaceholderReason::Misconfigured(
                ConfigError::MissingEntity(name.to_string()),
            ));
        }

        let ctx = WidgetContext {
            slot,
            slot_index,
            width: width as f64,
            height: height as f64,
            snapshots,
            theme,
        };

        match catch_unwind(AssertUnwindSafe(|| draw_to_bitmap(renderer, &ctx, width, height))) {
            Ok(Ok(bitmap)) => WidgetRender::Ok(bitmap),
            Ok(Err(e)) => WidgetRender::from_error(e),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                WidgetRender::Error(RenderError::Panicked(message).to_string())
            }
        }
    }
}

fn draw_to_bitmap(
    renderer: &dyn WidgetRenderer,
    ctx: &WidgetContext,
    width: u32,
    height: u32,
) -> Result<Bitmap, RenderError> {
    let surface = Bitmap::new_surface(width, height)?;
    {
        let cr = Context::new(&surface)?;
        renderer.draw(&cr, ctx)?;
    }
    Bitmap::from_surface(&surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::{ConfigOption, ConfigSchema};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tinydash_types::EntityState;

    struct Solid;

    impl WidgetRenderer for Solid {
        fn kind(&self) -> WidgetKind {
            WidgetKind::Entity
        }

        fn config_schema(&self) -> ConfigSchema {
            ConfigSchema::new(vec![ConfigOption::new("shade", "number", json!(1.0), "Gray level")])
        }

        fn draw(&self, cr: &Context, ctx: &crate::widget::WidgetContext) -> Result<(), RenderError> {
            ctx.primary_state()?;
            let shade = ctx.options().f64_or("shade", 1.0);
            cr.set_source_rgb(shade, shade, shade);
            cr.paint()?;
            Ok(())
        }
    }

    struct Exploding;

    impl WidgetRenderer for Exploding {
        fn kind(&self) -> WidgetKind {
            WidgetKind::Text
        }

        fn config_schema(&self) -> ConfigSchema {
            ConfigSchema::default()
        }

        fn draw(&self, _cr: &Context, _ctx: &crate::widget::WidgetContext) -> Result<(), RenderError> {
            panic!("boom");
        }
    }

    fn registry() -> WidgetRegistry {
        let mut registry = WidgetRegistry::new();
        registry.register(Box::new(Solid));
        registry.register(Box::new(Exploding));
        registry
    }

    fn snapshots() -> SnapshotSet {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 7, 5, 0).unwrap().fixed_offset();
        SnapshotSet::new(now)
            .with_state(EntityState::new("sensor.ok", "12"))
            .with_state(EntityState::new("sensor.down", "unavailable"))
    }

    #[test]
    fn test_renders_available_entity() {
        let slot = SlotConfig::new(0, "entity").entity("sensor.ok");
        match registry().render_slot(&slot, 0, 10, 10, &snapshots(), &Theme::default()) {
            WidgetRender::Ok(bitmap) => assert_eq!(bitmap.pixel(5, 5), Some((255, 255, 255, 255))),
            other => panic!("expected bitmap, got {:?}", other),
        }
    }

    #[test]
    fn test_unavailable_entity_is_placeholder() {
        let slot = SlotConfig::new(0, "entity").entity("sensor.down");
        let outcome = registry().render_slot(&slot, 0, 10, 10, &snapshots(), &Theme::default());
        assert_eq!(
            outcome,
            WidgetRender::Placeholder(PlaceholderReason::DataUnavailable("sensor.down".into()))
        );
    }

    #[test]
    fn test_missing_entity_and_unknown_widget_are_placeholders() {
        let r = registry();
        let theme = Theme::default();
        let missing = r.render_slot(&SlotConfig::new(0, "entity"), 0, 10, 10, &snapshots(), &theme);
        assert!(matches!(
            missing,
            WidgetRender::Placeholder(PlaceholderReason::Misconfigured(ConfigError::MissingEntity(_)))
        ));
        let unknown = r.render_slot(&SlotConfig::new(0, "hologram"), 0, 10, 10, &snapshots(), &theme);
        assert!(matches!(
            unknown,
            WidgetRender::Placeholder(PlaceholderReason::Misconfigured(ConfigError::UnknownWidget(_)))
        ));
    }

    #[test]
    fn test_panic_is_contained() {
        let slot = SlotConfig::new(1, "text");
        let outcome = registry().render_slot(&slot, 1, 10, 10, &snapshots(), &Theme::default());
        match outcome {
            WidgetRender::Error(msg) => assert!(msg.contains("boom")),
            other => panic!("expected error outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_options_are_ignored() {
        let slot = SlotConfig::new(0, "entity")
            .entity("sensor.ok")
            .option("sparkle", true)
            .option("shade", 0.0);
        match registry().render_slot(&slot, 0, 4, 4, &snapshots(), &Theme::default()) {
            WidgetRender::Ok(bitmap) => assert_eq!(bitmap.pixel(1, 1), Some((0, 0, 0, 255))),
            other => panic!("expected bitmap, got {:?}", other),
        }
    }

    #[test]
    fn test_dependencies_of_blank_slot_are_empty() {
        let mut slot = SlotConfig::new(0, "entity").entity("sensor.ok");
        slot.widget_type = None;
        assert!(registry().dependencies(&slot).is_empty());
    }
}
