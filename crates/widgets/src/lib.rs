//! tinydash-widgets: Built-in widget renderers.
//!
//! One renderer per [`WidgetKind`]. [`register_all`] adds them to a
//! registry; [`global_registry`] is the shared instance built on first use.

mod camera;
mod chart;
mod clock;
mod entity;
mod gauge;
pub mod helpers;
mod media;
mod progress;
mod status;
mod text;
mod weather;

use once_cell::sync::Lazy;
use tinydash_core::WidgetRegistry;

pub use camera::{CameraWidget, Fit};
pub use chart::ChartWidget;
pub use clock::{clock_face, ClockFace, ClockWidget};
pub use entity::{display_value, EntityWidget};
pub use gauge::{GaugeStyle, GaugeWidget};
pub use media::MediaWidget;
pub use progress::{MultiProgressWidget, ProgressWidget};
pub use status::{StatusListWidget, StatusWidget};
pub use text::TextWidget;
pub use weather::WeatherWidget;

/// Register every built-in widget renderer
pub fn register_all(registry: &mut WidgetRegistry) {
    registry.register(Box::new(ClockWidget));
    registry.register(Box::new(EntityWidget));
    registry.register(Box::new(MediaWidget));
    registry.register(Box::new(ChartWidget));
    registry.register(Box::new(TextWidget));
    registry.register(Box::new(GaugeWidget));
    registry.register(Box::new(ProgressWidget));
    registry.register(Box::new(MultiProgressWidget));
    registry.register(Box::new(WeatherWidget));
    registry.register(Box::new(StatusWidget));
    registry.register(Box::new(StatusListWidget));
    registry.register(Box::new(CameraWidget));
}

/// New registry holding all built-in widgets
pub fn builtin_registry() -> WidgetRegistry {
    let mut registry = WidgetRegistry::new();
    register_all(&mut registry);
    log::debug!("Registered {} widget renderers", registry.kinds().count());
    registry
}

static GLOBAL_REGISTRY: Lazy<WidgetRegistry> = Lazy::new(builtin_registry);

/// Shared registry with all built-in widgets
pub fn global_registry() -> &'static WidgetRegistry {
    &GLOBAL_REGISTRY
}
