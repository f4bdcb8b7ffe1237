//! tinydash-core: Core traits and geometry for tinydash.
//!
//! This crate contains the layout engine, the error taxonomy, the
//! `WidgetRenderer` and `ValueResolver` traits, the widget registry and
//! the `Bitmap` type that carries finished renders between threads.

mod bitmap;
pub mod constants;
pub mod error;
pub mod layout;
mod registry;
mod resolver;
mod widget;

pub use bitmap::Bitmap;
pub use error::{ConfigError, RenderError, UploadError};
pub use layout::{compute_slot_rects, compute_slot_rects_by_name, slot_rects_or_fallback, Rect};
pub use registry::{WidgetInfo, WidgetRegistry};
pub use resolver::{SharedResolver, ValueResolver};
pub use widget::{
    BoxedRenderer, ConfigOption, ConfigSchema, Dependencies, PlaceholderReason, WidgetContext,
    WidgetRender, WidgetRenderer, COMMON_OPTION_KEYS,
};

// Re-export types used in trait signatures for convenience
pub use tinydash_types::{SlotConfig, SnapshotSet, Theme, WidgetKind};
