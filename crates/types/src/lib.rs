//! tinydash-types: Shared data types for tinydash.
//!
//! Pure data with serde support: colors, options, layout and widget kinds,
//! device configuration, entity snapshots and theme palettes. Nothing here
//! renders or performs I/O.

pub mod color;
pub mod device;
pub mod layout;
pub mod options;
pub mod snapshot;
pub mod theme;
pub mod widget;

pub use color::Color;
pub use device::{DeviceConfig, ImageFormat, Resolution, ScreenConfig, SlotConfig};
pub use layout::{LayoutType, SplitOrientation, UnknownLayout};
pub use options::Options;
pub use snapshot::{EntityState, HistoryPoint, SnapshotSet};
pub use theme::{PanelStyle, Theme, ThemeKind};
pub use widget::{UnknownWidget, WidgetKind};
