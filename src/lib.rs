//! tinydash: Entity-driven dashboards for small networked displays
//!
//! This library provides the runtime around the rendering crates:
//! - Screen composition from layouts, widgets and themes
//! - Per-device refresh and screen-cycle scheduling
//! - Image upload with retry and connectivity status
//! - Value sources and configuration management

pub mod config;
pub mod core;
pub mod sources;

// Re-export commonly used types
pub use config::AppConfig;
pub use core::{DeviceCommand, DeviceManager, ScreenComposer};
pub use tinydash_types::{DeviceConfig, ScreenConfig, SlotConfig};
