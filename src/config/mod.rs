//! Configuration management

mod settings;

pub use settings::{AppConfig, HomeAssistantConfig, UploadSettings, CONFIG_VERSION, TOKEN_ENV};
