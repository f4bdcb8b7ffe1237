//! Value sources implementing `ValueResolver`

mod home_assistant;
mod static_values;

pub use home_assistant::HomeAssistantResolver;
pub use static_values::{SnapshotFile, StaticResolver};
