//! ValueResolver trait: the boundary to whatever stores entity state.

use async_trait::async_trait;
use std::sync::Arc;
use tinydash_types::{EntityState, HistoryPoint};

/// Source of entity snapshots and history series.
///
/// Both calls may report "unavailable" by returning `None`. Implementations
/// are only ever read from; the pipeline never writes entity state.
#[async_trait]
pub trait ValueResolver: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Current state of an entity
    async fn resolve(&self, entity_id: &str) -> Option<EntityState>;

    /// Numeric samples for the last `hours` hours, oldest first
    async fn resolve_history(&self, entity_id: &str, hours: u32) -> Option<Vec<HistoryPoint>>;
}

/// Boxed resolver shared between device tasks
pub type SharedResolver = Arc<dyn ValueResolver>;
