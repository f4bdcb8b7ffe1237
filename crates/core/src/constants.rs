//! Shared constants used across the tinydash crates.

use std::time::Duration;

/// Layout substituted when a screen names one we don't know
pub const FALLBACK_LAYOUT: &str = "grid_2x2";

/// Default history window for chart widgets, in hours
pub const DEFAULT_CHART_HOURS: u32 = 24;

/// How long a fetched history series is reused before refetching
pub const HISTORY_CACHE_TTL: Duration = Duration::from_secs(300);

/// Upload retry defaults
pub const DEFAULT_UPLOAD_ATTEMPTS: u32 = 3;
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Placeholder text drawn for slots without data
pub const PLACEHOLDER_TEXT: &str = "N/A";
