//! Time sources for the device runners.
//!
//! Scheduling uses tokio's monotonic `Instant`, so paused-time tests drive it
//! directly. Wall time only feeds the snapshot's `now`.

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Local};
use tokio::time::Instant;

pub trait Clock: Send + Sync {
    /// Monotonic instant used for timers
    fn now(&self) -> Instant;

    /// Wall-clock time handed to widgets
    fn wall_time(&self) -> DateTime<FixedOffset>;
}

/// Real system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_time(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Wall time that starts at a fixed moment and moves with tokio's clock.
///
/// Under `start_paused` tests both timers and the snapshot time advance only
/// when the test advances them.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    start_wall: DateTime<FixedOffset>,
    start: Instant,
}

impl SimulatedClock {
    pub fn starting_at(start_wall: DateTime<FixedOffset>) -> Self {
        Self {
            start_wall,
            start: Instant::now(),
        }
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_time(&self) -> DateTime<FixedOffset> {
        let elapsed = Instant::now().saturating_duration_since(self.start);
        let elapsed = ChronoDuration::from_std(elapsed).unwrap_or_else(|_| ChronoDuration::zero());
        self.start_wall + elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_simulated_clock_follows_tokio_time() {
        let start = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 7, 0, 0)
            .unwrap();
        let clock = SimulatedClock::starting_at(start);
        tokio::time::advance(Duration::from_secs(65)).await;
        assert_eq!(clock.wall_time().format("%H:%M:%S").to_string(), "07:01:05");
    }
}
