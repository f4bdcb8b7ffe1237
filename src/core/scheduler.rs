//! Per-device refresh and screen-cycle state machine.
//!
//! The scheduler owns `current_screen_index` and decides when a render
//! should start. It never sleeps or renders itself: the device runner feeds
//! it timer ticks, commands and completion events with explicit instants and
//! executes the jobs it hands back. At most one job is in flight; triggers
//! arriving meanwhile collapse into a single pending follow-up.

use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Waiting for the refresh timer, cycling disabled
    Idle,
    /// A render and upload is in flight
    Refreshing,
    /// Waiting for the refresh or the cycle timer
    CyclingWait,
}

/// What caused a render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderReason {
    Startup,
    Refresh,
    Cycle,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleCommand {
    RefreshNow,
    NextScreen,
    PreviousScreen,
    SetScreen(usize),
}

/// Work for the runner: render this screen and upload it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderJob {
    pub screen_index: usize,
    pub reason: RenderReason,
}

#[derive(Debug, Clone)]
pub struct CycleScheduler {
    screen_count: usize,
    current: usize,
    refresh_interval: Duration,
    cycle_interval: Option<Duration>,
    next_refresh_at: Instant,
    next_cycle_at: Option<Instant>,
    in_flight: bool,
    pending: Option<RenderReason>,
}

fn cycle_period(interval: Duration) -> Option<Duration> {
    (!interval.is_zero()).then_some(interval)
}

impl CycleScheduler {
    /// A zero `cycle_interval` disables automatic advancing
    pub fn new(
        screen_count: usize,
        refresh_interval: Duration,
        cycle_interval: Duration,
        now: Instant,
    ) -> Self {
        let cycle_interval = cycle_period(cycle_interval);
        Self {
            screen_count: screen_count.max(1),
            current: 0,
            refresh_interval,
            cycle_interval,
            next_refresh_at: now + refresh_interval,
            next_cycle_at: cycle_interval.map(|c| now + c),
            in_flight: false,
            pending: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.in_flight {
            SchedulerState::Refreshing
        } else if self.next_cycle_at.is_some() {
            SchedulerState::CyclingWait
        } else {
            SchedulerState::Idle
        }
    }

    pub fn current_screen(&self) -> usize {
        self.current
    }

    pub fn screen_count(&self) -> usize {
        self.screen_count
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Earliest instant at which [`on_tick`](Self::on_tick) has work
    pub fn next_deadline(&self) -> Instant {
        match self.next_cycle_at {
            Some(cycle) => cycle.min(self.next_refresh_at),
            None => self.next_refresh_at,
        }
    }

    /// Render the current screen right away, used once at startup
    pub fn start(&mut self, now: Instant) -> Option<RenderJob> {
        self.request(RenderReason::Startup, now)
    }

    /// Fire whichever timers are due
    pub fn on_tick(&mut self, now: Instant) -> Option<RenderJob> {
        let mut reason = None;

        if let (Some(interval), Some(mut at)) = (self.cycle_interval, self.next_cycle_at) {
            while at <= now {
                self.current = (self.current + 1) % self.screen_count;
                at += interval;
                reason = Some(RenderReason::Cycle);
            }
            self.next_cycle_at = Some(at);
        }

        if reason.is_none() && self.next_refresh_at <= now {
            reason = Some(RenderReason::Refresh);
        }

        reason.and_then(|reason| self.request(reason, now))
    }

    /// Apply a manual command. Navigation restarts the cycle timer.
    pub fn on_command(&mut self, command: ScheduleCommand, now: Instant) -> Option<RenderJob> {
        let target = match command {
            ScheduleCommand::RefreshNow => None,
            ScheduleCommand::NextScreen => Some((self.current + 1) % self.screen_count),
            ScheduleCommand::PreviousScreen => {
                Some((self.current + self.screen_count - 1) % self.screen_count)
            }
            ScheduleCommand::SetScreen(index) if index < self.screen_count => Some(index),
            ScheduleCommand::SetScreen(index) => {
                log::warn!(
                    "Ignoring screen {} (device has {} screens)",
                    index,
                    self.screen_count
                );
                return None;
            }
        };

        if let Some(index) = target {
            self.current = index;
            self.next_cycle_at = self.cycle_interval.map(|c| now + c);
        }
        self.request(RenderReason::Command, now)
    }

    /// The in-flight job ended, successfully or not
    pub fn on_render_finished(&mut self, now: Instant) -> Option<RenderJob> {
        self.in_flight = false;
        self.pending.take().and_then(|reason| self.request(reason, now))
    }

    /// Forget the in-flight job and any pending follow-up
    pub fn cancel(&mut self) {
        self.in_flight = false;
        self.pending = None;
    }

    /// Adopt new intervals and screen count, restarting both timers
    pub fn reconfigure(
        &mut self,
        screen_count: usize,
        refresh_interval: Duration,
        cycle_interval: Duration,
        now: Instant,
    ) {
        self.screen_count = screen_count.max(1);
        if self.current >= self.screen_count {
            self.current = 0;
        }
        self.refresh_interval = refresh_interval;
        self.cycle_interval = cycle_period(cycle_interval);
        self.next_refresh_at = now + refresh_interval;
        self.next_cycle_at = self.cycle_interval.map(|c| now + c);
    }

    fn request(&mut self, reason: RenderReason, now: Instant) -> Option<RenderJob> {
        // A render is about to happen either way, so the refresh timer restarts
        self.next_refresh_at = now + self.refresh_interval;
        if self.in_flight {
            log::trace!("Render in flight, coalescing {:?}", reason);
            self.pending = Some(reason);
            return None;
        }
        self.in_flight = true;
        Some(RenderJob {
            screen_index: self.current,
            reason,
        })
    }
}
