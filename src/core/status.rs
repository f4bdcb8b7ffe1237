//! Device status published for external display.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ConnectionStatus::Unknown => "unknown",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DeviceStatus {
    pub connection: ConnectionStatus,
    /// Time of the last successful upload
    pub last_update: Option<DateTime<FixedOffset>>,
    pub active_screen_index: usize,
    pub active_screen_name: String,
    /// Upload jobs that failed in a row
    pub consecutive_failures: u32,
}

/// Write side of a device's status channel
#[derive(Debug)]
pub struct StatusReporter {
    address: String,
    tx: watch::Sender<DeviceStatus>,
}

impl StatusReporter {
    pub fn new(address: &str) -> (Self, watch::Receiver<DeviceStatus>) {
        let (tx, rx) = watch::channel(DeviceStatus::default());
        (
            Self {
                address: address.to_string(),
                tx,
            },
            rx,
        )
    }

    pub fn current(&self) -> DeviceStatus {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DeviceStatus> {
        self.tx.subscribe()
    }

    pub fn set_active_screen(&self, index: usize, name: &str) {
        self.tx.send_modify(|status| {
            status.active_screen_index = index;
            status.active_screen_name = name.to_string();
        });
    }

    pub fn record_success(&self, at: DateTime<FixedOffset>) {
        let address = &self.address;
        self.tx.send_modify(|status| {
            if status.connection != ConnectionStatus::Connected {
                log::info!("Device {} connected", address);
            }
            status.connection = ConnectionStatus::Connected;
            status.last_update = Some(at);
            status.consecutive_failures = 0;
        });
    }

    /// An upload gave up after exhausting its retries
    pub fn record_failure(&self) {
        let address = &self.address;
        self.tx.send_modify(|status| {
            if status.connection != ConnectionStatus::Disconnected {
                log::warn!("Device {} disconnected", address);
            }
            status.connection = ConnectionStatus::Disconnected;
            status.consecutive_failures = status.consecutive_failures.saturating_add(1);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_transitions() {
        let (reporter, rx) = StatusReporter::new("10.0.0.5");
        assert_eq!(rx.borrow().connection, ConnectionStatus::Unknown);

        reporter.record_failure();
        reporter.record_failure();
        assert_eq!(rx.borrow().connection, ConnectionStatus::Disconnected);
        assert_eq!(rx.borrow().consecutive_failures, 2);

        let at = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        reporter.record_success(at);
        let status = rx.borrow().clone();
        assert_eq!(status.connection, ConnectionStatus::Connected);
        assert_eq!(status.last_update, Some(at));
        assert_eq!(status.consecutive_failures, 0);

        reporter.set_active_screen(1, "Energy");
        assert_eq!(reporter.current().active_screen_name, "Energy");
    }
}
