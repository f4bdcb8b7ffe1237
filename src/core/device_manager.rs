//! Owns the runners of all configured devices

use anyhow::{anyhow, Result};
use std::collections::HashMap;
use tinydash_types::DeviceConfig;

use super::device_runner::{spawn_device, DeviceCommand, DeviceHandle, RunnerServices};
use super::status::DeviceStatus;

/// Starts, stops and routes commands to device runners, keyed by address
pub struct DeviceManager {
    services: RunnerServices,
    devices: HashMap<String, DeviceHandle>,
}

impl DeviceManager {
    pub fn new(services: RunnerServices) -> Self {
        Self {
            services,
            devices: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Addresses of running devices, sorted
    pub fn addresses(&self) -> Vec<String> {
        let mut addresses: Vec<_> = self.devices.keys().cloned().collect();
        addresses.sort();
        addresses
    }

    /// Start a device, or reload it if it is already running
    pub async fn start(&mut self, config: DeviceConfig) -> Result<()> {
        if config.address.trim().is_empty() {
            return Err(anyhow!("device has no address"));
        }
        if let Some(handle) = self.devices.get(&config.address) {
            if !handle.is_finished() {
                return handle.send(DeviceCommand::Reload(Box::new(config))).await;
            }
        }
        let handle = spawn_device(config, self.services.clone());
        self.devices.insert(handle.address().to_string(), handle);
        Ok(())
    }

    pub async fn stop(&mut self, address: &str) -> bool {
        match self.devices.remove(address) {
            Some(handle) => {
                handle.shutdown().await;
                true
            }
            None => false,
        }
    }

    /// Bring the running set in line with a new device list
    pub async fn reload(&mut self, configs: Vec<DeviceConfig>) -> Result<()> {
        let wanted: Vec<String> = configs.iter().map(|c| c.address.clone()).collect();
        let stale: Vec<String> = self
            .devices
            .keys()
            .filter(|address| !wanted.contains(address))
            .cloned()
            .collect();
        for address in stale {
            log::info!("Device {} removed from configuration", address);
            self.stop(&address).await;
        }
        for config in configs {
            let address = config.address.clone();
            if let Err(e) = self.start(config).await {
                log::warn!("Could not start device {}: {}", address, e);
            }
        }
        Ok(())
    }

    pub async fn command(&self, address: &str, command: DeviceCommand) -> Result<()> {
        self.devices
            .get(address)
            .ok_or_else(|| anyhow!("unknown device {}", address))?
            .send(command)
            .await
    }

    pub fn status(&self, address: &str) -> Option<DeviceStatus> {
        self.devices.get(address).map(DeviceHandle::status)
    }

    pub async fn shutdown_all(&mut self) {
        for (_, handle) in self.devices.drain() {
            handle.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::SystemClock;
    use crate::core::composer::ScreenComposer;
    use crate::core::status::ConnectionStatus;
    use crate::core::uploader::tests::ScriptedTransport;
    use crate::core::uploader::RetryPolicy;
    use crate::sources::StaticResolver;
    use std::sync::Arc;
    use tinydash_types::Resolution;

    fn services(transport: Arc<ScriptedTransport>) -> RunnerServices {
        RunnerServices {
            composer: ScreenComposer::new(),
            resolver: Arc::new(StaticResolver::new()),
            transport,
            retry: RetryPolicy::default(),
            clock: Arc::new(SystemClock),
        }
    }

    fn device(address: &str) -> DeviceConfig {
        let mut config = DeviceConfig::new(address);
        config.resolution = Resolution::new(32, 32);
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_reload_stop() {
        let transport = Arc::new(ScriptedTransport::default());
        let mut manager = DeviceManager::new(services(transport));
        manager.start(device("a.local")).await.unwrap();
        manager.start(device("b.local")).await.unwrap();
        assert_eq!(manager.addresses(), vec!["a.local", "b.local"]);

        // Starting a running device reloads it instead of spawning twice
        manager.start(device("a.local")).await.unwrap();
        assert_eq!(manager.len(), 2);

        manager.reload(vec![device("b.local"), device("c.local")]).await.unwrap();
        assert_eq!(manager.addresses(), vec!["b.local", "c.local"]);

        assert!(manager.command("a.local", DeviceCommand::RefreshNow).await.is_err());
        assert!(manager.stop("c.local").await);
        assert!(!manager.stop("c.local").await);

        manager.shutdown_all().await;
        assert!(manager.is_empty());
    }

    /// Refuses every upload to one address
    struct OneBadDevice;

    #[async_trait::async_trait]
    impl crate::core::uploader::Transport for OneBadDevice {
        async fn send_image(
            &self,
            address: &str,
            _image: crate::core::uploader::EncodedImage,
        ) -> Result<(), tinydash_core::UploadError> {
            if address == "bad.local" {
                Err(tinydash_core::UploadError::Transport("no route to host".into()))
            } else {
                Ok(())
            }
        }

        async fn send_brightness(&self, _address: &str, _level: u8) -> Result<(), tinydash_core::UploadError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_device_does_not_affect_other() {
        let mut services = services(Arc::new(ScriptedTransport::default()));
        services.transport = Arc::new(OneBadDevice);
        let mut manager = DeviceManager::new(services);
        manager.start(device("bad.local")).await.unwrap();
        manager.start(device("good.local")).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        let bad = manager.status("bad.local").unwrap();
        let good = manager.status("good.local").unwrap();
        assert_eq!(bad.connection, ConnectionStatus::Disconnected);
        assert!(bad.consecutive_failures >= 2);
        assert_eq!(good.connection, ConnectionStatus::Connected);
        assert_eq!(good.consecutive_failures, 0);
        manager.shutdown_all().await;
    }

    #[tokio::test]
    async fn test_empty_address_rejected() {
        let mut manager = DeviceManager::new(services(Arc::new(ScriptedTransport::default())));
        assert!(manager.start(DeviceConfig::new("  ")).await.is_err());
    }
}
