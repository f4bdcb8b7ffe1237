//! One cooperative control loop per device.
//!
//! The loop owns the device's scheduler and status. Commands arrive on an
//! mpsc channel and win over timers; each render and upload runs as a
//! separate task so a reload or shutdown can abort it.

use anyhow::anyhow;
use std::sync::Arc;
use std::time::Duration;
use tinydash_core::UploadError;
use tinydash_types::DeviceConfig;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::clock::Clock;
use super::composer::ScreenComposer;
use super::scheduler::{CycleScheduler, RenderJob, ScheduleCommand};
use super::snapshot_fetcher::SnapshotFetcher;
use super::status::{DeviceStatus, StatusReporter};
use super::uploader::{DeviceUploader, RetryPolicy, SharedTransport, UploadReceipt};
use tinydash_core::SharedResolver;

const COMMAND_QUEUE: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    RefreshNow,
    NextScreen,
    PreviousScreen,
    SetScreen(usize),
    SetBrightness(u8),
    Reload(Box<DeviceConfig>),
    Shutdown,
}

/// Collaborators shared by every runner
#[derive(Clone)]
pub struct RunnerServices {
    pub composer: ScreenComposer<'static>,
    pub resolver: SharedResolver,
    pub transport: SharedTransport,
    pub retry: RetryPolicy,
    pub clock: Arc<dyn Clock>,
}

/// Result of one render and upload job
#[derive(Debug)]
enum JobOutcome {
    Uploaded(UploadReceipt),
    UploadFailed(UploadError),
    RenderFailed(String),
}

/// Control side of a running device
pub struct DeviceHandle {
    address: String,
    commands: mpsc::Sender<DeviceCommand>,
    status: watch::Receiver<DeviceStatus>,
    task: JoinHandle<()>,
}

impl DeviceHandle {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub async fn send(&self, command: DeviceCommand) -> anyhow::Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow!("runner for {} has stopped", self.address))
    }

    pub fn status(&self) -> DeviceStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DeviceStatus> {
        self.status.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the runner and wait for it to exit
    pub async fn shutdown(self) {
        // A closed channel means the loop already exited
        let _ = self.commands.send(DeviceCommand::Shutdown).await;
        if let Err(e) = self.task.await {
            log::warn!("Runner for {} ended abnormally: {}", self.address, e);
        }
    }
}

/// Start a runner task for a device
pub fn spawn_device(config: DeviceConfig, services: RunnerServices) -> DeviceHandle {
    let config = config.validated();
    let address = config.address.clone();
    let (tx, rx) = mpsc::channel(COMMAND_QUEUE);
    let (reporter, status) = StatusReporter::new(&address);
    let runner = DeviceRunner::new(config, services, reporter);
    let task = tokio::spawn(runner.run(rx));
    DeviceHandle {
        address,
        commands: tx,
        status,
        task,
    }
}

struct DeviceRunner {
    config: Arc<DeviceConfig>,
    services: RunnerServices,
    fetcher: SnapshotFetcher,
    uploader: DeviceUploader,
    scheduler: CycleScheduler,
    reporter: Arc<StatusReporter>,
    brightness: Option<JoinHandle<()>>,
}

fn intervals(config: &DeviceConfig) -> (Duration, Duration) {
    (
        Duration::from_secs(config.refresh_interval),
        Duration::from_secs(config.screen_cycle_interval),
    )
}

impl DeviceRunner {
    fn new(config: DeviceConfig, services: RunnerServices, reporter: StatusReporter) -> Self {
        let (refresh, cycle) = intervals(&config);
        let scheduler =
            CycleScheduler::new(config.screens.len(), refresh, cycle, services.clock.now());
        Self {
            fetcher: SnapshotFetcher::new(services.resolver.clone()),
            uploader: build_uploader(&config, &services),
            config: Arc::new(config),
            services,
            scheduler,
            reporter: Arc::new(reporter),
            brightness: None,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<DeviceCommand>) {
        log::info!(
            "Starting device {} ({} screens, refresh {}s, cycle {}s)",
            self.config.display_name(),
            self.config.screens.len(),
            self.config.refresh_interval,
            self.config.screen_cycle_interval
        );
        self.apply_brightness();

        let mut job = self.scheduler.start(self.services.clock.now()).map(|j| self.dispatch(j));

        loop {
            let deadline = self.scheduler.next_deadline();
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    None | Some(DeviceCommand::Shutdown) => break,
                    Some(command) => {
                        if let Some(next) = self.handle_command(command, &mut job) {
                            job = Some(self.dispatch(next));
                        }
                    }
                },

                outcome = async {
                    match job.as_mut() {
                        Some(handle) => handle.await,
                        None => std::future::pending().await,
                    }
                }, if job.is_some() => {
                    job = None;
                    match outcome {
                        Ok(outcome) => self.record(outcome),
                        Err(e) if e.is_cancelled() => {}
                        Err(e) => log::error!("Render task for {} failed: {}", self.config.address, e),
                    }
                    let now = self.services.clock.now();
                    job = self.scheduler.on_render_finished(now).map(|j| self.dispatch(j));
                }

                _ = tokio::time::sleep_until(deadline) => {
                    let now = self.services.clock.now();
                    if let Some(next) = self.scheduler.on_tick(now) {
                        job = Some(self.dispatch(next));
                    }
                }
            }
        }

        if let Some(handle) = job {
            handle.abort();
        }
        if let Some(handle) = self.brightness.take() {
            handle.abort();
        }
        log::info!("Stopped device {}", self.config.display_name());
    }

    fn handle_command(
        &mut self,
        command: DeviceCommand,
        job: &mut Option<JoinHandle<JobOutcome>>,
    ) -> Option<RenderJob> {
        let now = self.services.clock.now();
        log::debug!("Device {}: {:?}", self.config.address, command);
        match command {
            DeviceCommand::RefreshNow => self.scheduler.on_command(ScheduleCommand::RefreshNow, now),
            DeviceCommand::NextScreen => self.scheduler.on_command(ScheduleCommand::NextScreen, now),
            DeviceCommand::PreviousScreen => {
                self.scheduler.on_command(ScheduleCommand::PreviousScreen, now)
            }
            DeviceCommand::SetScreen(index) => {
                self.scheduler.on_command(ScheduleCommand::SetScreen(index), now)
            }
            DeviceCommand::SetBrightness(level) => {
                Arc::make_mut(&mut self.config).brightness = level.min(100);
                self.apply_brightness();
                None
            }
            DeviceCommand::Reload(config) => {
                if let Some(handle) = job.take() {
                    handle.abort();
                }
                self.reload(*config, now)
            }
            // Handled by the loop
            DeviceCommand::Shutdown => None,
        }
    }

    fn reload(&mut self, config: DeviceConfig, now: tokio::time::Instant) -> Option<RenderJob> {
        let config = config.validated();
        let brightness_changed = config.brightness != self.config.brightness;
        let (refresh, cycle) = intervals(&config);

        self.scheduler.cancel();
        self.scheduler.reconfigure(config.screens.len(), refresh, cycle, now);
        self.fetcher.clear_cache();
        self.uploader = build_uploader(&config, &self.services);
        self.config = Arc::new(config);
        log::info!("Reloaded device {}", self.config.display_name());

        if brightness_changed {
            self.apply_brightness();
        }
        self.scheduler.start(now)
    }

    /// Push the configured level in the background, replacing any
    /// brightness call still waiting on the device
    fn apply_brightness(&mut self) {
        if let Some(previous) = self.brightness.take() {
            previous.abort();
        }
        let uploader = self.uploader.clone();
        let address = self.config.address.clone();
        let level = self.config.brightness;
        self.brightness = Some(tokio::spawn(async move {
            if let Err(e) = uploader.set_brightness(&address, level).await {
                log::warn!("Could not set brightness on {}: {}", address, e);
            }
        }));
    }

    fn dispatch(&self, job: RenderJob) -> JoinHandle<JobOutcome> {
        let index = job.screen_index.min(self.config.screens.len().saturating_sub(1));
        let name = self
            .config
            .screens
            .get(index)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        self.reporter.set_active_screen(index, &name);
        log::trace!("Device {}: rendering '{}' ({:?})", self.config.address, name, job.reason);

        let config = self.config.clone();
        let services = self.services.clone();
        let fetcher = self.fetcher.clone();
        let uploader = self.uploader.clone();
        tokio::spawn(async move {
            render_and_upload(index, &config, &services, &fetcher, &uploader).await
        })
    }

    fn record(&self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Uploaded(receipt) => {
                log::trace!(
                    "Device {}: {} bytes in {} attempt(s)",
                    self.config.address,
                    receipt.bytes,
                    receipt.attempts
                );
                self.reporter.record_success(self.services.clock.wall_time());
            }
            JobOutcome::UploadFailed(e) => {
                log::warn!("Device {}: upload failed: {}", self.config.address, e);
                self.reporter.record_failure();
            }
            JobOutcome::RenderFailed(message) => {
                log::error!("Device {}: could not compose screen: {}", self.config.address, message);
            }
        }
    }
}

fn build_uploader(config: &DeviceConfig, services: &RunnerServices) -> DeviceUploader {
    let (refresh, _) = intervals(config);
    DeviceUploader::new(
        services.transport.clone(),
        services.retry.for_refresh_interval(refresh),
    )
    .with_encoding(config.image_format, config.jpeg_quality)
}

async fn render_and_upload(
    index: usize,
    config: &DeviceConfig,
    services: &RunnerServices,
    fetcher: &SnapshotFetcher,
    uploader: &DeviceUploader,
) -> JobOutcome {
    let Some(screen) = config.screens.get(index) else {
        return JobOutcome::RenderFailed(format!("no screen {}", index));
    };
    let composer = services.composer;
    let theme = composer.theme_for(&config.theme, screen);
    let deps = composer.dependencies(screen);
    let snapshots = fetcher
        .fetch(&deps, services.clock.wall_time(), services.clock.now())
        .await;

    let composition = match composer.compose(screen, config.resolution, theme, &snapshots) {
        Ok(c) => c,
        Err(e) => return JobOutcome::RenderFailed(e.to_string()),
    };
    if composition.failed_slots() > 0 {
        log::warn!(
            "Device {} screen '{}': {} slot(s) failed to render",
            config.address,
            screen.name,
            composition.failed_slots()
        );
    }

    match uploader
        .upload(&config.address, config.resolution, &composition.bitmap)
        .await
    {
        Ok(receipt) => JobOutcome::Uploaded(receipt),
        Err(e) => JobOutcome::UploadFailed(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::SimulatedClock;
    use crate::core::status::ConnectionStatus;
    use crate::core::uploader::tests::ScriptedTransport;
    use crate::sources::StaticResolver;
    use chrono::{FixedOffset, TimeZone};
    use std::sync::atomic::Ordering;
    use tinydash_types::{EntityState, ImageFormat, Resolution, ScreenConfig, SlotConfig};

    fn services(transport: Arc<ScriptedTransport>) -> RunnerServices {
        let start = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 1, 7, 5, 0)
            .unwrap();
        RunnerServices {
            composer: ScreenComposer::new(),
            resolver: Arc::new(
                StaticResolver::new().with_state(EntityState::new("sensor.cpu", "12").with_unit("%")),
            ),
            transport,
            retry: RetryPolicy::default(),
            clock: Arc::new(SimulatedClock::starting_at(start)),
        }
    }

    fn device(screens: usize, refresh: u64, cycle: u64) -> DeviceConfig {
        let mut config = DeviceConfig::new("10.0.0.7");
        config.resolution = Resolution::new(64, 64);
        config.refresh_interval = refresh;
        config.screen_cycle_interval = cycle;
        config.screens = (0..screens)
            .map(|i| {
                ScreenConfig::new(format!("Screen {}", i), "split")
                    .with_slot(SlotConfig::new(0, "clock"))
                    .with_slot(SlotConfig::new(1, "gauge").entity("sensor.cpu"))
            })
            .collect();
        config
    }

    async fn brightness_levels(transport: &ScriptedTransport, count: usize) -> Vec<u8> {
        loop {
            let levels = transport.brightness.lock().unwrap().clone();
            if levels.len() >= count {
                return levels;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_render_and_brightness() {
        let transport = Arc::new(ScriptedTransport::default());
        let handle = spawn_device(device(1, 60, 0), services(transport.clone()));
        let mut status = handle.subscribe();
        status
            .wait_for(|s| s.connection == ConnectionStatus::Connected)
            .await
            .unwrap();
        assert_eq!(transport.images.load(Ordering::SeqCst), 1);
        assert_eq!(brightness_levels(&transport, 1).await, vec![70]);
        assert_eq!(handle.status().active_screen_name, "Screen 0");

        handle.send(DeviceCommand::SetBrightness(130)).await.unwrap();
        handle.send(DeviceCommand::RefreshNow).await.unwrap();
        status
            .wait_for(|_| transport.images.load(Ordering::SeqCst) == 2)
            .await
            .unwrap();
        assert_eq!(brightness_levels(&transport, 2).await, vec![70, 100]);
        assert_eq!(*transport.formats.lock().unwrap(), vec![ImageFormat::Jpeg; 2]);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresponsive_brightness_does_not_stall_renders() {
        let transport = Arc::new(ScriptedTransport {
            hang_brightness: true,
            ..ScriptedTransport::default()
        });
        let mut config = device(1, 60, 0);
        config.image_format = ImageFormat::Png;
        let started = tokio::time::Instant::now();
        let handle = spawn_device(config, services(transport.clone()));
        let mut status = handle.subscribe();
        status
            .wait_for(|s| s.connection == ConnectionStatus::Connected)
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(brightness_levels(&transport, 1).await, vec![70]);

        handle.send(DeviceCommand::SetBrightness(40)).await.unwrap();
        handle.send(DeviceCommand::RefreshNow).await.unwrap();
        status
            .wait_for(|_| transport.images.load(Ordering::SeqCst) == 2)
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(brightness_levels(&transport, 2).await, vec![70, 40]);
        assert_eq!(*transport.formats.lock().unwrap(), vec![ImageFormat::Png; 2]);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_then_recover() {
        let transport = Arc::new(ScriptedTransport::failing(3));
        let handle = spawn_device(device(2, 10, 0), services(transport.clone()));
        let mut status = handle.subscribe();

        status
            .wait_for(|s| s.connection == ConnectionStatus::Disconnected)
            .await
            .unwrap();
        assert_eq!(handle.status().active_screen_index, 0);

        status
            .wait_for(|s| s.connection == ConnectionStatus::Connected)
            .await
            .unwrap();
        let status = handle.status();
        assert_eq!(status.consecutive_failures, 0);
        assert!(status.last_update.is_some());
        assert_eq!(status.active_screen_index, 0);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_and_navigation() {
        let transport = Arc::new(ScriptedTransport::default());
        let handle = spawn_device(device(3, 300, 10), services(transport.clone()));

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(handle.status().active_screen_index, 2);

        handle.send(DeviceCommand::PreviousScreen).await.unwrap();
        let mut status = handle.subscribe();
        status.wait_for(|s| s.active_screen_index == 1).await.unwrap();

        handle.send(DeviceCommand::SetScreen(0)).await.unwrap();
        status.wait_for(|s| s.active_screen_index == 0).await.unwrap();
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_replaces_screens() {
        let transport = Arc::new(ScriptedTransport::default());
        let handle = spawn_device(device(3, 300, 0), services(transport.clone()));
        handle.send(DeviceCommand::SetScreen(2)).await.unwrap();
        let mut status = handle.subscribe();
        status.wait_for(|s| s.active_screen_index == 2).await.unwrap();

        let mut smaller = device(1, 300, 0);
        smaller.screens[0].name = "Only".to_string();
        handle.send(DeviceCommand::Reload(Box::new(smaller))).await.unwrap();
        status.wait_for(|s| s.active_screen_name == "Only").await.unwrap();
        assert_eq!(handle.status().active_screen_index, 0);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_after_shutdown_fails() {
        let transport = Arc::new(ScriptedTransport::default());
        let handle = spawn_device(device(1, 60, 0), services(transport));
        let commands = handle.commands.clone();
        handle.shutdown().await;
        assert!(commands.send(DeviceCommand::RefreshNow).await.is_err());
    }
}
