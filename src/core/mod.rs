//! Runtime pipeline: composing screens and driving devices

pub mod clock;
mod composer;
mod device_manager;
mod device_runner;
pub mod scheduler;
mod snapshot_fetcher;
mod status;
pub mod uploader;

pub use clock::{Clock, SimulatedClock, SystemClock};
pub use composer::{Composition, ScreenComposer, SlotReport, SlotStatus};
pub use device_manager::DeviceManager;
pub use device_runner::{spawn_device, DeviceCommand, DeviceHandle, RunnerServices};
pub use scheduler::{CycleScheduler, RenderJob, RenderReason, ScheduleCommand, SchedulerState};
pub use snapshot_fetcher::SnapshotFetcher;
pub use status::{ConnectionStatus, DeviceStatus, StatusReporter};
pub use uploader::{
    DeviceUploader, EncodedImage, HttpTransport, RetryPolicy, SharedTransport, Transport,
    UploadReceipt,
};
