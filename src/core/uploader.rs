//! Pushing finished screens to devices.
//!
//! The wire protocol is one multipart POST per image, JPEG unless the device
//! asks for PNG. [`DeviceUploader`] wraps any [`Transport`] with dimension
//! checks, a per-attempt timeout and bounded exponential backoff.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tinydash_core::constants::{
    DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_BACKOFF, DEFAULT_UPLOAD_ATTEMPTS, DEFAULT_UPLOAD_TIMEOUT,
};
use tinydash_core::{Bitmap, UploadError};
use tinydash_types::device::DEFAULT_JPEG_QUALITY;
use tinydash_types::{ImageFormat, Resolution};

/// A finished screen in the device's container format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: ImageFormat,
    pub data: Vec<u8>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver an encoded image in a single call
    async fn send_image(&self, address: &str, image: EncodedImage) -> Result<(), UploadError>;

    /// Set the backlight level (0-100)
    async fn send_brightness(&self, address: &str, level: u8) -> Result<(), UploadError>;
}

pub type SharedTransport = Arc<dyn Transport>;

/// HTTP transport speaking the device's upload endpoint
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn base_url(address: &str) -> String {
        if address.starts_with("http://") || address.starts_with("https://") {
            address.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", address.trim_end_matches('/'))
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn transport_error(e: reqwest::Error) -> UploadError {
    UploadError::Transport(e.to_string())
}

fn check_status(response: &reqwest::Response) -> Result<(), UploadError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(UploadError::Status(status.as_u16()))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_image(&self, address: &str, image: EncodedImage) -> Result<(), UploadError> {
        let part = reqwest::multipart::Part::bytes(image.data)
            .file_name(image.format.file_name())
            .mime_str(image.format.mime_type())
            .map_err(transport_error)?;
        let form = reqwest::multipart::Form::new().part("file", part);
        let url = format!("{}/doUpload?dir=/image/", Self::base_url(address));
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(&response)
    }

    async fn send_brightness(&self, address: &str, level: u8) -> Result<(), UploadError> {
        let url = format!("{}/set?brt={}", Self::base_url(address), level.min(100));
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        check_status(&response)
    }
}

/// Attempt count, per-attempt timeout and backoff between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_UPLOAD_ATTEMPTS,
            timeout: DEFAULT_UPLOAD_TIMEOUT,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based), doubling each time
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << shift)
            .min(self.max_backoff)
    }

    /// Keep the per-attempt timeout below half the refresh interval
    pub fn for_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        let ceiling = refresh_interval / 2;
        if !ceiling.is_zero() && self.timeout > ceiling {
            self.timeout = ceiling;
        }
        self.max_attempts = self.max_attempts.max(1);
        self
    }
}

/// Successful upload details
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadReceipt {
    pub attempts: u32,
    pub bytes: usize,
}

#[derive(Clone)]
pub struct DeviceUploader {
    transport: SharedTransport,
    policy: RetryPolicy,
    format: ImageFormat,
    jpeg_quality: u8,
}

impl DeviceUploader {
    pub fn new(transport: SharedTransport, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            format: ImageFormat::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_encoding(mut self, format: ImageFormat, jpeg_quality: u8) -> Self {
        self.format = format;
        self.jpeg_quality = jpeg_quality;
        self
    }

    /// Encode and push a bitmap, retrying transient failures
    pub async fn upload(
        &self,
        address: &str,
        resolution: Resolution,
        bitmap: &Bitmap,
    ) -> Result<UploadReceipt, UploadError> {
        if bitmap.width() != resolution.width || bitmap.height() != resolution.height {
            return Err(UploadError::Dimensions {
                width: resolution.width,
                height: resolution.height,
                actual_width: bitmap.width(),
                actual_height: bitmap.height(),
            });
        }
        let image = EncodedImage {
            format: self.format,
            data: bitmap.encode(self.format, self.jpeg_quality)?,
        };
        let bytes = image.data.len();

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = tokio::time::timeout(
                self.policy.timeout,
                self.transport.send_image(address, image.clone()),
            )
            .await
            .unwrap_or(Err(UploadError::Timeout(self.policy.timeout)));

            match result {
                Ok(()) => {
                    log::trace!("Uploaded {} bytes to {} (attempt {})", bytes, address, attempt);
                    return Ok(UploadReceipt {
                        attempts: attempt,
                        bytes,
                    });
                }
                Err(e) if !e.is_retryable() || attempt >= self.policy.max_attempts => {
                    log::warn!("Upload to {} failed after {} attempt(s): {}", address, attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.policy.backoff(attempt);
                    log::warn!(
                        "Upload to {} failed (attempt {}/{}): {}, retrying in {:?}",
                        address,
                        attempt,
                        self.policy.max_attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Single attempt, bounded by the same timeout
    pub async fn set_brightness(&self, address: &str, level: u8) -> Result<(), UploadError> {
        tokio::time::timeout(
            self.policy.timeout,
            self.transport.send_brightness(address, level.min(100)),
        )
        .await
        .unwrap_or(Err(UploadError::Timeout(self.policy.timeout)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Fails the first `failures` image uploads, then succeeds
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        pub failures: AtomicU32,
        pub error: Option<UploadError>,
        pub hang: bool,
        pub hang_brightness: bool,
        pub images: AtomicU32,
        pub formats: Mutex<Vec<ImageFormat>>,
        pub brightness: Mutex<Vec<u8>>,
    }

    impl ScriptedTransport {
        pub fn failing(failures: u32) -> Self {
            Self {
                failures: AtomicU32::new(failures),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send_image(&self, _address: &str, image: EncodedImage) -> Result<(), UploadError> {
            assert_eq!(Bitmap::sniff_format(&image.data), Some(image.format));
            if self.hang {
                std::future::pending::<()>().await;
            }
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(self
                    .error
                    .clone()
                    .unwrap_or_else(|| UploadError::Transport("connection refused".into())));
            }
            self.formats.lock().unwrap().push(image.format);
            self.images.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn send_brightness(&self, _address: &str, level: u8) -> Result<(), UploadError> {
            self.brightness.lock().unwrap().push(level);
            if self.hang_brightness {
                std::future::pending::<()>().await;
            }
            Ok(())
        }
    }

    fn bitmap(width: u32, height: u32) -> Bitmap {
        let surface = Bitmap::new_surface(width, height).unwrap();
        Bitmap::from_surface(&surface).unwrap()
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let policy = RetryPolicy::default();
        let delays: Vec<_> = (1..=6).map(|a| policy.backoff(a).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 10, 10]);
    }

    #[test]
    fn test_timeout_clamped_below_refresh_interval() {
        let policy = RetryPolicy::default().for_refresh_interval(Duration::from_secs(6));
        assert_eq!(policy.timeout, Duration::from_secs(3));
        let policy = RetryPolicy::default().for_refresh_interval(Duration::from_secs(60));
        assert_eq!(policy.timeout, DEFAULT_UPLOAD_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_succeeds() {
        let transport = Arc::new(ScriptedTransport::failing(2));
        let uploader = DeviceUploader::new(transport.clone(), RetryPolicy::default());
        let started = Instant::now();
        let receipt = uploader.upload("dev", Resolution::new(16, 16), &bitmap(16, 16)).await.unwrap();
        assert_eq!(receipt.attempts, 3);
        assert_eq!(transport.images.load(Ordering::SeqCst), 1);
        // 1 s + 2 s of backoff
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let transport = Arc::new(ScriptedTransport::failing(u32::MAX));
        let uploader = DeviceUploader::new(transport.clone(), RetryPolicy::default());
        let err = uploader.upload("dev", Resolution::new(8, 8), &bitmap(8, 8)).await.unwrap_err();
        assert!(matches!(err, UploadError::Transport(_)));
        assert_eq!(transport.failures.load(Ordering::SeqCst), u32::MAX - 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_error_is_not_retried() {
        let transport = Arc::new(ScriptedTransport {
            failures: AtomicU32::new(5),
            error: Some(UploadError::Status(404)),
            ..ScriptedTransport::default()
        });
        let uploader = DeviceUploader::new(transport.clone(), RetryPolicy::default());
        let err = uploader.upload("dev", Resolution::new(8, 8), &bitmap(8, 8)).await.unwrap_err();
        assert_eq!(err, UploadError::Status(404));
        assert_eq!(transport.failures.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_device_times_out_each_attempt() {
        let transport = Arc::new(ScriptedTransport {
            hang: true,
            ..ScriptedTransport::default()
        });
        let uploader = DeviceUploader::new(transport, RetryPolicy::default());
        let started = Instant::now();
        let err = uploader.upload("dev", Resolution::new(8, 8), &bitmap(8, 8)).await.unwrap_err();
        assert_eq!(err, UploadError::Timeout(DEFAULT_UPLOAD_TIMEOUT));
        // 3 x 5 s timeouts plus 1 s + 2 s backoff
        assert_eq!(started.elapsed(), Duration::from_secs(18));
    }

    #[tokio::test]
    async fn test_wrong_dimensions_rejected_without_sending() {
        let transport = Arc::new(ScriptedTransport::default());
        let uploader = DeviceUploader::new(transport.clone(), RetryPolicy::default());
        let err = uploader.upload("dev", Resolution::new(240, 240), &bitmap(10, 10)).await.unwrap_err();
        assert!(matches!(err, UploadError::Dimensions { actual_width: 10, .. }));
        assert_eq!(transport.images.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_encodes_jpeg_unless_device_wants_png() {
        let transport = Arc::new(ScriptedTransport::default());
        let uploader = DeviceUploader::new(transport.clone(), RetryPolicy::default());
        let receipt = uploader.upload("dev", Resolution::new(16, 16), &bitmap(16, 16)).await.unwrap();
        assert!(receipt.bytes > 0);

        let uploader = uploader.with_encoding(ImageFormat::Png, DEFAULT_JPEG_QUALITY);
        uploader.upload("dev", Resolution::new(16, 16), &bitmap(16, 16)).await.unwrap();
        assert_eq!(
            *transport.formats.lock().unwrap(),
            vec![ImageFormat::Jpeg, ImageFormat::Png]
        );
    }

    #[test]
    fn test_base_url() {
        assert_eq!(HttpTransport::base_url("192.168.1.9"), "http://192.168.1.9");
        assert_eq!(HttpTransport::base_url("http://frame.local/"), "http://frame.local");
    }
}
