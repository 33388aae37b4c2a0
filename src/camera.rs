//! Webcam access: device enumeration and a live stream that keeps the
//! most recent frame available for snapshotting.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use nokhwa::pixel_format::RgbFormat;
use nokhwa::query;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::Camera;

/// An available camera device.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    /// Device index for selection
    pub index: u32,
    /// Human-readable device name
    pub name: String,
    /// Device description
    pub description: String,
}

impl fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.index, self.name, self.description)
    }
}

/// Settings for the camera stream.
#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Camera device index
    pub device_index: u32,
    /// Requested capture width in pixels
    pub width: u32,
    /// Requested capture height in pixels
    pub height: u32,
    /// Target frame rate (actual may vary)
    pub fps: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: 1280,
            height: 720,
            fps: 30,
        }
    }
}

/// A single RGB frame pulled from the live stream.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data, 3 bytes per pixel
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
}

/// Errors that can occur during camera operations.
#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("No cameras found")]
    NoDevices,

    #[error("Failed to query cameras: {0}")]
    QueryFailed(String),

    #[error("Camera device {0} not found. Run 'list-cameras' to see available devices")]
    DeviceNotFound(u32),

    #[error("Camera permission denied. On macOS, grant access in System Settings > Privacy & Security > Camera")]
    PermissionDenied,

    #[error("Failed to open camera: {0}")]
    OpenFailed(String),

    #[error("Failed to start camera stream: {0}")]
    StreamFailed(String),

    #[error("Camera stream is already running")]
    AlreadyRunning,

    #[error("No frame received from camera within {0:?}")]
    FrameTimeout(Duration),
}

/// List all camera devices on the system.
///
/// An empty system is not an error: this returns an empty vector when
/// no cameras are attached.
pub fn list_devices() -> Result<Vec<CameraInfo>, CameraError> {
    let devices = query(ApiBackend::Auto).map_err(|e| CameraError::QueryFailed(e.to_string()))?;

    Ok(devices
        .into_iter()
        .map(|d| CameraInfo {
            index: d.index().as_index().unwrap_or(0),
            name: d.human_name(),
            description: d.description().to_string(),
        })
        .collect())
}

/// Classify a nokhwa open failure, surfacing permission problems distinctly.
fn classify_open_error(message: &str) -> CameraError {
    let lower = message.to_lowercase();
    if lower.contains("permission")
        || lower.contains("denied")
        || lower.contains("authorization")
        || lower.contains("access")
    {
        CameraError::PermissionDenied
    } else {
        CameraError::OpenFailed(message.to_string())
    }
}

/// Live camera stream bound once per session.
///
/// A background thread owns the device (nokhwa cameras are not `Send`)
/// and continuously overwrites a shared slot with the newest decoded
/// frame. [`CameraStream::latest_frame`] reads whatever is current,
/// which mirrors how a capture is taken from a running video feed.
pub struct CameraStream {
    /// Most recent frame, shared with the capture thread
    latest: Arc<Mutex<Option<Frame>>>,
    /// Signals the capture thread to shut down
    stop: Arc<AtomicBool>,
    /// Capture thread handle
    worker: Option<JoinHandle<()>>,
    settings: CameraSettings,
    /// Resolution the device actually delivered, known once started
    actual_resolution: Option<(u32, u32)>,
}

impl fmt::Debug for CameraStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraStream")
            .field("settings", &self.settings)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl CameraStream {
    /// Create a stream for the given settings.
    ///
    /// Validates that the device index exists; the device itself is not
    /// opened until [`CameraStream::start`].
    pub fn open(settings: CameraSettings) -> Result<Self, CameraError> {
        let devices = list_devices()?;
        if devices.is_empty() {
            return Err(CameraError::NoDevices);
        }
        if !devices.iter().any(|d| d.index == settings.device_index) {
            return Err(CameraError::DeviceNotFound(settings.device_index));
        }

        Ok(Self {
            latest: Arc::new(Mutex::new(None)),
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
            settings,
            actual_resolution: None,
        })
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Resolution the device delivered, or `None` before `start()`.
    pub fn actual_resolution(&self) -> Option<(u32, u32)> {
        self.actual_resolution
    }

    /// Open the device and start filling the frame slot.
    ///
    /// Blocks until the capture thread reports that the stream is live,
    /// so a successful return means frames are on the way.
    pub fn start(&mut self) -> Result<(), CameraError> {
        if self.is_running() {
            return Err(CameraError::AlreadyRunning);
        }

        self.stop.store(false, Ordering::SeqCst);

        let slot = Arc::clone(&self.latest);
        let stop = Arc::clone(&self.stop);
        let settings = self.settings.clone();

        // The thread reports startup outcome (and the negotiated
        // resolution) back over this channel before entering its loop.
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(u32, u32), CameraError>>();

        let handle = thread::spawn(move || {
            let index = CameraIndex::Index(settings.device_index);
            let wanted = nokhwa::utils::Resolution::new(settings.width, settings.height);

            // MJPEG is the most widely supported compressed format;
            // fall back to whatever the device offers.
            let attempts = [
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
                    CameraFormat::new(wanted, NokhwaFrameFormat::MJPEG, settings.fps),
                )),
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
                    CameraFormat::new(wanted, NokhwaFrameFormat::YUYV, settings.fps),
                )),
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
            ];

            let mut camera = None;
            let mut last_error = String::new();
            for requested in attempts {
                match Camera::new(index.clone(), requested) {
                    Ok(cam) => {
                        camera = Some(cam);
                        break;
                    }
                    Err(e) => last_error = e.to_string(),
                }
            }

            let mut camera = match camera {
                Some(cam) => cam,
                None => {
                    let _ = ready_tx.send(Err(classify_open_error(&last_error)));
                    return;
                }
            };

            if let Err(e) = camera.open_stream() {
                let _ = ready_tx.send(Err(CameraError::StreamFailed(e.to_string())));
                return;
            }

            let res = camera.resolution();
            let _ = ready_tx.send(Ok((res.width(), res.height())));
            log::info!(
                "Camera {} streaming at {}x{}",
                settings.device_index,
                res.width(),
                res.height()
            );

            while !stop.load(Ordering::Relaxed) {
                match camera.frame() {
                    Ok(buffer) => {
                        // Decoding handles MJPEG, YUYV, NV12 and friends.
                        if let Ok(decoded) = buffer.decode_image::<RgbFormat>() {
                            let resolution = buffer.resolution();
                            let frame = Frame {
                                data: decoded.into_raw(),
                                width: resolution.width(),
                                height: resolution.height(),
                            };
                            if let Ok(mut slot) = slot.lock() {
                                *slot = Some(frame);
                            }
                        }
                        // A frame that fails to decode is skipped; the
                        // next one usually succeeds.
                    }
                    Err(e) => {
                        log::warn!("Frame read failed: {}", e);
                        thread::sleep(Duration::from_millis(50));
                    }
                }
            }

            let _ = camera.stop_stream();
        });

        self.worker = Some(handle);

        match ready_rx.recv() {
            Ok(Ok(resolution)) => {
                self.actual_resolution = Some(resolution);
                Ok(())
            }
            Ok(Err(e)) => {
                self.join_worker();
                Err(e)
            }
            Err(_) => {
                self.join_worker();
                Err(CameraError::StreamFailed(
                    "capture thread exited before reporting readiness".to_string(),
                ))
            }
        }
    }

    /// The newest frame the stream has produced, if any.
    ///
    /// Returns `None` until the first frame arrives, and after the
    /// stream has been stopped without ever producing one.
    pub fn latest_frame(&self) -> Option<Frame> {
        self.latest.lock().ok()?.clone()
    }

    /// Block until a frame is available, up to `timeout`.
    ///
    /// Used by one-shot capture, where the device needs a short warmup
    /// before it delivers anything usable.
    pub fn wait_for_frame(&self, timeout: Duration) -> Result<Frame, CameraError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(frame) = self.latest_frame() {
                return Ok(frame);
            }
            if Instant::now() >= deadline {
                return Err(CameraError::FrameTimeout(timeout));
            }
            thread::sleep(Duration::from_millis(20));
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the capture thread and release the device.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.join_worker();
    }

    fn join_worker(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.stop();
    }
}
