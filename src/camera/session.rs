//! Capture session lifecycle: open, configure, read, close.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use super::capture_loop::{run_capture_loop, FrameSlot, OpenReport};
use super::device::list_devices;
use super::types::{CameraSettings, CaptureError, Frame, Resolution};

/// A single video source that can be opened and closed repeatedly.
///
/// Implementations must tolerate `close()` on a closed session and must
/// never treat a missing frame as an error.
pub trait CaptureSession {
    /// Acquire the device at `device_index`. No-op if already open.
    fn open(&mut self, device_index: u32) -> Result<(), CaptureError>;

    /// Request a preferred resolution for the next open.
    ///
    /// Best effort: the device may pick another supported size.
    fn configure(&mut self, resolution: Resolution);

    /// Pull the next available frame, or `None` if there is nothing new.
    fn read(&mut self) -> Option<Frame>;

    /// Release the device. Idempotent.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Camera session backed by nokhwa.
///
/// Opening spawns a worker thread that owns the device, decodes frames
/// and parks the newest one in a single-slot buffer. `read()` takes
/// whatever is in the slot, so it never blocks on hardware and each
/// frame is handed out at most once.
pub struct CameraSession {
    /// Newest undelivered frame (shared with capture thread)
    slot: FrameSlot,
    /// Capture thread handle, present while open
    capture_thread: Option<JoinHandle<()>>,
    /// Signal to stop capture thread
    stop_signal: Arc<AtomicBool>,
    /// Settings used for the next open
    settings: CameraSettings,
    /// Resolution negotiated by the device on the last open
    actual_resolution: Option<Resolution>,
    /// Frame rate negotiated by the device on the last open
    actual_fps: Option<u32>,
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("settings", &self.settings)
            .field("is_open", &self.is_open())
            .finish_non_exhaustive()
    }
}

impl CameraSession {
    /// Create a closed session. Nothing touches the device until `open`.
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            capture_thread: None,
            stop_signal: Arc::new(AtomicBool::new(false)),
            settings,
            actual_resolution: None,
            actual_fps: None,
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Resolution the device actually delivers.
    ///
    /// `None` until the session has been opened once. May differ from the
    /// configured resolution.
    pub fn actual_resolution(&self) -> Option<Resolution> {
        self.actual_resolution
    }

    pub fn actual_fps(&self) -> Option<u32> {
        self.actual_fps
    }

    fn join_worker(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.capture_thread.take() {
            let _ = handle.join();
        }
    }
}

impl CaptureSession for CameraSession {
    fn open(&mut self, device_index: u32) -> Result<(), CaptureError> {
        if self.is_open() {
            return Ok(());
        }
        // A worker that died on its own leaves a stale handle behind
        self.join_worker();

        let devices =
            list_devices().map_err(|e| CaptureError::unavailable(device_index, e.to_string()))?;
        if !devices.iter().any(|d| d.index == device_index) {
            return Err(CaptureError::unavailable(
                device_index,
                format!("no such device ({} camera(s) found)", devices.len()),
            ));
        }

        self.settings.device_index = device_index;
        self.stop_signal.store(false, Ordering::SeqCst);
        if let Ok(mut buf) = self.slot.lock() {
            *buf = None;
        }

        let slot = Arc::clone(&self.slot);
        let stop = Arc::clone(&self.stop_signal);
        let settings = self.settings.clone();
        let (info_tx, info_rx) = mpsc::channel::<OpenReport>();

        let handle = std::thread::Builder::new()
            .name("sift-cam-capture".into())
            .spawn(move || run_capture_loop(settings, slot, stop, info_tx))
            .map_err(|e| {
                CaptureError::unavailable(device_index, format!("failed to spawn worker: {}", e))
            })?;
        self.capture_thread = Some(handle);

        match info_rx.recv() {
            Ok(Ok((res, fps))) => {
                if res != self.settings.resolution {
                    log::info!(
                        "Camera {} substituted {} for requested {}",
                        device_index,
                        res,
                        self.settings.resolution
                    );
                }
                self.actual_resolution = Some(res);
                self.actual_fps = Some(fps);
                log::info!("Opened camera {} at {} @ {} fps", device_index, res, fps);
                Ok(())
            }
            Ok(Err(e)) => {
                self.join_worker();
                Err(e)
            }
            Err(_) => {
                self.join_worker();
                Err(CaptureError::unavailable(
                    device_index,
                    "capture thread terminated unexpectedly",
                ))
            }
        }
    }

    fn configure(&mut self, resolution: Resolution) {
        if self.is_open() && resolution != self.settings.resolution {
            log::debug!("Resolution {} applies on next open", resolution);
        }
        self.settings.resolution = resolution;
    }

    fn read(&mut self) -> Option<Frame> {
        if self.capture_thread.is_none() {
            return None;
        }
        self.slot.lock().ok()?.take()
    }

    fn close(&mut self) {
        if self.capture_thread.is_none() {
            return;
        }
        self.join_worker();
        if let Ok(mut buf) = self.slot.lock() {
            *buf = None;
        }
        log::info!("Released camera {}", self.settings.device_index);
    }

    fn is_open(&self) -> bool {
        self.capture_thread
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_invalid_device() {
        // Use a device index that is very unlikely to exist
        let mut session = CameraSession::new(CameraSettings::default());
        match session.open(999) {
            Err(CaptureError::DeviceUnavailable { index, .. }) => assert_eq!(index, 999),
            Err(other) => panic!("Expected DeviceUnavailable, got {:?}", other),
            Ok(()) => panic!("Device 999 should not exist"),
        }
        assert!(!session.is_open());
    }

    #[test]
    fn test_closed_session_reads_nothing() {
        let mut session = CameraSession::new(CameraSettings::default());
        assert!(session.read().is_none());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut session = CameraSession::new(CameraSettings::default());
        session.close();
        session.close();
        assert!(!session.is_open());
    }

    #[test]
    fn test_configure_updates_requested_resolution() {
        let mut session = CameraSession::new(CameraSettings::default());
        session.configure(Resolution::MEDIUM);
        assert_eq!(session.settings().resolution, Resolution::MEDIUM);
        assert!(session.actual_resolution().is_none());
    }
}
