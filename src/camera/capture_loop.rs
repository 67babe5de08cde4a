//! Background capture thread implementation.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, FrameFormat as NokhwaFrameFormat, RequestedFormat,
    RequestedFormatType,
};
use nokhwa::Camera;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::frame_utils::{decode_to_rgb, mirror_horizontal};
use super::types::{CameraSettings, CaptureError, Frame, Resolution};

/// Single-slot buffer holding the newest undelivered frame.
pub type FrameSlot = Arc<Mutex<Option<Frame>>>;

/// What the worker reports once the device is streaming (or not).
pub type OpenReport = Result<(Resolution, u32), CaptureError>;

/// Run the capture loop in a background thread.
///
/// The camera is opened here rather than on the caller's thread because
/// nokhwa handles are not `Send` on every backend. Exactly one message is
/// sent on `info_tx` before any frame is captured.
pub fn run_capture_loop(
    settings: CameraSettings,
    slot: FrameSlot,
    stop: Arc<AtomicBool>,
    info_tx: Sender<OpenReport>,
) {
    let index = CameraIndex::Index(settings.device_index);

    let mut camera = match open_camera_with_fallback(&index, &settings) {
        Ok(cam) => cam,
        Err(e) => {
            let _ = info_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = info_tx.send(Err(CaptureError::unavailable(
            settings.device_index,
            format!("stream failed to start: {}", e),
        )));
        return;
    }

    let res = camera.resolution();
    let actual_res = Resolution {
        width: res.width(),
        height: res.height(),
    };
    let _ = info_tx.send(Ok((actual_res, camera.frame_rate())));

    // One device read at a time; the newest decoded frame replaces any
    // frame the display loop has not picked up yet.
    while !stop.load(Ordering::Relaxed) {
        if let Ok(raw_frame) = camera.frame() {
            if let Some(mut frame) = decode_to_rgb(&raw_frame) {
                if settings.mirror {
                    mirror_horizontal(&mut frame);
                }
                if let Ok(mut buf) = slot.lock() {
                    *buf = Some(frame);
                }
            }
            // Undecodable frames are skipped
        }

        thread::sleep(Duration::from_millis(1));
    }

    let _ = camera.stop_stream();
}

/// Try to open a camera with multiple format fallback strategies.
fn open_camera_with_fallback(
    index: &CameraIndex,
    settings: &CameraSettings,
) -> Result<Camera, CaptureError> {
    let requested_res =
        nokhwa::utils::Resolution::new(settings.resolution.width, settings.resolution.height);

    // Closest MJPEG, closest YUYV, then whatever the device offers.
    let format_attempts = [
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            requested_res,
            NokhwaFrameFormat::MJPEG,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(CameraFormat::new(
            requested_res,
            NokhwaFrameFormat::YUYV,
            settings.fps,
        ))),
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = None;

    for requested in format_attempts {
        match Camera::new(index.clone(), requested) {
            Ok(cam) => return Ok(cam),
            Err(e) => {
                log::debug!("Camera format attempt failed: {}", e);
                last_error = Some(e);
            }
        }
    }

    let reason = match last_error {
        Some(e) => describe_open_error(&e.to_string()),
        None => "no capture format accepted".to_string(),
    };
    Err(CaptureError::unavailable(settings.device_index, reason))
}

/// Turn a backend error message into a user-facing reason.
fn describe_open_error(msg: &str) -> String {
    let lower = msg.to_lowercase();
    if lower.contains("permission")
        || lower.contains("denied")
        || lower.contains("authorization")
    {
        "permission denied; grant camera access in your system privacy settings".to_string()
    } else if lower.contains("busy") || lower.contains("in use") {
        "device is in use by another process".to_string()
    } else {
        msg.to_string()
    }
}
