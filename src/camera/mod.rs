//! Camera capture module for webcam access and frame capture.

mod capture_loop;
mod device;
mod frame_utils;
mod session;
mod types;

pub use device::list_devices;
pub use frame_utils::{convert_format, mirror_horizontal};
pub use session::{CameraSession, CaptureSession};
pub use types::{CameraInfo, CameraSettings, CaptureError, Frame, PixelFormat, Resolution};
