//! Camera types and data structures.

use std::fmt;
use std::time::Instant;

/// Information about an available camera device.
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

/// Camera resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Low resolution (320x240), the default capture size
    pub const LOW: Resolution = Resolution {
        width: 320,
        height: 240,
    };

    /// Medium resolution (640x480)
    pub const MEDIUM: Resolution = Resolution {
        width: 640,
        height: 480,
    };

    /// High resolution (1280x720)
    pub const HIGH: Resolution = Resolution {
        width: 1280,
        height: 720,
    };
}

impl Default for Resolution {
    fn default() -> Self {
        Self::LOW
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Channel order of a frame's pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Bgr,
    Rgba,
    Bgra,
}

impl PixelFormat {
    /// Number of interleaved channels per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Rgb | PixelFormat::Bgr => 3,
            PixelFormat::Rgba | PixelFormat::Bgra => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        self.channels() == 4
    }

    /// True when red is stored in the first channel.
    pub fn is_red_first(self) -> bool {
        matches!(self, PixelFormat::Rgb | PixelFormat::Rgba)
    }
}

/// A captured camera frame.
///
/// Frames are immutable snapshots: the buffer always holds exactly
/// `width * height * channels` bytes in the order given by `format`.
#[derive(Debug, Clone)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    format: PixelFormat,
    timestamp: Instant,
}

impl Frame {
    /// Wrap a raw pixel buffer, stamping it with the current time.
    ///
    /// Returns `None` if the buffer length does not match the dimensions.
    pub fn from_raw(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Option<Self> {
        Self::from_raw_at(width, height, format, data, Instant::now())
    }

    /// Same as [`Frame::from_raw`] with an explicit capture timestamp.
    pub fn from_raw_at(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
        timestamp: Instant,
    ) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(format.channels())?;
        if data.len() != expected {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            format,
            timestamp,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Number of channels per pixel (3 or 4).
    pub fn channels(&self) -> usize {
        self.format.channels()
    }

    /// Bytes in one row of pixels.
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels()
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the frame and return its pixel buffer.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Mutable access for in-crate transforms that keep the layout intact.
    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Rebuild the frame with a new buffer and format, keeping size and timestamp.
    pub(crate) fn with_data(self, format: PixelFormat, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            self.width as usize * self.height as usize * format.channels()
        );
        Self {
            data,
            format,
            ..self
        }
    }
}

/// Settings for camera capture.
#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Camera device index
    pub device_index: u32,
    /// Requested capture resolution (best effort)
    pub resolution: Resolution,
    /// Requested device FPS (actual may vary)
    pub fps: u32,
    /// Mirror horizontally (selfie mode)
    pub mirror: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            device_index: 0,
            resolution: Resolution::default(),
            fps: 30,
            mirror: false,
        }
    }
}

/// Errors that can occur during camera operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// The device index is invalid, busy, or refused to stream.
    #[error("Camera device {index} is unavailable: {reason}")]
    DeviceUnavailable { index: u32, reason: String },

    /// The camera backend could not enumerate devices.
    #[error("Failed to query cameras: {0}")]
    QueryFailed(String),
}

impl CaptureError {
    pub(crate) fn unavailable(index: u32, reason: impl Into<String>) -> Self {
        CaptureError::DeviceUnavailable {
            index,
            reason: reason.into(),
        }
    }
}
