//! Presentation surface the display loop renders into.

use crate::camera::{CaptureError, Frame, PixelFormat};
use crate::template::TemplateImage;

use super::controller::SessionState;

/// Where frames, templates and capture errors end up.
///
/// In the app this is a pair of GUI labels; tests plug in recorders.
pub trait PresentationSink {
    /// Channel order `show_frame` expects. Never carries alpha.
    fn pixel_format(&self) -> PixelFormat {
        PixelFormat::Rgb
    }

    /// Display one live frame, already in `pixel_format()`.
    fn show_frame(&mut self, frame: Frame);

    /// Display a static template image.
    fn show_template(&mut self, template: TemplateImage);

    /// Tell the user capture could not start.
    fn show_error(&mut self, error: &CaptureError);

    /// Capture was started or stopped.
    fn capture_state_changed(&mut self, _state: SessionState) {}
}
