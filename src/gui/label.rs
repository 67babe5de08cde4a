//! Image labels backed by egui textures.

use egui::{ColorImage, TextureHandle, TextureOptions};
use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::camera::{CaptureError, Frame, PixelFormat};
use crate::display::{PresentationSink, SessionState};
use crate::template::TemplateImage;

/// One image slot in the window. Pixels arrive on the sink side and are
/// uploaded to the GPU on the next paint.
#[derive(Default)]
pub struct ImageLabel {
    pending: Option<RgbImage>,
    texture: Option<TextureHandle>,
}

impl ImageLabel {
    /// Queue RGB pixels for display. Buffers of the wrong length are dropped.
    pub fn set_rgb(&mut self, width: u32, height: u32, rgb: &[u8]) {
        match RgbImage::from_raw(width, height, rgb.to_vec()) {
            Some(image) => self.pending = Some(image),
            None => log::debug!("Dropping {}x{} image with {} bytes", width, height, rgb.len()),
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Upload pending pixels, reusing the existing texture when possible.
    ///
    /// Images larger than the backend's maximum texture side are scaled
    /// down to fit first.
    pub fn upload(&mut self, ctx: &egui::Context, name: &str) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let max_side = ctx.input(|i| i.max_texture_side);
        let fitted = fit_to_side(pending, max_side);
        let image = ColorImage::from_rgb(
            [fitted.width() as usize, fitted.height() as usize],
            fitted.as_raw(),
        );
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => self.texture = Some(ctx.load_texture(name, image, TextureOptions::LINEAR)),
        }
    }

    pub fn texture(&self) -> Option<&TextureHandle> {
        self.texture.as_ref()
    }
}

/// Shrink `image` so neither side exceeds `max_side`, keeping aspect ratio.
fn fit_to_side(image: RgbImage, max_side: usize) -> RgbImage {
    let (width, height) = image.dimensions();
    let longest = width.max(height) as u64;
    let max_side = max_side.max(1) as u64;
    if longest <= max_side {
        return image;
    }

    let scale = |side: u32| ((side as u64 * max_side / longest) as u32).max(1);
    let (new_w, new_h) = (scale(width), scale(height));
    log::debug!("Scaling {}x{} image to {}x{} for upload", width, height, new_w, new_h);
    imageops::resize(&image, new_w, new_h, FilterType::Triangle)
}

/// The camera and template labels plus the status line.
pub struct LabelSink {
    pub camera: ImageLabel,
    pub template: ImageLabel,
    pub template_name: Option<String>,
    pub status: String,
    pub status_is_error: bool,
    pub state: SessionState,
    pub frame_size: Option<(u32, u32)>,
}

impl Default for LabelSink {
    fn default() -> Self {
        Self {
            camera: ImageLabel::default(),
            template: ImageLabel::default(),
            template_name: None,
            status: "Camera stopped".to_string(),
            status_is_error: false,
            state: SessionState::Stopped,
            frame_size: None,
        }
    }
}

impl LabelSink {
    pub fn set_status(&mut self, status: impl Into<String>, is_error: bool) {
        self.status = status.into();
        self.status_is_error = is_error;
    }

    pub fn upload(&mut self, ctx: &egui::Context) {
        self.camera.upload(ctx, "camera_label");
        self.template.upload(ctx, "template_label");
    }
}

impl PresentationSink for LabelSink {
    fn pixel_format(&self) -> PixelFormat {
        PixelFormat::Rgb
    }

    fn show_frame(&mut self, frame: Frame) {
        self.frame_size = Some((frame.width(), frame.height()));
        self.camera.set_rgb(frame.width(), frame.height(), frame.data());
    }

    fn show_template(&mut self, template: TemplateImage) {
        self.template
            .set_rgb(template.width, template.height, &template.rgb);
        self.template_name = template
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
    }

    fn show_error(&mut self, error: &CaptureError) {
        self.set_status(error.to_string(), true);
    }

    fn capture_state_changed(&mut self, state: SessionState) {
        self.state = state;
        let status = match state {
            SessionState::Running => "Camera running",
            SessionState::Stopped => "Camera stopped",
        };
        self.set_status(status, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_frame_becomes_pending_camera_image() {
        let mut sink = LabelSink::default();
        let frame = Frame::from_raw(2, 1, PixelFormat::Rgb, vec![0; 6]).unwrap();
        sink.show_frame(frame);
        assert!(sink.camera.has_pending());
        assert!(!sink.template.has_pending());
        assert_eq!(sink.frame_size, Some((2, 1)));
    }

    #[test]
    fn test_template_sets_name() {
        let mut sink = LabelSink::default();
        sink.show_template(TemplateImage {
            path: PathBuf::from("/tmp/box.png"),
            width: 1,
            height: 1,
            rgb: vec![1, 2, 3],
        });
        assert!(sink.template.has_pending());
        assert_eq!(sink.template_name.as_deref(), Some("box.png"));
    }

    #[test]
    fn test_fit_to_side_keeps_small_images() {
        let image = RgbImage::new(640, 480);
        let fitted = fit_to_side(image, 8192);
        assert_eq!(fitted.dimensions(), (640, 480));
    }

    #[test]
    fn test_fit_to_side_scales_longest_side() {
        let image = RgbImage::new(16000, 4000);
        let fitted = fit_to_side(image, 8000);
        assert_eq!(fitted.dimensions(), (8000, 2000));
    }

    #[test]
    fn test_oversized_template_uploads_within_texture_limit() {
        let ctx = egui::Context::default();
        let mut sink = LabelSink::default();
        sink.show_template(TemplateImage {
            path: PathBuf::from("/tmp/panorama.png"),
            width: 9000,
            height: 1,
            rgb: vec![128; 9000 * 3],
        });

        let input = egui::RawInput {
            max_texture_side: Some(8192),
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| sink.upload(ctx));

        let texture = sink.template.texture().expect("template texture uploaded");
        assert_eq!(texture.size(), [8192, 1]);
        assert!(!sink.template.has_pending());
    }

    #[test]
    fn test_error_and_state_update_status() {
        let mut sink = LabelSink::default();
        sink.show_error(&CaptureError::DeviceUnavailable {
            index: 0,
            reason: "busy".to_string(),
        });
        assert!(sink.status.contains("unavailable"));
        assert!(sink.status_is_error);
        assert_eq!(sink.state, SessionState::Stopped);

        sink.capture_state_changed(SessionState::Running);
        assert_eq!(sink.state, SessionState::Running);
        assert_eq!(sink.status, "Camera running");
        assert!(!sink.status_is_error);
    }
}
