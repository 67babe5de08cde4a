//! Template image browsing and loading.
//!
//! Loading a template is independent of the camera: it never touches the
//! capture session and works whether the display loop is running or not.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::display::PresentationSink;

/// Extensions offered by the file dialog.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "webp"];

/// A decoded static image, stored as tightly packed RGB.
#[derive(Clone, PartialEq, Eq)]
pub struct TemplateImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// RGB pixels, `width * height * 3` bytes
    pub rgb: Vec<u8>,
}

impl fmt::Debug for TemplateImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateImage")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Errors that can occur while loading a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Failed to load template image '{}': {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Something that lets the user pick an image file.
pub trait FileBrowser {
    /// Returns `None` when the user cancels.
    fn pick_image(&mut self) -> Option<PathBuf>;
}

/// Native file dialog.
#[derive(Debug, Default)]
pub struct DialogBrowser {
    last_dir: Option<PathBuf>,
}

impl FileBrowser for DialogBrowser {
    fn pick_image(&mut self) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new()
            .set_title("Select template image")
            .add_filter("Images", IMAGE_EXTENSIONS)
            .add_filter("All files", &["*"]);
        if let Some(dir) = &self.last_dir {
            dialog = dialog.set_directory(dir);
        }

        let picked = dialog.pick_file()?;
        self.last_dir = picked.parent().map(Path::to_path_buf);
        Some(picked)
    }
}

/// Decode an image file into RGB.
pub fn load_template(path: &Path) -> Result<TemplateImage, TemplateError> {
    let decoded = image::open(path).map_err(|source| TemplateError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let rgb = decoded.to_rgb8();

    Ok(TemplateImage {
        path: path.to_path_buf(),
        width: rgb.width(),
        height: rgb.height(),
        rgb: rgb.into_raw(),
    })
}

/// Load `path` and hand it to the sink.
pub fn show_template<P: PresentationSink>(path: &Path, sink: &mut P) -> Result<(), TemplateError> {
    let template = load_template(path)?;
    log::info!(
        "Loaded template image file: {} ({}x{})",
        path.display(),
        template.width,
        template.height
    );
    sink.show_template(template);
    Ok(())
}

/// Ask the user for a template and display it.
///
/// Returns the chosen path, or `None` if the dialog was cancelled, in which
/// case the sink is not called.
pub fn browse_template<B, P>(browser: &mut B, sink: &mut P) -> Result<Option<PathBuf>, TemplateError>
where
    B: FileBrowser,
    P: PresentationSink,
{
    let Some(path) = browser.pick_image() else {
        log::debug!("Template selection cancelled");
        return Ok(None);
    };
    show_template(&path, sink)?;
    Ok(Some(path))
}
