//! Frame decoding and pixel-layout transforms.

use nokhwa::pixel_format::RgbFormat;

use super::types::{Frame, PixelFormat, Resolution};

/// Decode a nokhwa buffer (MJPEG, YUYV, NV12, ...) into an RGB frame.
///
/// Returns `None` if the buffer cannot be decoded.
pub fn decode_to_rgb(buffer: &nokhwa::Buffer) -> Option<Frame> {
    let decoded = match buffer.decode_image::<RgbFormat>() {
        Ok(decoded) => decoded,
        Err(e) => {
            log::debug!("Failed to decode camera buffer: {}", e);
            return None;
        }
    };
    let reported = buffer.resolution();
    let reported = Resolution {
        width: reported.width(),
        height: reported.height(),
    };

    let (width, height) = (decoded.width(), decoded.height());
    rgb_frame(reported, width, height, decoded.into_raw())
}

/// Wrap decoded RGB pixels, trusting the decoder's dimensions over the
/// size the buffer header reports.
fn rgb_frame(reported: Resolution, width: u32, height: u32, rgb: Vec<u8>) -> Option<Frame> {
    if (width, height) != (reported.width, reported.height) {
        log::debug!(
            "Buffer reports {} but decoded to {}x{}",
            reported,
            width,
            height
        );
    }
    let len = rgb.len();
    let frame = Frame::from_raw(width, height, PixelFormat::Rgb, rgb);
    if frame.is_none() {
        log::debug!("Dropping {}x{} frame with {} bytes", width, height, len);
    }
    frame
}

/// Convert a frame into the channel order `target` expects.
///
/// Alpha is dropped when the target has none and set opaque when the
/// source has none. A frame already in `target` is returned untouched.
pub fn convert_format(frame: Frame, target: PixelFormat) -> Frame {
    let source = frame.format();
    if source == target {
        return frame;
    }

    let src_channels = source.channels();
    let dst_channels = target.channels();
    let swap = source.is_red_first() != target.is_red_first();
    let pixels = frame.width() as usize * frame.height() as usize;

    let mut out = Vec::with_capacity(pixels * dst_channels);
    for px in frame.data().chunks_exact(src_channels) {
        let (a, b, c) = (px[0], px[1], px[2]);
        if swap {
            out.extend_from_slice(&[c, b, a]);
        } else {
            out.extend_from_slice(&[a, b, c]);
        }
        if dst_channels == 4 {
            out.push(if src_channels == 4 { px[3] } else { u8::MAX });
        }
    }

    frame.with_data(target, out)
}

/// Mirror a frame horizontally (flip left-right) for selfie mode.
pub fn mirror_horizontal(frame: &mut Frame) {
    let width = frame.width() as usize;
    let bpp = frame.channels();
    let stride = frame.stride();
    if stride == 0 {
        return;
    }

    for row in frame.data_mut().chunks_exact_mut(stride) {
        for x in 0..width / 2 {
            let left = x * bpp;
            let right = (width - 1 - x) * bpp;
            for i in 0..bpp {
                row.swap(left + i, right + i);
            }
        }
    }
}
