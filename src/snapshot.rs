//! Still-image capture: renders a raw camera frame onto the fixed-size
//! capture canvas and encodes it as JPEG for upload.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, RgbImage};

use crate::camera::Frame;

/// Width of the capture canvas in pixels.
///
/// Every upload is rendered at this fixed size regardless of the
/// camera's native resolution.
pub const CANVAS_WIDTH: u32 = 640;

/// Height of the capture canvas in pixels.
pub const CANVAS_HEIGHT: u32 = 480;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Errors that can occur while encoding a capture.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Frame buffer has {actual} bytes, expected {expected} for {width}x{height} RGB")]
    BadFrame {
        expected: usize,
        actual: usize,
        width: u32,
        height: u32,
    },

    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Render a frame onto the capture canvas and encode it as JPEG bytes.
///
/// The frame is scaled to [`CANVAS_WIDTH`]x[`CANVAS_HEIGHT`] first, so
/// the uploaded image always has the same dimensions.
pub fn encode_capture(frame: &Frame, quality: u8) -> Result<Vec<u8>, SnapshotError> {
    let expected = frame.width as usize * frame.height as usize * 3;
    if frame.data.len() != expected {
        return Err(SnapshotError::BadFrame {
            expected,
            actual: frame.data.len(),
            width: frame.width,
            height: frame.height,
        });
    }

    let rgb = RgbImage::from_raw(frame.width, frame.height, frame.data.clone()).ok_or(
        SnapshotError::BadFrame {
            expected,
            actual: frame.data.len(),
            width: frame.width,
            height: frame.height,
        },
    )?;

    let canvas = if frame.width == CANVAS_WIDTH && frame.height == CANVAS_HEIGHT {
        rgb
    } else {
        image::imageops::resize(&rgb, CANVAS_WIDTH, CANVAS_HEIGHT, FilterType::Triangle)
    };

    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), quality);
    encoder.encode(
        canvas.as_raw(),
        CANVAS_WIDTH,
        CANVAS_HEIGHT,
        ExtendedColorType::Rgb8,
    )?;

    log::debug!(
        "Encoded {}x{} frame to {} byte JPEG",
        frame.width,
        frame.height,
        jpeg.len()
    );

    Ok(jpeg)
}
