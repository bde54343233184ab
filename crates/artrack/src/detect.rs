//! End-to-end helpers bridging `image` buffers and camera frames to the
//! tracker's lightweight luma views.

use artrack_core::{rgba_to_gray, FeatureSet, GrayImage, GrayImageView};
use artrack_features::FeatureDetector;
use artrack_tracker::{TargetStore, TrackError, Tracker};

/// Errors produced by the high-level facade helpers.
#[derive(thiserror::Error, Debug)]
pub enum DetectError {
    #[error("invalid grayscale image buffer length (expected {expected} bytes, got {got})")]
    InvalidGrayBuffer { expected: usize, got: usize },

    #[error("invalid RGBA frame buffer length (expected {expected} bytes, got {got})")]
    InvalidRgbaBuffer { expected: usize, got: usize },

    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: u32, height: u32 },

    #[error(transparent)]
    Track(#[from] TrackError),
}

/// Convert an `image::GrayImage` into the lightweight `artrack-core` view type.
pub fn gray_view(img: &::image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Build an `image::GrayImage` from a raw grayscale buffer.
pub fn gray_image_from_slice(
    width: u32,
    height: u32,
    pixels: &[u8],
) -> Result<::image::GrayImage, DetectError> {
    let Some(expected) = (width as usize).checked_mul(height as usize) else {
        return Err(DetectError::InvalidDimensions { width, height });
    };
    if expected == 0 {
        return Err(DetectError::InvalidDimensions { width, height });
    }
    if pixels.len() != expected {
        return Err(DetectError::InvalidGrayBuffer {
            expected,
            got: pixels.len(),
        });
    }
    ::image::GrayImage::from_raw(width, height, pixels.to_vec())
        .ok_or(DetectError::InvalidDimensions { width, height })
}

/// Convert a raw RGBA camera frame to the tracker's luma buffer.
pub fn frame_from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<GrayImage, DetectError> {
    let w = width as usize;
    let h = height as usize;
    rgba_to_gray(w, h, rgba).ok_or(DetectError::InvalidRgbaBuffer {
        expected: w * h * 4,
        got: rgba.len(),
    })
}

/// Extract features from an `image::GrayImage`.
pub fn extract_features(detector: &FeatureDetector, img: &::image::GrayImage) -> FeatureSet {
    detector.extract_features(&gray_view(img))
}

/// Register a target from an `image::GrayImage`.
pub fn add_target_from_image<S: TargetStore>(
    tracker: &mut Tracker<S>,
    id: impl Into<String>,
    name: impl Into<String>,
    img: &::image::GrayImage,
) -> Result<(), DetectError> {
    tracker.add_target(id, name, &gray_view(img))?;
    Ok(())
}

/// Feed one raw RGBA camera frame into the tracking loop.
pub fn process_rgba_frame<S: TargetStore>(
    tracker: &mut Tracker<S>,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> Result<(), DetectError> {
    let frame = frame_from_rgba(width, height, rgba)?;
    tracker.process_frame(&frame.as_view());
    Ok(())
}
