//! Core types for planar AR image tracking.
//!
//! This crate is intentionally small: keypoints, binary descriptor storage,
//! grayscale image views, the homography type and its DLT estimation, and
//! the target / detection-result data model shared by the detector, the
//! vocabulary index and the tracking coordinator. It does *not* depend on
//! any concrete feature detector.

mod feature;
mod homography;
mod image;
pub mod logger;
mod target;

pub use feature::{hamming_distance, DescriptorMatrix, FeatureSet, KeyPoint, DESCRIPTOR_BYTES};
pub use homography::Homography;
pub use image::{rgba_to_gray, sample_bilinear, GrayImage, GrayImageView};
pub use target::{
    Detection, DetectionOutcome, MissReason, StoredTarget, Target, TargetId,
};
