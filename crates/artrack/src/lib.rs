//! High-level facade crate for the `artrack-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the underlying tracking crates
//! - (feature-gated) end-to-end helpers that adapt `image::GrayImage` and
//!   raw camera buffers to the tracker's lightweight luma views.
//!
//! ## Quickstart
//!
//! ```no_run
//! use artrack::{MemoryStore, Tracker, TrackerConfig};
//! use image::ImageReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let poster = ImageReader::open("poster.png")?.decode()?.to_luma8();
//!
//! let mut tracker = Tracker::new(TrackerConfig::default(), MemoryStore::new())?;
//! tracker.add_target("poster", "Poster", &artrack::detect::gray_view(&poster))?;
//!
//! tracker.start(|outcome| {
//!     if let Some(detection) = outcome.detection() {
//!         println!("found {} ({} matches)", detection.target_id, detection.match_count);
//!     }
//! });
//! // feed tracker.process_frame(..) from the camera loop
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `artrack::core`: shared types (keypoints, descriptors, homographies, images, targets).
//! - `artrack::features`: feature extraction, descriptor matching, RANSAC homography.
//! - `artrack::vocab`: bag-of-words vocabulary for candidate ranking.
//! - `artrack::tracker`: the frame-sampling coordinator, registry and store seam.
//! - `artrack::detect` (feature `image`): adapters from `image::GrayImage` and raw buffers.

pub use artrack_core as core;
pub use artrack_features as features;
pub use artrack_tracker as tracker;
pub use artrack_vocab as vocab;

pub use artrack_core::{
    Detection, DetectionOutcome, FeatureSet, GrayImage, GrayImageView, Homography, MissReason,
    Target, TargetId,
};
pub use artrack_features::{Algorithm, DetectorParams, FeatureDetector};
pub use artrack_tracker::{
    ConfigPatch, MemoryStore, PoseSink, TargetStore, TrackError, Tracker, TrackerConfig,
    TrackerState,
};
pub use artrack_vocab::VocabParams;

#[cfg(feature = "image")]
pub mod detect;
