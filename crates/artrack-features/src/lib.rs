//! Feature extraction, descriptor matching and homography-based pose
//! recovery for planar AR target tracking.
//!
//! The pipeline is FAST segment-test corners plus oriented BRIEF binary
//! descriptors, exposed through three algorithm families (`fast`, `orb`,
//! `brisk`) that trade speed against scale invariance. Matching is 2-NN
//! Hamming search filtered by Lowe's ratio test; pose recovery is RANSAC
//! over 4-point DLT homographies with a deterministic sampler.

mod brief;
mod detector;
mod fast;
mod matcher;
mod params;
mod pyramid;

pub use detector::FeatureDetector;
pub use matcher::{match_features, FeatureMatch};
pub use params::{Algorithm, ConfigError, DetectorParams};
