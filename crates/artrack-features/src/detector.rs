use artrack_core::{
    Detection, DetectionOutcome, FeatureSet, GrayImageView, Homography, KeyPoint, MissReason,
    Target,
};
use nalgebra::Point2;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::brief::{compute_descriptor, keypoint_orientation};
use crate::fast::detect_corners;
use crate::matcher::{match_features, FeatureMatch};
use crate::params::{ConfigError, DetectorParams};
use crate::pyramid::build_pyramid;

/// RANSAC reprojection-error threshold in pixels.
const REPROJECTION_THRESHOLD: f64 = 5.0;
/// Fixed RANSAC iteration budget.
const RANSAC_ITERATIONS: usize = 200;
/// Fixed seed so homography estimation is reproducible.
const RANSAC_SEED: u64 = 0x7a41_7261_636b_2e72;

/// Feature detector: extraction, matching and pose recovery for one frame.
///
/// Stateless between calls apart from its parameters, so one instance can
/// score any number of candidate targets.
pub struct FeatureDetector {
    params: DetectorParams,
}

impl FeatureDetector {
    /// Construct a detector, rejecting invalid parameters up front.
    pub fn new(params: DetectorParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Swap in new parameters; they apply from the next operation.
    pub fn set_params(&mut self, params: DetectorParams) -> Result<(), ConfigError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    /// Extract keypoints + descriptors from a grayscale image.
    ///
    /// Runs FAST per pyramid level (single level for the `fast` family),
    /// computes oriented BRIEF descriptors, maps keypoints back to level-0
    /// coordinates, and caps the result at `max_features` strongest.
    /// A featureless image yields an empty set, not an error.
    pub fn extract_features(&self, img: &GrayImageView<'_>) -> FeatureSet {
        let octaves = if self.params.algorithm.uses_pyramid() {
            self.params.octaves
        } else {
            1
        };
        let pattern_scale = self.params.effective_pattern_scale();
        let with_orientation = self.params.algorithm.uses_orientation();

        let mut features = FeatureSet::new();
        for level in build_pyramid(img, octaves) {
            let view = level.image.as_view();
            for kp in detect_corners(&view, self.params.threshold) {
                let (x, y) = (kp.position.x as i32, kp.position.y as i32);
                let angle = if with_orientation {
                    keypoint_orientation(&view, x, y)
                } else {
                    0.0
                };
                let descriptor = compute_descriptor(&view, x, y, angle, pattern_scale);
                features.keypoints.push(KeyPoint::new(
                    kp.position.x * level.scale,
                    kp.position.y * level.scale,
                    kp.response,
                ));
                features.descriptors.push_row(&descriptor);
            }
        }

        features.cap(self.params.max_features);
        log::debug!(
            "extracted {} features ({} octaves, threshold {})",
            features.len(),
            octaves,
            self.params.threshold
        );
        features
    }

    /// Ratio-test matching with the configured threshold.
    pub fn match_features(
        &self,
        query: &FeatureSet,
        target: &FeatureSet,
    ) -> Vec<FeatureMatch> {
        match_features(
            &query.descriptors,
            &target.descriptors,
            self.params.ratio_threshold,
        )
    }

    /// Estimate the target-to-frame homography from accepted matches.
    ///
    /// Returns `None` below `min_matches` correspondences (a normal
    /// "insufficient evidence" outcome) or when RANSAC finds no model with
    /// at least four inliers. The sampler is deterministically seeded.
    pub fn compute_homography(
        &self,
        query: &[KeyPoint],
        target: &[KeyPoint],
        matches: &[FeatureMatch],
    ) -> Option<Homography> {
        if matches.len() < self.params.min_matches {
            return None;
        }

        let src: Vec<Point2<f32>> = matches
            .iter()
            .map(|m| target[m.target_idx].position)
            .collect();
        let dst: Vec<Point2<f32>> = matches
            .iter()
            .map(|m| query[m.query_idx].position)
            .collect();

        ransac_homography(&src, &dst)
    }

    /// Sanity checks on an estimated homography.
    ///
    /// Rejects orientation flips / degenerate maps (non-positive diagonal
    /// product) and near-singular perspective divides (`|h22| < 0.01`).
    /// The 3x3 shape is guaranteed by the type.
    pub fn validate_homography(h: &Homography) -> bool {
        let diag = h.at(0, 0) * h.at(1, 1) * h.at(2, 2);
        if diag <= 0.0 {
            return false;
        }
        h.at(2, 2).abs() >= 0.01
    }

    /// Project the target's pixel corners into the frame.
    ///
    /// Order: top-left, top-right, bottom-right, bottom-left.
    pub fn target_corners(h: &Homography, width: u32, height: u32) -> [Point2<f32>; 4] {
        let (w, hgt) = (width as f32, height as f32);
        [
            h.apply(Point2::new(0.0, 0.0)),
            h.apply(Point2::new(w, 0.0)),
            h.apply(Point2::new(w, hgt)),
            h.apply(Point2::new(0.0, hgt)),
        ]
    }

    /// Extract frame features once, then score every candidate.
    pub fn detect(&self, frame: &GrayImageView<'_>, candidates: &[&Target]) -> DetectionOutcome {
        let frame_features = self.extract_features(frame);
        self.score_candidates(&frame_features, candidates)
    }

    /// Score candidates against already-extracted frame features.
    ///
    /// Candidates are visited in the given order and a later candidate
    /// replaces the incumbent only with a strictly higher score, so ties go
    /// to the earlier entry. Used directly by the tracking coordinator,
    /// which shares one extraction pass between the vocabulary query and
    /// this scoring loop.
    pub fn score_candidates(
        &self,
        frame_features: &FeatureSet,
        candidates: &[&Target],
    ) -> DetectionOutcome {
        if frame_features.is_empty() {
            return DetectionOutcome::Missed(MissReason::NoFrameFeatures);
        }

        let mut best: Option<Detection> = None;
        for target in candidates {
            let Some(features) = &target.features else {
                continue;
            };
            if features.is_empty() {
                continue;
            }

            let matches = self.match_features(frame_features, features);
            let Some(homography) =
                self.compute_homography(&frame_features.keypoints, &features.keypoints, &matches)
            else {
                continue;
            };
            if !Self::validate_homography(&homography) {
                log::debug!("target {}: homography rejected", target.id);
                continue;
            }

            let score = matches.len() as f32 / features.len() as f32;
            if best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(Detection {
                    target_id: target.id.clone(),
                    corners: Self::target_corners(&homography, target.width, target.height),
                    match_count: matches.len(),
                    score,
                    homography,
                });
            }
        }

        match best {
            Some(d) => {
                log::debug!(
                    "detected {} (matches {}, score {:.3})",
                    d.target_id,
                    d.match_count,
                    d.score
                );
                DetectionOutcome::Detected(d)
            }
            None => DetectionOutcome::Missed(MissReason::NoValidCandidate),
        }
    }
}

/// RANSAC over 4-point DLT samples, refit on the final inlier set.
fn ransac_homography(src: &[Point2<f32>], dst: &[Point2<f32>]) -> Option<Homography> {
    debug_assert_eq!(src.len(), dst.len());
    let n = src.len();
    if n < 4 {
        return None;
    }

    let mut rng = Pcg64::seed_from_u64(RANSAC_SEED);
    let mut best_inliers: Vec<usize> = Vec::new();
    let mut best_model: Option<Homography> = None;

    for _ in 0..RANSAC_ITERATIONS {
        let idx = rand::seq::index::sample(&mut rng, n, 4);
        let sample_src: Vec<_> = idx.iter().map(|i| src[i]).collect();
        let sample_dst: Vec<_> = idx.iter().map(|i| dst[i]).collect();
        let Some(model) = Homography::estimate(&sample_src, &sample_dst) else {
            continue;
        };

        let inliers = inlier_indices(&model, src, dst);
        if inliers.len() > best_inliers.len() {
            best_inliers = inliers;
            best_model = Some(model);
            // every correspondence already agrees
            if best_inliers.len() == n {
                break;
            }
        }
    }

    if best_inliers.len() < 4 {
        return None;
    }

    let in_src: Vec<_> = best_inliers.iter().map(|&i| src[i]).collect();
    let in_dst: Vec<_> = best_inliers.iter().map(|&i| dst[i]).collect();
    Homography::estimate(&in_src, &in_dst).or(best_model)
}

fn inlier_indices(h: &Homography, src: &[Point2<f32>], dst: &[Point2<f32>]) -> Vec<usize> {
    src.iter()
        .zip(dst.iter())
        .enumerate()
        .filter_map(|(i, (s, d))| {
            let p = h.apply(*s);
            let dx = (p.x - d.x) as f64;
            let dy = (p.y - d.y) as f64;
            ((dx * dx + dy * dy).sqrt() <= REPROJECTION_THRESHOLD).then_some(i)
        })
        .collect()
}
