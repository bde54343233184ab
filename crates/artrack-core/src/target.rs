use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::{FeatureSet, Homography};

/// Opaque target identifier.
pub type TargetId = String;

/// A registered planar reference image.
///
/// Owned by the target registry. `features` is `None` until extraction has
/// run; the vocabulary only ever sees targets with extracted features.
#[derive(Clone, Debug)]
pub struct Target {
    pub id: TargetId,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub features: Option<FeatureSet>,
    /// Unix timestamp in milliseconds.
    pub created_at_ms: u64,
}

impl Target {
    /// Feature count, zero when features have not been extracted yet.
    pub fn feature_count(&self) -> usize {
        self.features.as_ref().map_or(0, |f| f.len())
    }
}

/// Serialized form of a [`Target`] for the persistent store.
///
/// Features are embedded so a target survives sessions without
/// re-extraction from the source image.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredTarget {
    pub id: TargetId,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub features: Option<FeatureSet>,
    pub created_at_ms: u64,
}

impl From<Target> for StoredTarget {
    fn from(t: Target) -> Self {
        Self {
            id: t.id,
            name: t.name,
            width: t.width,
            height: t.height,
            features: t.features,
            created_at_ms: t.created_at_ms,
        }
    }
}

impl From<StoredTarget> for Target {
    fn from(s: StoredTarget) -> Self {
        Self {
            id: s.id,
            name: s.name,
            width: s.width,
            height: s.height,
            features: s.features,
            created_at_ms: s.created_at_ms,
        }
    }
}

/// A successful per-frame detection.
#[derive(Clone, Debug)]
pub struct Detection {
    pub target_id: TargetId,
    /// Target corners in frame pixels: top-left, top-right, bottom-right,
    /// bottom-left.
    pub corners: [Point2<f32>; 4],
    /// Ratio-test survivors backing the homography.
    pub match_count: usize,
    /// `match_count / target_feature_count`, in [0, 1].
    pub score: f32,
    pub homography: Homography,
}

/// Why a sampled frame produced no detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissReason {
    /// The frame itself had no extractable features.
    NoFrameFeatures,
    /// No candidate passed matching + homography validation.
    NoValidCandidate,
}

impl std::fmt::Display for MissReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissReason::NoFrameFeatures => write!(f, "no frame features"),
            MissReason::NoValidCandidate => write!(f, "no valid detection"),
        }
    }
}

/// Outcome of one sampled frame. Ephemeral, never persisted.
#[derive(Clone, Debug)]
pub enum DetectionOutcome {
    Detected(Detection),
    Missed(MissReason),
}

impl DetectionOutcome {
    pub fn detection(&self) -> Option<&Detection> {
        match self {
            DetectionOutcome::Detected(d) => Some(d),
            DetectionOutcome::Missed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_target_round_trips_through_json() {
        let target = Target {
            id: "poster".into(),
            name: "Poster".into(),
            width: 320,
            height: 240,
            features: Some(FeatureSet::new()),
            created_at_ms: 1_700_000_000_000,
        };
        let stored: StoredTarget = target.clone().into();
        let json = serde_json::to_string(&stored).unwrap();
        let back: StoredTarget = serde_json::from_str(&json).unwrap();
        let restored: Target = back.into();
        assert_eq!(restored.id, target.id);
        assert_eq!(restored.width, 320);
        assert!(restored.features.is_some());
    }

    #[test]
    fn miss_reasons_render_stable_messages() {
        assert_eq!(MissReason::NoFrameFeatures.to_string(), "no frame features");
        assert_eq!(MissReason::NoValidCandidate.to_string(), "no valid detection");
    }
}
