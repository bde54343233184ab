use serde::{Deserialize, Serialize};

/// Detector algorithm family.
///
/// All three share the FAST + oriented-BRIEF pipeline; the family selects
/// which stages run and how the sampling pattern is scaled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Single scale, unoriented descriptors. Cheapest, not scale invariant.
    Fast,
    /// Scale pyramid plus intensity-centroid orientation.
    Orb,
    /// Pyramid, orientation and a configurable sampling-pattern scale.
    Brisk,
}

impl Algorithm {
    /// Resolve an algorithm from its configuration name.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name {
            "fast" => Ok(Algorithm::Fast),
            "orb" => Ok(Algorithm::Orb),
            "brisk" => Ok(Algorithm::Brisk),
            other => Err(ConfigError::UnknownAlgorithm(other.to_string())),
        }
    }

    pub(crate) fn uses_pyramid(self) -> bool {
        !matches!(self, Algorithm::Fast)
    }

    pub(crate) fn uses_orientation(self) -> bool {
        !matches!(self, Algorithm::Fast)
    }
}

/// Parameters for the feature detector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectorParams {
    pub algorithm: Algorithm,

    /// FAST segment-test intensity threshold.
    pub threshold: u8,

    /// Number of pyramid octaves (levels), each 1.2x smaller. Ignored by
    /// the `fast` family.
    pub octaves: u32,

    /// Scale applied to the BRIEF sampling pattern. Only the `brisk`
    /// family reads it; the others use 1.0.
    pub pattern_scale: f32,

    /// Cap on keypoints kept per image, strongest first.
    pub max_features: usize,

    /// Lowe ratio threshold, in [0.5, 1.0].
    pub ratio_threshold: f32,

    /// Minimal ratio-test survivors before a homography is attempted.
    /// Floor of 4 (a homography needs four correspondences).
    pub min_matches: usize,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Orb,
            threshold: 20,
            octaves: 4,
            pattern_scale: 1.0,
            max_features: 500,
            ratio_threshold: 0.75,
            min_matches: 12,
        }
    }
}

impl DetectorParams {
    /// Reject out-of-domain tunables before the pipeline runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_features == 0 {
            return Err(ConfigError::InvalidTunable {
                name: "max_features",
                value: "0".into(),
                expected: "> 0",
            });
        }
        if self.octaves == 0 {
            return Err(ConfigError::InvalidTunable {
                name: "octaves",
                value: self.octaves.to_string(),
                expected: ">= 1",
            });
        }
        if !(0.5..=1.0).contains(&self.ratio_threshold) {
            return Err(ConfigError::InvalidTunable {
                name: "ratio_threshold",
                value: self.ratio_threshold.to_string(),
                expected: "in [0.5, 1.0]",
            });
        }
        if self.min_matches < 4 {
            return Err(ConfigError::InvalidTunable {
                name: "min_matches",
                value: self.min_matches.to_string(),
                expected: ">= 4",
            });
        }
        if !self.pattern_scale.is_finite() || self.pattern_scale <= 0.0 {
            return Err(ConfigError::InvalidTunable {
                name: "pattern_scale",
                value: self.pattern_scale.to_string(),
                expected: "> 0",
            });
        }
        Ok(())
    }

    /// Pattern scale actually applied for this algorithm family.
    pub(crate) fn effective_pattern_scale(&self) -> f32 {
        match self.algorithm {
            Algorithm::Brisk => self.pattern_scale,
            _ => 1.0,
        }
    }
}

/// Errors raised at configuration-validation time.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unknown detector algorithm: {0:?}")]
    UnknownAlgorithm(String),

    #[error("invalid tunable {name}={value} (expected {expected})")]
    InvalidTunable {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}
