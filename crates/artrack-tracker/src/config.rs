use serde::{Deserialize, Serialize};

use artrack_features::DetectorParams;
use artrack_vocab::VocabParams;

use crate::error::TrackError;

/// Complete tracking configuration.
///
/// Composes the per-component params plus the frame-sampling interval.
/// Everything is serde so hosts can ship configuration as JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub detector: DetectorParams,
    pub vocabulary: VocabParams,
    /// Run detection on every Nth processed frame.
    pub detection_interval: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            detector: DetectorParams::default(),
            vocabulary: VocabParams::default(),
            detection_interval: 10,
        }
    }
}

impl TrackerConfig {
    /// Reject invalid values before they reach the pipeline.
    pub fn validate(&self) -> Result<(), TrackError> {
        self.detector.validate()?;
        self.vocabulary.validate()?;
        if self.detection_interval == 0 {
            return Err(TrackError::InvalidInterval);
        }
        Ok(())
    }
}

/// Partial configuration update; `None` fields keep their current value.
///
/// This is the single mutation entry point for live tunables — components
/// pick the merged values up on their next operation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConfigPatch {
    pub detector: Option<DetectorParams>,
    pub vocabulary: Option<VocabParams>,
    pub detection_interval: Option<u32>,
}

impl ConfigPatch {
    /// Shallow-merge into `config`.
    pub fn apply(&self, config: &mut TrackerConfig) {
        if let Some(detector) = &self.detector {
            config.detector = detector.clone();
        }
        if let Some(vocabulary) = self.vocabulary {
            config.vocabulary = vocabulary;
        }
        if let Some(interval) = self.detection_interval {
            config.detection_interval = interval;
        }
    }
}
