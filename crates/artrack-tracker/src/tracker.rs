use std::time::{SystemTime, UNIX_EPOCH};

use artrack_core::{
    Detection, DetectionOutcome, FeatureSet, GrayImageView, MissReason, Target, TargetId,
};
use artrack_features::FeatureDetector;
use artrack_vocab::VocabularyIndex;

use crate::config::{ConfigPatch, TrackerConfig};
use crate::error::TrackError;
use crate::registry::TargetRegistry;
use crate::store::TargetStore;

/// Coordinator lifecycle.
///
/// An uninitialized tracker is simply a value that has not been
/// constructed; [`Tracker::new`] performs initialization, so the enum
/// starts at `Initialized`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerState {
    Initialized,
    Tracking,
    Stopped,
}

/// Rendering collaborator: receives the winning pose every sampled frame.
pub trait PoseSink {
    fn set_target(&mut self, detection: &Detection);
    fn clear_target(&mut self);
}

type DetectionCallback = Box<dyn FnMut(&DetectionOutcome)>;

/// Tracking coordinator.
///
/// Owns the target registry, drives the per-frame sampling loop, and
/// orchestrates detector + vocabulary index + registry. The host calls
/// [`Tracker::process_frame`] from its frame-presentation cycle; only
/// every `detection_interval`-th call triggers detection, so the rate is
/// coupled to rendering throughput and degrades by skipping, never by
/// queueing.
pub struct Tracker<S: TargetStore> {
    config: TrackerConfig,
    detector: FeatureDetector,
    index: VocabularyIndex,
    registry: TargetRegistry,
    store: S,
    sink: Option<Box<dyn PoseSink>>,
    callback: Option<DetectionCallback>,
    state: TrackerState,
    frame_counter: u64,
}

impl<S: TargetStore> Tracker<S> {
    /// Build the detector and index from a validated configuration.
    pub fn new(config: TrackerConfig, store: S) -> Result<Self, TrackError> {
        config.validate()?;
        let detector = FeatureDetector::new(config.detector.clone())?;
        let index = VocabularyIndex::new(config.vocabulary)?;
        Ok(Self {
            config,
            detector,
            index,
            registry: TargetRegistry::new(),
            store,
            sink: None,
            callback: None,
            state: TrackerState::Initialized,
            frame_counter: 0,
        })
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Attach the rendering collaborator.
    pub fn set_pose_sink(&mut self, sink: Box<dyn PoseSink>) {
        self.sink = Some(sink);
    }

    /// Bulk-load previously registered targets from the store.
    ///
    /// Called once at startup. Returns how many targets were loaded; the
    /// vocabulary is rebuilt afterwards so queries see the restored set.
    pub fn load_from_store(&mut self) -> Result<usize, TrackError> {
        let records = self.store.list_all()?;
        let mut loaded = 0;
        for record in records {
            if self.registry.contains(&record.id) {
                continue;
            }
            self.registry.insert(record.into())?;
            loaded += 1;
        }
        if loaded > 0 {
            self.index.build(self.registry.targets());
        }
        log::info!("loaded {loaded} targets from store");
        Ok(loaded)
    }

    /// Begin tracking: reset the frame counter and register the callback.
    pub fn start(&mut self, callback: impl FnMut(&DetectionOutcome) + 'static) {
        self.frame_counter = 0;
        self.callback = Some(Box::new(callback));
        self.state = TrackerState::Tracking;
        log::info!(
            "tracking started (interval {}, {} targets)",
            self.config.detection_interval,
            self.registry.len()
        );
    }

    /// Stop sampling. Component state is retained; `start` resumes.
    pub fn stop(&mut self) {
        self.state = TrackerState::Stopped;
        log::info!("tracking stopped");
    }

    /// One tick of the host's frame cycle.
    ///
    /// No-op unless tracking, and a no-op on all but every
    /// `detection_interval`-th frame. Nothing that happens during
    /// detection can escape this method and stop the loop.
    pub fn process_frame(&mut self, frame: &GrayImageView<'_>) {
        if self.state != TrackerState::Tracking {
            return;
        }
        self.frame_counter += 1;
        if self.frame_counter % self.config.detection_interval as u64 != 0 {
            return;
        }

        let outcome = self.detect_target(frame);
        self.publish(&outcome);
    }

    /// Full detection pass over one frame.
    ///
    /// Frame features are extracted once and shared between the vocabulary
    /// query and candidate scoring.
    pub fn detect_target(&self, frame: &GrayImageView<'_>) -> DetectionOutcome {
        let frame_features = self.detector.extract_features(frame);
        if frame_features.is_empty() {
            return DetectionOutcome::Missed(MissReason::NoFrameFeatures);
        }

        let candidate_ids = self.query_candidates(&frame_features);
        let candidates: Vec<&Target> = candidate_ids
            .iter()
            .filter_map(|id| self.registry.get(id))
            .collect();

        self.detector.score_candidates(&frame_features, &candidates)
    }

    /// Ranked candidate ids for a frame, resolved against the registry.
    ///
    /// The vocabulary may be stale after `remove_target` and still score a
    /// removed id; filtering through the registry keeps that harmless.
    pub fn query_candidates(&self, frame_features: &FeatureSet) -> Vec<TargetId> {
        self.index
            .query(&frame_features.descriptors)
            .into_iter()
            .filter(|id| self.registry.contains(id))
            .collect()
    }

    /// Register a target: extract features, persist, insert, rebuild the
    /// vocabulary. The target is query-ready when this returns.
    pub fn add_target(
        &mut self,
        id: impl Into<TargetId>,
        name: impl Into<String>,
        image: &GrayImageView<'_>,
    ) -> Result<(), TrackError> {
        let id = id.into();
        if self.registry.contains(&id) {
            return Err(TrackError::DuplicateTarget(id));
        }

        let features = self.detector.extract_features(image);
        log::info!("registering target {id:?} with {} features", features.len());

        let target = Target {
            id,
            name: name.into(),
            width: image.width as u32,
            height: image.height as u32,
            features: Some(features),
            created_at_ms: now_ms(),
        };

        self.store.save(&target.clone().into())?;
        self.registry.insert(target)?;
        self.index.build(self.registry.targets());
        Ok(())
    }

    /// Remove a target from store and registry.
    ///
    /// The store is updated first: if the delete fails the registry is
    /// left unchanged, so registry and store never disagree about which
    /// targets exist. The vocabulary is deliberately not rebuilt here: a
    /// stale entry can still score, but the registry no longer resolves
    /// it, so no render action results. The next `add_target` rebuilds.
    pub fn remove_target(&mut self, id: &str) -> Result<Target, TrackError> {
        if !self.registry.contains(id) {
            return Err(TrackError::UnknownTarget(id.to_string()));
        }
        self.store.delete(id)?;
        let target = self
            .registry
            .remove(id)
            .ok_or_else(|| TrackError::UnknownTarget(id.to_string()))?;
        log::info!("removed target {id:?}");
        Ok(target)
    }

    /// Merge new tunables into the live configuration.
    ///
    /// The merged config is validated as a whole; on success the detector
    /// and index pick the values up on their next operation.
    pub fn update_config(&mut self, patch: &ConfigPatch) -> Result<(), TrackError> {
        let mut merged = self.config.clone();
        patch.apply(&mut merged);
        merged.validate()?;

        self.detector.set_params(merged.detector.clone())?;
        self.index.set_params(merged.vocabulary)?;
        self.config = merged;
        Ok(())
    }

    fn publish(&mut self, outcome: &DetectionOutcome) {
        match outcome {
            DetectionOutcome::Detected(detection) => {
                if let Some(sink) = &mut self.sink {
                    sink.set_target(detection);
                }
            }
            DetectionOutcome::Missed(reason) => {
                log::debug!("frame {}: {reason}", self.frame_counter);
                if let Some(sink) = &mut self.sink {
                    sink.clear_target();
                }
            }
        }
        if let Some(callback) = &mut self.callback {
            callback(outcome);
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
