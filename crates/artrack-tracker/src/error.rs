use artrack_core::TargetId;

/// Errors surfaced by the tracking coordinator.
///
/// Per-frame detection faults never appear here: they are logged and the
/// frame degrades to a miss. These errors cover initialization,
/// configuration and registration, where the caller can react.
#[derive(thiserror::Error, Debug)]
pub enum TrackError {
    #[error(transparent)]
    Detector(#[from] artrack_features::ConfigError),

    #[error(transparent)]
    Vocabulary(#[from] artrack_vocab::VocabConfigError),

    #[error("detection_interval must be at least 1")]
    InvalidInterval,

    #[error("target {0:?} is already registered")]
    DuplicateTarget(TargetId),

    #[error("unknown target {0:?}")]
    UnknownTarget(TargetId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure reported by a persistent-store implementation.
#[derive(thiserror::Error, Debug)]
#[error("store: {0}")]
pub struct StoreError(pub String);
