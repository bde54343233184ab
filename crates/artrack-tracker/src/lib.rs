//! Tracking coordinator: target registry, persistence seam and the
//! frame-sampling state machine that ties detector and vocabulary
//! together.

pub mod config;
pub mod error;
pub mod registry;
pub mod store;
pub mod tracker;

pub use config::{ConfigPatch, TrackerConfig};
pub use error::{StoreError, TrackError};
pub use registry::TargetRegistry;
pub use store::{MemoryStore, TargetStore};
pub use tracker::{PoseSink, Tracker, TrackerState};
