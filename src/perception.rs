//! Perception module - frames in, target position out

pub mod bright_spot;
pub mod detector;
pub mod frame;
pub mod locator;
pub mod synthetic;

use thiserror::Error;

pub use bright_spot::{BrightSpotDetector, BrightSpotModel};
pub use detector::{BoundingBox, Detection, Detector};
pub use frame::{Flipped, Frame, FrameSource};
pub use locator::TargetLocator;
pub use synthetic::SyntheticCamera;

#[derive(Debug, Error)]
pub enum PerceptionError {
    #[error("frame source failed to start: {0}")]
    Start(String),
    #[error("frame read failed: {0}")]
    FrameRead(String),
    #[error("frame source reached end of stream")]
    EndOfStream,
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    #[error("detector failed: {0}")]
    Detector(String),
    #[error("failed to load detector model {path}: {reason}")]
    Model { path: String, reason: String },
}
