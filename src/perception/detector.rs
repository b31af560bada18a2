use super::{Frame, PerceptionError};
use crate::ipc::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Detector output. A detection is present iff `bounding_box` is `Some`;
/// the centroid alone says nothing about whether the target was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub centroid: Point,
    pub bounding_box: Option<BoundingBox>,
}

impl Detection {
    pub fn found(centroid: Point, bounding_box: BoundingBox) -> Self {
        Self {
            centroid,
            bounding_box: Some(bounding_box),
        }
    }

    /// No target; echoes the reference point as the centroid.
    pub fn missed(reference: Point) -> Self {
        Self {
            centroid: reference,
            bounding_box: None,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.bounding_box.is_some()
    }
}

/// Locates the tracked target in a frame. `reference` is the frame center the
/// caller is trying to keep the target on.
pub trait Detector: Send {
    fn locate(&mut self, frame: &Frame, reference: Point) -> Result<Detection, PerceptionError>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn locate(&mut self, frame: &Frame, reference: Point) -> Result<Detection, PerceptionError> {
        (**self).locate(frame, reference)
    }
}
