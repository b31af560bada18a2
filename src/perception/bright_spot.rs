use serde::Deserialize;
use std::path::Path;

use super::{BoundingBox, Detection, Detector, Frame, PerceptionError};
use crate::ipc::Point;

/// Detector model file contents.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BrightSpotModel {
    /// Minimum luminance of a target pixel.
    pub threshold: u8,
    /// Minimum number of target pixels for a detection.
    pub min_area: usize,
}

impl Default for BrightSpotModel {
    fn default() -> Self {
        Self {
            threshold: 200,
            min_area: 9,
        }
    }
}

/// Finds the centroid and bounding box of all pixels at or above a luminance
/// threshold.
pub struct BrightSpotDetector {
    model: BrightSpotModel,
}

impl BrightSpotDetector {
    pub fn new(model: BrightSpotModel) -> Self {
        Self { model }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PerceptionError> {
        let path = path.as_ref();
        let model_err = |reason: String| PerceptionError::Model {
            path: path.display().to_string(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| model_err(e.to_string()))?;
        let model: BrightSpotModel = toml::from_str(&text).map_err(|e| model_err(e.to_string()))?;
        if model.min_area == 0 {
            return Err(model_err("min_area must be at least 1".into()));
        }
        Ok(Self::new(model))
    }

    pub fn model(&self) -> &BrightSpotModel {
        &self.model
    }
}

impl Detector for BrightSpotDetector {
    fn locate(&mut self, frame: &Frame, reference: Point) -> Result<Detection, PerceptionError> {
        let mut count = 0u64;
        let (mut sum_x, mut sum_y) = (0u64, 0u64);
        let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
        let (mut max_x, mut max_y) = (0u32, 0u32);

        for (y, row) in frame.rows().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                if value < self.model.threshold {
                    continue;
                }
                let (x, y) = (x as u32, y as u32);
                count += 1;
                sum_x += u64::from(x);
                sum_y += u64::from(y);
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }

        if count == 0 || count < self.model.min_area as u64 {
            return Ok(Detection::missed(reference));
        }

        let centroid = Point::new((sum_x / count) as i32, (sum_y / count) as i32);
        let bbox = BoundingBox {
            x: min_x as i32,
            y: min_y as i32,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        };
        Ok(Detection::found(centroid, bbox))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_square(x0: u32, y0: u32, size: u32) -> Frame {
        let mut frame = Frame::blank(64, 48, 1);
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                frame.pixels[(y * 64 + x) as usize] = 255;
            }
        }
        frame
    }

    #[test]
    fn finds_square_centroid_and_box() {
        let mut det = BrightSpotDetector::new(BrightSpotModel::default());
        let frame = frame_with_square(10, 20, 5);
        let d = det.locate(&frame, frame.center()).unwrap();
        assert_eq!(d.centroid, Point::new(12, 22));
        assert_eq!(
            d.bounding_box,
            Some(BoundingBox { x: 10, y: 20, width: 5, height: 5 })
        );
    }

    #[test]
    fn too_few_pixels_is_a_miss() {
        let mut det = BrightSpotDetector::new(BrightSpotModel { threshold: 200, min_area: 30 });
        let frame = frame_with_square(10, 20, 5);
        let d = det.locate(&frame, Point::new(32, 24)).unwrap();
        assert!(!d.is_hit());
        assert_eq!(d.centroid, Point::new(32, 24));
    }
}
