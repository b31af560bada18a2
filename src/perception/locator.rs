use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::{Detection, Detector, FrameSource, PerceptionError};
use crate::error::TrackerError;
use crate::ipc::{PerceptionPublisher, StopSignal};
use crate::metrics::LoopMetrics;

/// Perception loop: one frame read, one detector call and one shared-state
/// publication per iteration. Cadence is whatever the frame source delivers.
pub struct TargetLocator<S, D> {
    source: S,
    detector: D,
    publisher: PerceptionPublisher,
    metrics: LoopMetrics,
    warmup: Duration,
    was_detected: bool,
}

impl<S: FrameSource, D: Detector> TargetLocator<S, D> {
    pub fn new(source: S, detector: D, publisher: PerceptionPublisher, metrics: LoopMetrics) -> Self {
        Self {
            source,
            detector,
            publisher,
            metrics,
            warmup: Duration::ZERO,
            was_detected: false,
        }
    }

    /// Delay between starting the source and the first read.
    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    pub fn start(&mut self) -> Result<(), PerceptionError> {
        self.source.start()
    }

    /// Read one frame, run the detector against its center and publish.
    ///
    /// A miss publishes the new frame center with the flag cleared and leaves
    /// the previously published centroid in place.
    pub fn step(&mut self) -> Result<Detection, PerceptionError> {
        let frame = self.source.read()?;
        let start = Instant::now();

        let center = frame.center();
        let detection = self.detector.locate(&frame, center)?;
        let centroid = detection.bounding_box.map(|_| detection.centroid);
        self.publisher.publish(center, centroid);

        let detected = centroid.is_some();
        self.metrics.record_perception(start.elapsed(), detected);
        if detected != self.was_detected {
            match centroid {
                Some(c) => info!(frame = frame.sequence, centroid = %c, "target acquired"),
                None => info!(frame = frame.sequence, "target lost"),
            }
            self.was_detected = detected;
        } else {
            debug!(frame = frame.sequence, %center, detected, "frame processed");
        }
        Ok(detection)
    }

    pub fn run(mut self, stop: &StopSignal) -> Result<(), TrackerError> {
        self.start()?;
        info!(warmup_ms = self.warmup.as_millis() as u64, "frame source started");
        if !stop.sleep(self.warmup) {
            return Ok(());
        }

        while !stop.is_stopped() {
            self.step()?;
        }
        info!("target locator stopped");
        Ok(())
    }
}
