//! Metrics module - loop timing histograms and tracking counters

use hdrhistogram::{CreationError, Histogram};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::ipc::Axis;

// ============================================================================
// LOOP METRICS - Thread-safe performance tracking
// ============================================================================

#[derive(Clone)]
pub struct LoopMetrics {
    perception_hist: Arc<Mutex<Histogram<u64>>>,
    control_hist: Arc<Mutex<Histogram<u64>>>,
    actuation_hist: Arc<Mutex<Histogram<u64>>>,
    counters: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    frames: AtomicU64,
    detections: AtomicU64,
    pan_updates: AtomicU64,
    tilt_updates: AtomicU64,
    actuations: AtomicU64,
    deadband_skips: AtomicU64,
    out_of_range_drops: AtomicU64,
}

impl LoopMetrics {
    pub fn new() -> Result<Self, CreationError> {
        Ok(Self {
            perception_hist: Arc::new(Mutex::new(Histogram::new(3)?)),
            control_hist: Arc::new(Mutex::new(Histogram::new(3)?)),
            actuation_hist: Arc::new(Mutex::new(Histogram::new(3)?)),
            counters: Arc::new(Counters::default()),
        })
    }

    pub fn record_perception(&self, duration: Duration, detected: bool) {
        self.perception_hist.lock().record(duration.as_nanos() as u64).ok();
        self.counters.frames.fetch_add(1, Ordering::Relaxed);
        if detected {
            self.counters.detections.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_control(&self, axis: Axis, duration: Duration) {
        self.control_hist.lock().record(duration.as_nanos() as u64).ok();
        let counter = match axis {
            Axis::Pan => &self.counters.pan_updates,
            Axis::Tilt => &self.counters.tilt_updates,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_actuation_cycle(&self, duration: Duration) {
        self.actuation_hist.lock().record(duration.as_nanos() as u64).ok();
    }

    pub fn record_actuation(&self) {
        self.counters.actuations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deadband_skip(&self) {
        self.counters.deadband_skips.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_out_of_range(&self) {
        self.counters.out_of_range_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report(&self) -> MetricsReport {
        let perception = self.perception_hist.lock();
        let control = self.control_hist.lock();
        let actuation = self.actuation_hist.lock();
        let c = &self.counters;

        MetricsReport {
            perception_p50: Duration::from_nanos(perception.value_at_quantile(0.5)),
            perception_p99: Duration::from_nanos(perception.value_at_quantile(0.99)),
            control_p50: Duration::from_nanos(control.value_at_quantile(0.5)),
            control_p99: Duration::from_nanos(control.value_at_quantile(0.99)),
            actuation_p50: Duration::from_nanos(actuation.value_at_quantile(0.5)),
            actuation_p99: Duration::from_nanos(actuation.value_at_quantile(0.99)),
            frames: c.frames.load(Ordering::Relaxed),
            detections: c.detections.load(Ordering::Relaxed),
            pan_updates: c.pan_updates.load(Ordering::Relaxed),
            tilt_updates: c.tilt_updates.load(Ordering::Relaxed),
            actuations: c.actuations.load(Ordering::Relaxed),
            deadband_skips: c.deadband_skips.load(Ordering::Relaxed),
            out_of_range_drops: c.out_of_range_drops.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// METRICS REPORT - Summary statistics
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsReport {
    pub perception_p50: Duration,
    pub perception_p99: Duration,
    pub control_p50: Duration,
    pub control_p99: Duration,
    pub actuation_p50: Duration,
    pub actuation_p99: Duration,
    pub frames: u64,
    pub detections: u64,
    pub pan_updates: u64,
    pub tilt_updates: u64,
    pub actuations: u64,
    pub deadband_skips: u64,
    pub out_of_range_drops: u64,
}

impl MetricsReport {
    /// Fraction of frames that carried a detection, in percent.
    pub fn detection_rate(&self) -> f64 {
        if self.frames > 0 {
            self.detections as f64 / self.frames as f64 * 100.0
        } else {
            0.0
        }
    }
}
