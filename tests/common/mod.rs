//! Fakes shared by the integration tests.
#![allow(dead_code)]

use pantilt_tracker::config::SelfTestConfig;
use pantilt_tracker::{
    BoundingBox, Detection, Detector, Frame, FrameSource, PerceptionError, Point, TrackerConfig,
};
use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

/// Config with every delay shrunk to test scale.
pub fn fast_config() -> TrackerConfig {
    let mut cfg = TrackerConfig::default();
    cfg.actuator.settle_secs = 0.0;
    cfg.actuator.rate_limit_secs = 0.005;
    cfg.perception.warmup_secs = 0.0;
    cfg.self_test = SelfTestConfig {
        step_degrees: 30,
        step_delay_ms: 0,
        pre_sweep_pause_ms: 0,
        post_sweep_pause_ms: 0,
        rest_settle_ms: 0,
        rest_pan: 0,
        rest_tilt: 60,
    };
    cfg
}

/// Blank frames of a fixed size, optionally failing after `fail_after` reads.
pub struct ScriptedSource {
    pub width: u32,
    pub height: u32,
    pub interval: Duration,
    pub fail_after: Option<u64>,
    sequence: u64,
}

impl ScriptedSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            interval: Duration::ZERO,
            fail_after: None,
            sequence: 0,
        }
    }

    pub fn paced(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn failing_after(mut self, reads: u64) -> Self {
        self.fail_after = Some(reads);
        self
    }
}

impl FrameSource for ScriptedSource {
    fn start(&mut self) -> Result<(), PerceptionError> {
        Ok(())
    }

    fn read(&mut self) -> Result<Frame, PerceptionError> {
        if !self.interval.is_zero() {
            thread::sleep(self.interval);
        }
        if self.fail_after.is_some_and(|n| self.sequence >= n) {
            return Err(PerceptionError::FrameRead("camera unplugged".into()));
        }
        self.sequence += 1;
        Ok(Frame::blank(self.width, self.height, self.sequence))
    }
}

fn box_around(p: Point) -> BoundingBox {
    BoundingBox {
        x: p.x - 5,
        y: p.y - 5,
        width: 10,
        height: 10,
    }
}

/// Reports the target at the same place every frame, or never.
pub struct FixedDetector(pub Option<Point>);

impl Detector for FixedDetector {
    fn locate(&mut self, _frame: &Frame, reference: Point) -> Result<Detection, PerceptionError> {
        Ok(match self.0 {
            Some(p) => Detection::found(p, box_around(p)),
            None => Detection::missed(reference),
        })
    }
}

/// Plays back one entry per frame, then misses forever.
pub struct ScriptedDetector {
    script: VecDeque<Option<Point>>,
}

impl ScriptedDetector {
    pub fn new(script: impl IntoIterator<Item = Option<Point>>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl Detector for ScriptedDetector {
    fn locate(&mut self, _frame: &Frame, reference: Point) -> Result<Detection, PerceptionError> {
        Ok(match self.script.pop_front().flatten() {
            Some(p) => Detection::found(p, box_around(p)),
            None => Detection::missed(reference),
        })
    }
}

pub struct PanickingDetector;

impl Detector for PanickingDetector {
    fn locate(&mut self, _frame: &Frame, _reference: Point) -> Result<Detection, PerceptionError> {
        panic!("detector model corrupted");
    }
}

/// Poll `cond` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}
