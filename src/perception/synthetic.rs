use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use std::thread;
use std::time::{Duration, Instant};

use super::{Frame, FrameSource, PerceptionError};
use crate::actuator::PoseReader;
use crate::config::SimulationConfig;

// ============================================================================
// SYNTHETIC CAMERA - Simulates a camera riding on the pan/tilt unit
// ============================================================================

/// Renders a bright square target moving along a Lissajous path in angle
/// space. The target's image position is its angle minus the current servo
/// pose, so moving the servos moves the target in the frame.
pub struct SyntheticCamera {
    cfg: SimulationConfig,
    pose: PoseReader,
    rng: StdRng,
    sequence: u64,
    started: Option<Instant>,
    next_frame: Instant,
}

impl SyntheticCamera {
    pub fn new(cfg: SimulationConfig, pose: PoseReader) -> Self {
        Self {
            rng: StdRng::seed_from_u64(cfg.seed),
            cfg,
            pose,
            sequence: 0,
            started: None,
            next_frame: Instant::now(),
        }
    }

    /// Target angles (pan, tilt) in degrees at `t` seconds since start.
    pub fn target_angles(&self, t: f64) -> (f64, f64) {
        let phase = TAU * t / self.cfg.period_secs.max(f64::EPSILON);
        (
            self.cfg.amplitude_pan_deg * phase.sin(),
            self.cfg.amplitude_tilt_deg * (2.0 * phase).sin(),
        )
    }

    fn render(&mut self, t: f64) -> Frame {
        let mut frame = Frame::blank(self.cfg.width, self.cfg.height, self.sequence);
        if self.rng.gen::<f64>() < self.cfg.dropout_probability {
            return frame;
        }

        let (target_pan, target_tilt) = self.target_angles(t);
        let pose = self.pose.pose();
        let ppd = self.cfg.pixels_per_degree;
        let cx = f64::from(self.cfg.width / 2) + (target_pan - f64::from(pose.pan_angle)) * ppd;
        let cy = f64::from(self.cfg.height / 2) + (target_tilt - f64::from(pose.tilt_angle)) * ppd;

        let half = f64::from(self.cfg.target_size) / 2.0;
        let x0 = ((cx - half).max(0.0) as u32).min(self.cfg.width);
        let y0 = ((cy - half).max(0.0) as u32).min(self.cfg.height);
        let x1 = ((cx + half).max(0.0) as u32).min(self.cfg.width);
        let y1 = ((cy + half).max(0.0) as u32).min(self.cfg.height);

        let width = self.cfg.width as usize;
        for y in y0..y1 {
            let row = y as usize * width;
            frame.pixels[row + x0 as usize..row + x1.max(x0) as usize].fill(255);
        }
        frame
    }
}

impl FrameSource for SyntheticCamera {
    fn start(&mut self) -> Result<(), PerceptionError> {
        let now = Instant::now();
        self.started = Some(now);
        self.next_frame = now;
        Ok(())
    }

    fn read(&mut self) -> Result<Frame, PerceptionError> {
        let started = self
            .started
            .ok_or_else(|| PerceptionError::FrameRead("camera not started".into()))?;

        let now = Instant::now();
        if self.next_frame > now {
            thread::sleep(self.next_frame - now);
        }
        self.next_frame += Duration::from_millis(self.cfg.frame_interval_ms);
        self.sequence += 1;

        Ok(self.render(started.elapsed().as_secs_f64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::{ActuatorPose, SimulatedPanTilt};
    use crate::perception::{BrightSpotDetector, BrightSpotModel, Detector};

    fn steady_config() -> SimulationConfig {
        SimulationConfig {
            dropout_probability: 0.0,
            frame_interval_ms: 1,
            ..SimulationConfig::default()
        }
    }

    fn centroid_at(pose: ActuatorPose) -> crate::ipc::Point {
        let sim = SimulatedPanTilt::with_pose(pose);
        let mut camera = SyntheticCamera::new(steady_config(), sim.pose_reader());
        let frame = camera.render(0.0);
        let mut detector = BrightSpotDetector::new(BrightSpotModel::default());
        let detection = detector.locate(&frame, frame.center()).unwrap();
        assert!(detection.is_hit());
        detection.centroid
    }

    #[test]
    fn target_starts_centered_when_pose_is_zero() {
        let c = centroid_at(ActuatorPose::default());
        assert!((c.x - 160).abs() <= 1 && (c.y - 120).abs() <= 1, "got {c}");
    }

    #[test]
    fn panning_right_moves_target_left_in_frame() {
        let c = centroid_at(ActuatorPose { pan_angle: 20, tilt_angle: 0 });
        assert!(c.x < 160 - 20, "got {c}");
    }

    #[test]
    fn read_requires_start() {
        let sim = SimulatedPanTilt::new();
        let mut camera = SyntheticCamera::new(steady_config(), sim.pose_reader());
        assert!(camera.read().is_err());
        camera.start().unwrap();
        assert_eq!(camera.read().unwrap().sequence, 1);
    }
}
