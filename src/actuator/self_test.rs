use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

use super::interface::{ActuatorError, ActuatorHandle, ActuatorInterface, Channel};
use super::pose::{ActuatorPose, MechanicalLimits};
use crate::config::TrackerConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct SelfTestReport {
    pub steps: usize,
    pub visited_min: bool,
    pub visited_max: bool,
    pub rest: ActuatorPose,
    pub elapsed: Duration,
}

/// Startup sweep: both axes from one mechanical extreme to the other, then to
/// the rest pose. Blocking.
pub struct SelfTestSequencer {
    limits: MechanicalLimits,
    step_degrees: i32,
    step_delay: Duration,
    pre_sweep_pause: Duration,
    post_sweep_pause: Duration,
    rest_settle: Duration,
    rest: ActuatorPose,
}

impl SelfTestSequencer {
    pub fn from_config(cfg: &TrackerConfig) -> Self {
        let st = &cfg.self_test;
        Self {
            limits: MechanicalLimits::from(&cfg.actuator),
            step_degrees: st.step_degrees.max(1),
            step_delay: Duration::from_millis(st.step_delay_ms),
            pre_sweep_pause: Duration::from_millis(st.pre_sweep_pause_ms),
            post_sweep_pause: Duration::from_millis(st.post_sweep_pause_ms),
            rest_settle: Duration::from_millis(st.rest_settle_ms),
            rest: ActuatorPose {
                pan_angle: st.rest_pan,
                tilt_angle: st.rest_tilt,
            },
        }
    }

    /// Angles visited by the sweep, always ending exactly on the upper limit.
    pub fn sweep_angles(&self) -> Vec<i32> {
        let mut angles: Vec<i32> = (self.limits.min..=self.limits.max)
            .step_by(self.step_degrees as usize)
            .collect();
        if angles.last() != Some(&self.limits.max) {
            angles.push(self.limits.max);
        }
        angles
    }

    pub fn run<A: ActuatorInterface>(
        &self,
        actuator: &ActuatorHandle<A>,
    ) -> Result<SelfTestReport, ActuatorError> {
        let start = Instant::now();
        info!(min = self.limits.min, max = self.limits.max, "self-test sweep starting");

        drive(actuator, Channel::Pan, self.limits.min)?;
        drive(actuator, Channel::Tilt, self.limits.min)?;
        thread::sleep(self.pre_sweep_pause);

        let angles = self.sweep_angles();
        for &angle in &angles {
            drive(actuator, Channel::Pan, angle)?;
            drive(actuator, Channel::Tilt, angle)?;
            thread::sleep(self.step_delay);
        }

        thread::sleep(self.post_sweep_pause);
        drive(actuator, Channel::Tilt, self.rest.tilt_angle)?;
        drive(actuator, Channel::Pan, self.rest.pan_angle)?;
        thread::sleep(self.rest_settle);

        let report = SelfTestReport {
            steps: angles.len(),
            visited_min: angles.first() == Some(&self.limits.min),
            visited_max: angles.last() == Some(&self.limits.max),
            rest: self.rest,
            elapsed: start.elapsed(),
        };
        info!(
            steps = report.steps,
            rest = ?report.rest,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "self-test finished"
        );
        Ok(report)
    }
}

fn drive<A: ActuatorInterface>(
    actuator: &ActuatorHandle<A>,
    channel: Channel,
    angle: i32,
) -> Result<(), ActuatorError> {
    if actuator.set(channel, angle)? {
        Ok(())
    } else {
        Err(ActuatorError::Disarmed)
    }
}
