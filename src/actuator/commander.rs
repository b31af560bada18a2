use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

use super::interface::{ActuatorError, ActuatorHandle, ActuatorInterface, Channel};
use super::pose::{ActuatorPose, MechanicalLimits, PoseMapping};
use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::ipc::{AxisCommand, StateReader, StopSignal, STOP_POLL_INTERVAL};
use crate::metrics::LoopMetrics;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommanderSettings {
    pub pan_deadband: f64,
    pub tilt_deadband: f64,
    pub limits: MechanicalLimits,
    pub mapping: PoseMapping,
    /// One-time delay after the first detection is seen.
    pub settle: Duration,
    /// Delay before every actuation decision.
    pub rate_limit: Duration,
}

impl CommanderSettings {
    pub fn from_config(cfg: &TrackerConfig) -> Self {
        Self {
            pan_deadband: cfg.pan.deadband,
            tilt_deadband: cfg.tilt.deadband,
            limits: MechanicalLimits::from(&cfg.actuator),
            mapping: PoseMapping::new(cfg.actuator.working_offset),
            settle: cfg.actuator.settle_interval(),
            rate_limit: cfg.actuator.rate_limit_interval(),
        }
    }

    fn deadband(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Pan => self.pan_deadband,
            Channel::Tilt => self.tilt_deadband,
        }
    }
}

/// What happened to one axis in one actuation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOutcome {
    /// Command magnitude under the deadband (or not a number).
    Deadband,
    /// Angle sent to the device.
    Issued(i32),
    /// Converted angle fell outside the mechanical limit; dropped this cycle.
    OutOfLimit(i32),
    /// Handle disarmed by shutdown; nothing sent.
    Refused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    pub pan: AxisOutcome,
    pub tilt: AxisOutcome,
}

impl CycleOutcome {
    pub fn actuation_calls(&self) -> usize {
        [self.pan, self.tilt]
            .iter()
            .filter(|o| matches!(o, AxisOutcome::Issued(_)))
            .count()
    }
}

/// Applies axis commands to the servos as relative, clamped, rate-limited
/// adjustments.
pub struct ActuatorCommander<A> {
    actuator: ActuatorHandle<A>,
    state: StateReader,
    settings: CommanderSettings,
    metrics: LoopMetrics,
    working_pan: f64,
    working_tilt: f64,
    settled: bool,
}

impl<A: ActuatorInterface> ActuatorCommander<A> {
    /// Seeds the working pose from the angles the device currently reports.
    pub fn new(
        actuator: ActuatorHandle<A>,
        state: StateReader,
        settings: CommanderSettings,
        metrics: LoopMetrics,
    ) -> Result<Self, ActuatorError> {
        let pose = actuator.read_pose()?;
        Ok(Self {
            working_pan: settings.mapping.pan_to_working(pose.pan_angle),
            working_tilt: settings.mapping.tilt_to_working(pose.tilt_angle),
            actuator,
            state,
            settings,
            metrics,
            settled: false,
        })
    }

    /// Last committed pose in hardware angles.
    pub fn pose(&self) -> ActuatorPose {
        ActuatorPose {
            pan_angle: self.settings.mapping.pan_to_hardware(self.working_pan),
            tilt_angle: self.settings.mapping.tilt_to_hardware(self.working_tilt),
        }
    }

    /// Apply one pair of commands immediately, without any of the loop's
    /// delays. At most one call per axis reaches the device.
    pub fn step(&mut self, command: AxisCommand) -> Result<CycleOutcome, ActuatorError> {
        let start = Instant::now();
        let pan = self.apply(Channel::Pan, command.pan)?;
        let tilt = self.apply(Channel::Tilt, command.tilt)?;
        self.metrics.record_actuation_cycle(start.elapsed());
        Ok(CycleOutcome { pan, tilt })
    }

    fn apply(&mut self, channel: Channel, command: f64) -> Result<AxisOutcome, ActuatorError> {
        if !command.is_finite() || command.abs() < self.settings.deadband(channel) {
            self.metrics.record_deadband_skip();
            return Ok(AxisOutcome::Deadband);
        }

        let mapping = self.settings.mapping;
        let (candidate, angle) = match channel {
            Channel::Pan => {
                let w = mapping.clamp(self.working_pan - command);
                (w, mapping.pan_to_hardware(w))
            }
            Channel::Tilt => {
                let w = mapping.clamp(self.working_tilt + command);
                (w, mapping.tilt_to_hardware(w))
            }
        };

        if !self.settings.limits.contains(angle) {
            debug!(%channel, angle, command, "command beyond mechanical limit, dropped");
            self.metrics.record_out_of_range();
            return Ok(AxisOutcome::OutOfLimit(angle));
        }

        if !self.actuator.set(channel, angle)? {
            return Ok(AxisOutcome::Refused);
        }
        match channel {
            Channel::Pan => self.working_pan = candidate,
            Channel::Tilt => self.working_tilt = candidate,
        }
        self.metrics.record_actuation();
        trace!(%channel, angle, command, "actuated");
        Ok(AxisOutcome::Issued(angle))
    }

    pub fn run(mut self, stop: &StopSignal) -> Result<(), TrackerError> {
        let mut seen = self.state.publication();
        info!(pose = ?self.pose(), "actuator commander started");

        while !stop.is_stopped() {
            if !self.state.detected() {
                seen = self.state.wait_for_publication(seen, STOP_POLL_INTERVAL);
                continue;
            }

            if !self.settled {
                if !stop.sleep(self.settings.settle) {
                    break;
                }
                self.settled = true;
                info!("tracking ready");
            }

            if !stop.sleep(self.settings.rate_limit) {
                break;
            }
            // Target may have been lost during the delay.
            if !self.state.detected() {
                continue;
            }

            let command = self.state.axis_command();
            self.step(command)?;
        }

        info!(pose = ?self.pose(), "actuator commander stopped");
        Ok(())
    }
}
