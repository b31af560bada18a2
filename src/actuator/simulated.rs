use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use super::interface::{ActuatorError, ActuatorInterface, Channel};
use super::pose::{ActuatorPose, MechanicalLimits};

/// One call made against a [`SimulatedPanTilt`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Enable(Channel, bool),
    SetPan(i32),
    SetTilt(i32),
    GetPan,
    GetTilt,
}

/// Calls kept in the log; older entries are dropped first.
pub const CALL_LOG_CAPACITY: usize = 4096;

struct SimState {
    pose: ActuatorPose,
    pan_enabled: bool,
    tilt_enabled: bool,
    calls: VecDeque<ActuatorCall>,
    sets: usize,
    fail_after_sets: Option<usize>,
}

/// In-memory pan/tilt unit. Clones share state, so one clone can drive the
/// device while another inspects its call log or pose.
#[derive(Clone)]
pub struct SimulatedPanTilt {
    state: Arc<Mutex<SimState>>,
    range: MechanicalLimits,
}

impl SimulatedPanTilt {
    pub fn new() -> Self {
        Self::with_pose(ActuatorPose::default())
    }

    pub fn with_pose(pose: ActuatorPose) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                pose,
                pan_enabled: false,
                tilt_enabled: false,
                calls: VecDeque::with_capacity(64),
                sets: 0,
                fail_after_sets: None,
            })),
            range: MechanicalLimits::default(),
        }
    }

    /// Every `set_*` after the first `n` fails with a channel fault.
    pub fn fail_after(self, n: usize) -> Self {
        self.state.lock().fail_after_sets = Some(n);
        self
    }

    /// The most recent calls, oldest first, at most [`CALL_LOG_CAPACITY`].
    pub fn calls(&self) -> Vec<ActuatorCall> {
        self.state.lock().calls.iter().copied().collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn pose(&self) -> ActuatorPose {
        self.state.lock().pose
    }

    pub fn is_enabled(&self, channel: Channel) -> bool {
        let s = self.state.lock();
        match channel {
            Channel::Pan => s.pan_enabled,
            Channel::Tilt => s.tilt_enabled,
        }
    }

    /// Read-only view of the pose, for a simulated camera.
    pub fn pose_reader(&self) -> PoseReader {
        PoseReader {
            state: self.state.clone(),
        }
    }

    fn drive(&mut self, channel: Channel, angle: i32) -> Result<(), ActuatorError> {
        let mut s = self.state.lock();
        s.record(match channel {
            Channel::Pan => ActuatorCall::SetPan(angle),
            Channel::Tilt => ActuatorCall::SetTilt(angle),
        });

        if let Some(limit) = s.fail_after_sets {
            if s.sets >= limit {
                return Err(ActuatorError::Fault {
                    channel,
                    reason: "simulated servo fault".into(),
                });
            }
        }
        s.sets += 1;

        if !self.range.contains(angle) {
            return Err(ActuatorError::OutOfRange {
                channel,
                angle,
                min: self.range.min,
                max: self.range.max,
            });
        }
        match channel {
            Channel::Pan => s.pose.pan_angle = angle,
            Channel::Tilt => s.pose.tilt_angle = angle,
        }
        Ok(())
    }
}

impl SimState {
    fn record(&mut self, call: ActuatorCall) {
        if self.calls.len() == CALL_LOG_CAPACITY {
            self.calls.pop_front();
        }
        self.calls.push_back(call);
    }
}

impl Default for SimulatedPanTilt {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorInterface for SimulatedPanTilt {
    fn enable(&mut self, channel: Channel, on: bool) -> Result<(), ActuatorError> {
        let mut s = self.state.lock();
        s.record(ActuatorCall::Enable(channel, on));
        match channel {
            Channel::Pan => s.pan_enabled = on,
            Channel::Tilt => s.tilt_enabled = on,
        }
        Ok(())
    }

    fn set_pan(&mut self, angle: i32) -> Result<(), ActuatorError> {
        self.drive(Channel::Pan, angle)
    }

    fn set_tilt(&mut self, angle: i32) -> Result<(), ActuatorError> {
        self.drive(Channel::Tilt, angle)
    }

    fn get_pan(&mut self) -> Result<i32, ActuatorError> {
        let mut s = self.state.lock();
        s.record(ActuatorCall::GetPan);
        Ok(s.pose.pan_angle)
    }

    fn get_tilt(&mut self) -> Result<i32, ActuatorError> {
        let mut s = self.state.lock();
        s.record(ActuatorCall::GetTilt);
        Ok(s.pose.tilt_angle)
    }
}

#[derive(Clone)]
pub struct PoseReader {
    state: Arc<Mutex<SimState>>,
}

impl PoseReader {
    pub fn pose(&self) -> ActuatorPose {
        self.state.lock().pose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_log_keeps_only_the_newest_calls() {
        let mut sim = SimulatedPanTilt::new();
        for i in 0..CALL_LOG_CAPACITY + 10 {
            sim.set_pan((i % 90) as i32).unwrap();
        }

        let calls = sim.calls();
        assert_eq!(calls.len(), CALL_LOG_CAPACITY);
        assert_eq!(calls.first(), Some(&ActuatorCall::SetPan(10)));
        let last = (CALL_LOG_CAPACITY + 9) % 90;
        assert_eq!(calls.last(), Some(&ActuatorCall::SetPan(last as i32)));
    }

    #[test]
    fn fault_injection_counts_every_set() {
        let mut sim = SimulatedPanTilt::new().fail_after(2);
        assert!(sim.set_pan(1).is_ok());
        assert!(sim.set_tilt(1).is_ok());
        assert!(matches!(sim.set_pan(2), Err(ActuatorError::Fault { .. })));
        assert_eq!(sim.pose(), ActuatorPose { pan_angle: 1, tilt_angle: 1 });
    }
}
