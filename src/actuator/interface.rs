use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

use super::pose::ActuatorPose;
use crate::ipc::Axis;

/// Servo channel. Same two values as [`Axis`].
pub type Channel = Axis;

#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("{channel} angle {angle} outside mechanical range [{min}, {max}]")]
    OutOfRange {
        channel: Channel,
        angle: i32,
        min: i32,
        max: i32,
    },
    #[error("{channel} channel fault: {reason}")]
    Fault { channel: Channel, reason: String },
    #[error("actuator is disarmed")]
    Disarmed,
    #[error("actuator I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Low-level pan/tilt driver. Angles are signed degrees in the mechanical
/// range. `enable(_, false)` must be safe at any time, including before the
/// first `set_*`.
pub trait ActuatorInterface: Send {
    fn enable(&mut self, channel: Channel, on: bool) -> Result<(), ActuatorError>;
    fn set_pan(&mut self, angle: i32) -> Result<(), ActuatorError>;
    fn set_tilt(&mut self, angle: i32) -> Result<(), ActuatorError>;
    fn get_pan(&mut self) -> Result<i32, ActuatorError>;
    fn get_tilt(&mut self) -> Result<i32, ActuatorError>;

    fn set(&mut self, channel: Channel, angle: i32) -> Result<(), ActuatorError> {
        match channel {
            Channel::Pan => self.set_pan(angle),
            Channel::Tilt => self.set_tilt(angle),
        }
    }
}

// ============================================================================
// ACTUATOR HANDLE - shared, disarmable access to one device
// ============================================================================

struct Guarded<A> {
    device: A,
    armed: bool,
}

/// Shared access to the device for the supervisor, the self-test and the
/// commander.
///
/// Once [`disable_all`](Self::disable_all) has run, every later `set` through
/// any clone is refused without reaching the device, so nothing can move the
/// servos between the disable and process exit.
pub struct ActuatorHandle<A> {
    inner: Arc<Mutex<Guarded<A>>>,
}

impl<A> Clone for ActuatorHandle<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: ActuatorInterface> ActuatorHandle<A> {
    pub fn new(device: A) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Guarded { device, armed: true })),
        }
    }

    /// Arm the handle and power both channels, pan first.
    pub fn enable_all(&self) -> Result<(), ActuatorError> {
        let mut g = self.inner.lock();
        g.armed = true;
        g.device.enable(Channel::Pan, true)?;
        g.device.enable(Channel::Tilt, true)
    }

    /// Disarm, then cut power to pan and tilt in that order. Both channels are
    /// attempted even if the first fails; the first error is returned.
    pub fn disable_all(&self) -> Result<(), ActuatorError> {
        let mut g = self.inner.lock();
        g.armed = false;
        let pan = g.device.enable(Channel::Pan, false);
        let tilt = g.device.enable(Channel::Tilt, false);
        pan.and(tilt)
    }

    pub fn is_armed(&self) -> bool {
        self.inner.lock().armed
    }

    /// Drive one channel. `Ok(false)` means the handle is disarmed and the
    /// device was not touched.
    pub fn set(&self, channel: Channel, angle: i32) -> Result<bool, ActuatorError> {
        let mut g = self.inner.lock();
        if !g.armed {
            return Ok(false);
        }
        g.device.set(channel, angle)?;
        Ok(true)
    }

    pub fn read_pose(&self) -> Result<ActuatorPose, ActuatorError> {
        let mut g = self.inner.lock();
        Ok(ActuatorPose {
            pan_angle: g.device.get_pan()?,
            tilt_angle: g.device.get_tilt()?,
        })
    }
}
