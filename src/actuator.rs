//! Actuator module - pan/tilt hardware access, command application and the
//! startup sweep

pub mod commander;
pub mod interface;
pub mod pose;
pub mod self_test;
pub mod simulated;

pub use commander::{ActuatorCommander, AxisOutcome, CommanderSettings, CycleOutcome};
pub use interface::{ActuatorError, ActuatorHandle, ActuatorInterface, Channel};
pub use pose::{ActuatorPose, MechanicalLimits, PoseMapping};
pub use self_test::{SelfTestReport, SelfTestSequencer};
pub use simulated::{ActuatorCall, PoseReader, SimulatedPanTilt, CALL_LOG_CAPACITY};
