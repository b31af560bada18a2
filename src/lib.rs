pub mod actuator;
pub mod config;
pub mod control;
pub mod error;
pub mod ipc;
pub mod metrics;
pub mod perception;
pub mod signal;
pub mod supervisor;
pub mod workers;

pub use actuator::{
    ActuatorCall, ActuatorCommander, ActuatorError, ActuatorHandle, ActuatorInterface,
    ActuatorPose, AxisOutcome, CommanderSettings, CycleOutcome, SelfTestSequencer,
    SimulatedPanTilt,
};
pub use config::{load_config, TrackerConfig};
pub use control::{AxisControlLoop, FeedbackController, PidGains};
pub use error::TrackerError;
pub use ipc::{
    shutdown_channel, Axis, AxisCommand, Point, SharedControlState, ShutdownHandle,
    ShutdownReason, StateReader, StopSignal,
};
pub use metrics::{LoopMetrics, MetricsReport};
pub use perception::{
    BoundingBox, BrightSpotDetector, Detection, Detector, Frame, FrameSource, PerceptionError,
    TargetLocator,
};
pub use supervisor::{ShutdownReport, StateWatch, Supervisor, SupervisorState};
