//! IPC module - state shared between the tracking threads and the plumbing
//! that lets the supervisor start, observe and stop them.

pub mod channels;
pub mod shared_state;
pub mod stop;

pub use channels::{shutdown_channel, LoopExit, ShutdownHandle, ShutdownReason, SupervisorChannels};
pub use shared_state::{
    Axis, AxisCommand, CommandPublisher, PerceptionPublisher, Point, SharedControlState,
    StateReader, StateSnapshot,
};
pub use stop::{StopSignal, STOP_POLL_INTERVAL};
