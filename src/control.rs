//! Control module - per-axis feedback control

pub mod axis_loop;
pub mod pid;

pub use axis_loop::AxisControlLoop;
pub use pid::{FeedbackController, PidGains};
