use std::time::Instant;
use tracing::{info, trace};

use super::pid::FeedbackController;
use crate::error::TrackerError;
use crate::ipc::{Axis, CommandPublisher, StateReader, StopSignal, STOP_POLL_INTERVAL};
use crate::metrics::LoopMetrics;

/// Turns one axis' positional error into a command.
///
/// Runs one controller update per published perception cycle that carries a
/// detection. Between publications the loop blocks on the shared state's
/// notification instead of spinning.
pub struct AxisControlLoop {
    controller: FeedbackController,
    state: StateReader,
    output: CommandPublisher,
    metrics: LoopMetrics,
}

impl AxisControlLoop {
    pub fn new(
        controller: FeedbackController,
        state: StateReader,
        output: CommandPublisher,
        metrics: LoopMetrics,
    ) -> Self {
        Self {
            controller,
            state,
            output,
            metrics,
        }
    }

    pub fn axis(&self) -> Axis {
        self.output.axis()
    }

    pub fn controller(&self) -> &FeedbackController {
        &self.controller
    }

    /// `center - centroid` along this axis, from the latest published values.
    pub fn current_error(&self) -> f64 {
        let axis = self.axis();
        let center = i64::from(axis.component(self.state.frame_center()));
        let centroid = i64::from(axis.component(self.state.target_centroid()));
        (center - centroid) as f64
    }

    /// Run a single update against the current state. Returns the published
    /// command, or `None` when there is no detection to act on.
    pub fn step(&mut self) -> Option<f64> {
        if !self.state.detected() {
            return None;
        }
        let axis = self.axis();
        let start = Instant::now();
        let error = self.current_error();
        let command = self.controller.update(error);
        self.output.publish(command);
        self.metrics.record_control(axis, start.elapsed());
        trace!(%axis, error, command, "axis update");
        Some(command)
    }

    pub fn run(mut self, stop: &StopSignal) -> Result<(), TrackerError> {
        let axis = self.axis();
        self.controller.initialize();
        let mut seen = self.state.publication();
        info!(%axis, "axis control loop started");

        while !stop.is_stopped() {
            let latest = self.state.wait_for_publication(seen, STOP_POLL_INTERVAL);
            if latest == seen {
                continue;
            }
            seen = latest;
            self.step();
        }

        info!(%axis, "axis control loop stopped");
        Ok(())
    }
}
