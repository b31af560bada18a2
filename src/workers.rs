//! One named OS thread per loop. Every thread reports how its loop ended on
//! the supervisor's exit channel, panics included.

use crossbeam::channel::Sender;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tracing::error;

use crate::actuator::{ActuatorCommander, ActuatorInterface};
use crate::control::AxisControlLoop;
use crate::error::TrackerError;
use crate::ipc::{Axis, LoopExit, StopSignal};
use crate::perception::{Detector, FrameSource, TargetLocator};

pub struct Worker {
    pub name: &'static str,
    pub handle: JoinHandle<()>,
}

fn spawn_loop<F>(
    name: &'static str,
    stop: StopSignal,
    exits: Sender<LoopExit>,
    body: F,
) -> Result<Worker, TrackerError>
where
    F: FnOnce(&StopSignal) -> Result<(), TrackerError> + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let result = match panic::catch_unwind(AssertUnwindSafe(|| body(&stop))) {
                Ok(Ok(())) if !stop.is_stopped() => Err(TrackerError::LoopExitedEarly { name }),
                Ok(result) => result,
                Err(_) => Err(TrackerError::LoopPanicked { name }),
            };
            if let Err(e) = &result {
                error!(worker = name, error = %e, "loop terminated");
            }
            let _ = exits.send(LoopExit { name, result });
        })
        .map_err(|source| TrackerError::Spawn { name, source })?;

    Ok(Worker { name, handle })
}

pub fn spawn_locator_thread<S, D>(
    locator: TargetLocator<S, D>,
    stop: StopSignal,
    exits: Sender<LoopExit>,
) -> Result<Worker, TrackerError>
where
    S: FrameSource + 'static,
    D: Detector + 'static,
{
    spawn_loop("target-locator", stop, exits, move |stop| locator.run(stop))
}

pub fn spawn_axis_thread(
    axis_loop: AxisControlLoop,
    stop: StopSignal,
    exits: Sender<LoopExit>,
) -> Result<Worker, TrackerError> {
    let name = match axis_loop.axis() {
        Axis::Pan => "pan-control",
        Axis::Tilt => "tilt-control",
    };
    spawn_loop(name, stop, exits, move |stop| axis_loop.run(stop))
}

pub fn spawn_commander_thread<A>(
    commander: ActuatorCommander<A>,
    stop: StopSignal,
    exits: Sender<LoopExit>,
) -> Result<Worker, TrackerError>
where
    A: ActuatorInterface + 'static,
{
    spawn_loop("actuator-commander", stop, exits, move |stop| commander.run(stop))
}
