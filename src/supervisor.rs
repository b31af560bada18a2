//! Lifecycle owner: INIT -> SELF_TEST -> RUNNING -> SHUTTING_DOWN -> STOPPED.
//!
//! Shutdown always disables both servo channels before the loops are asked to
//! stop, and `run` never returns before that has happened.

use crossbeam::channel::{select, Receiver};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::actuator::{
    ActuatorCommander, ActuatorHandle, ActuatorInterface, CommanderSettings, SelfTestReport,
    SelfTestSequencer,
};
use crate::config::TrackerConfig;
use crate::control::{AxisControlLoop, FeedbackController};
use crate::error::TrackerError;
use crate::ipc::{LoopExit, SharedControlState, ShutdownReason, StopSignal, SupervisorChannels};
use crate::metrics::{LoopMetrics, MetricsReport};
use crate::perception::{Detector, FrameSource, TargetLocator};
use crate::workers::{self, Worker};

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Init = 0,
    SelfTest = 1,
    Running = 2,
    ShuttingDown = 3,
    Stopped = 4,
}

impl SupervisorState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => SupervisorState::Init,
            1 => SupervisorState::SelfTest,
            2 => SupervisorState::Running,
            3 => SupervisorState::ShuttingDown,
            _ => SupervisorState::Stopped,
        }
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SupervisorState::Init => "INIT",
            SupervisorState::SelfTest => "SELF_TEST",
            SupervisorState::Running => "RUNNING",
            SupervisorState::ShuttingDown => "SHUTTING_DOWN",
            SupervisorState::Stopped => "STOPPED",
        };
        f.write_str(s)
    }
}

/// Observes the supervisor's state from any thread.
#[derive(Clone)]
pub struct StateWatch {
    state: Arc<AtomicU8>,
}

impl StateWatch {
    fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(SupervisorState::Init as u8)),
        }
    }

    pub fn get(&self) -> SupervisorState {
        SupervisorState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set(&self, state: SupervisorState) {
        self.state.store(state as u8, Ordering::Release);
        info!(%state, "supervisor state");
    }
}

#[derive(Debug, Clone)]
pub struct ShutdownReport {
    pub reason: ShutdownReason,
    pub self_test: SelfTestReport,
    pub loops_started: bool,
    pub metrics: MetricsReport,
}

enum Cause {
    Requested(ShutdownReason),
    LoopExited(LoopExit),
}

pub struct Supervisor<A, S, D> {
    config: TrackerConfig,
    actuator: ActuatorHandle<A>,
    source: S,
    detector: D,
    requests: Receiver<ShutdownReason>,
    watch: StateWatch,
}

impl<A, S, D> Supervisor<A, S, D>
where
    A: ActuatorInterface + 'static,
    S: FrameSource + 'static,
    D: Detector + 'static,
{
    /// `requests` is the receiving end of [`crate::ipc::shutdown_channel`].
    /// Keep at least one sender alive for as long as tracking should run; a
    /// disconnected channel counts as a shutdown request.
    pub fn new(
        config: TrackerConfig,
        device: A,
        source: S,
        detector: D,
        requests: Receiver<ShutdownReason>,
    ) -> Self {
        Self {
            config,
            actuator: ActuatorHandle::new(device),
            source,
            detector,
            requests,
            watch: StateWatch::new(),
        }
    }

    pub fn watch(&self) -> StateWatch {
        self.watch.clone()
    }

    pub fn actuator(&self) -> ActuatorHandle<A> {
        self.actuator.clone()
    }

    pub fn run(self) -> Result<ShutdownReport, TrackerError> {
        let Supervisor {
            config,
            actuator,
            source,
            detector,
            requests,
            watch,
        } = self;
        let metrics = LoopMetrics::new()?;

        watch.set(SupervisorState::Init);
        // Nothing is powered yet, so a bad config needs no disable.
        if let Err(e) = config.validate() {
            error!(error = %e, "startup failed");
            watch.set(SupervisorState::Stopped);
            return Err(e.into());
        }
        if let Err(e) = actuator.enable_all() {
            return Err(abort(&watch, &actuator, e.into()));
        }

        watch.set(SupervisorState::SelfTest);
        let self_test = match SelfTestSequencer::from_config(&config).run(&actuator) {
            Ok(report) => report,
            Err(e) => return Err(abort(&watch, &actuator, e.into())),
        };

        // Requests that arrived during INIT/SELF_TEST are honoured before any
        // loop starts.
        if let Ok(reason) = requests.try_recv() {
            info!(%reason, "shutdown requested before tracking started");
            watch.set(SupervisorState::ShuttingDown);
            disable(&actuator);
            watch.set(SupervisorState::Stopped);
            return Ok(ShutdownReport {
                reason,
                self_test,
                loops_started: false,
                metrics: metrics.report(),
            });
        }

        watch.set(SupervisorState::Running);
        let stop = StopSignal::new();
        let channels = SupervisorChannels::new();
        let workers = match start_loops(&config, &actuator, source, detector, &stop, &channels, &metrics) {
            Ok(workers) => workers,
            Err((e, started)) => {
                watch.set(SupervisorState::ShuttingDown);
                disable(&actuator);
                stop.trigger();
                join_all(started);
                watch.set(SupervisorState::Stopped);
                return Err(e);
            }
        };
        info!(loops = workers.len(), "tracking loops running");

        let cause = select! {
            recv(requests) -> msg => Cause::Requested(msg.unwrap_or_else(|_| {
                warn!("shutdown channel disconnected");
                ShutdownReason::Requested
            })),
            recv(channels.exit_rx) -> exit => match exit {
                Ok(exit) => Cause::LoopExited(exit),
                Err(_) => Cause::Requested(ShutdownReason::Requested),
            },
        };

        watch.set(SupervisorState::ShuttingDown);
        disable(&actuator);
        stop.trigger();
        let panicked = join_all(workers);
        for exit in channels.exit_rx.try_iter() {
            if let Err(e) = exit.result {
                warn!(worker = exit.name, error = %e, "loop reported failure during shutdown");
            }
        }
        watch.set(SupervisorState::Stopped);

        let report = metrics.report();
        info!(
            frames = report.frames,
            detection_pct = report.detection_rate(),
            pan_updates = report.pan_updates,
            tilt_updates = report.tilt_updates,
            actuations = report.actuations,
            deadband_skips = report.deadband_skips,
            out_of_range_drops = report.out_of_range_drops,
            perception_p99 = ?report.perception_p99,
            control_p99 = ?report.control_p99,
            "tracking metrics"
        );

        match cause {
            Cause::Requested(reason) => {
                if let Some(name) = panicked {
                    return Err(TrackerError::LoopPanicked { name });
                }
                info!(%reason, "clean shutdown");
                Ok(ShutdownReport {
                    reason,
                    self_test,
                    loops_started: true,
                    metrics: report,
                })
            }
            Cause::LoopExited(exit) => {
                let source = match exit.result {
                    Err(e) => e,
                    Ok(()) => TrackerError::LoopExitedEarly { name: exit.name },
                };
                Err(TrackerError::LoopFailed {
                    name: exit.name,
                    source: Box::new(source),
                })
            }
        }
    }
}

fn start_loops<A, S, D>(
    config: &TrackerConfig,
    actuator: &ActuatorHandle<A>,
    source: S,
    detector: D,
    stop: &StopSignal,
    channels: &SupervisorChannels,
    metrics: &LoopMetrics,
) -> Result<Vec<Worker>, (TrackerError, Vec<Worker>)>
where
    A: ActuatorInterface + 'static,
    S: FrameSource + 'static,
    D: Detector + 'static,
{
    let state = SharedControlState::new();
    let mut workers = Vec::with_capacity(4);

    let commander = match ActuatorCommander::new(
        actuator.clone(),
        state.reader.clone(),
        CommanderSettings::from_config(config),
        metrics.clone(),
    ) {
        Ok(c) => c,
        Err(e) => return Err((e.into(), workers)),
    };
    let locator = TargetLocator::new(source, detector, state.perception, metrics.clone())
        .with_warmup(config.perception.warmup());
    let pan = AxisControlLoop::new(
        FeedbackController::from_config(&config.pan),
        state.reader.clone(),
        state.pan,
        metrics.clone(),
    );
    let tilt = AxisControlLoop::new(
        FeedbackController::from_config(&config.tilt),
        state.reader.clone(),
        state.tilt,
        metrics.clone(),
    );

    let exits = &channels.exit_tx;
    let spawned = [
        workers::spawn_locator_thread(locator, stop.clone(), exits.clone()),
        workers::spawn_axis_thread(pan, stop.clone(), exits.clone()),
        workers::spawn_axis_thread(tilt, stop.clone(), exits.clone()),
        workers::spawn_commander_thread(commander, stop.clone(), exits.clone()),
    ];
    let mut failure = None;
    for result in spawned {
        match result {
            Ok(worker) => workers.push(worker),
            Err(e) => failure = failure.or(Some(e)),
        }
    }
    match failure {
        Some(e) => Err((e, workers)),
        None => Ok(workers),
    }
}

fn disable<A: ActuatorInterface>(actuator: &ActuatorHandle<A>) {
    match actuator.disable_all() {
        Ok(()) => info!("servos disabled"),
        Err(e) => error!(error = %e, "failed to disable servos"),
    }
}

fn abort<A: ActuatorInterface>(
    watch: &StateWatch,
    actuator: &ActuatorHandle<A>,
    error: TrackerError,
) -> TrackerError {
    error!(error = %error, "startup failed");
    watch.set(SupervisorState::ShuttingDown);
    disable(actuator);
    watch.set(SupervisorState::Stopped);
    error
}

/// Join every worker; returns the name of one that panicked, if any.
fn join_all(workers: Vec<Worker>) -> Option<&'static str> {
    let mut panicked = None;
    for worker in workers {
        if worker.handle.join().is_err() {
            error!(worker = worker.name, "worker thread panicked");
            panicked = Some(worker.name);
        }
    }
    panicked
}
