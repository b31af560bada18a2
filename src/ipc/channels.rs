use crossbeam::channel::{unbounded, Receiver, Sender};
use std::fmt;

use crate::error::TrackerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// An OS termination signal, named.
    Signal(&'static str),
    /// Requested programmatically through a [`ShutdownHandle`].
    Requested,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Signal(name) => write!(f, "signal {name}"),
            ShutdownReason::Requested => write!(f, "shutdown request"),
        }
    }
}

/// Cloneable sender side of the shutdown-request channel.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Sender<ShutdownReason>,
}

impl ShutdownHandle {
    /// Returns `false` if the supervisor is already gone.
    pub fn request(&self, reason: ShutdownReason) -> bool {
        self.tx.send(reason).is_ok()
    }
}

pub fn shutdown_channel() -> (ShutdownHandle, Receiver<ShutdownReason>) {
    let (tx, rx) = unbounded();
    (ShutdownHandle { tx }, rx)
}

/// Sent by a worker thread when its loop returns, for whatever reason.
#[derive(Debug)]
pub struct LoopExit {
    pub name: &'static str,
    pub result: Result<(), TrackerError>,
}

// ============================================================================
// SUPERVISOR CHANNELS - worker threads -> supervisor
// ============================================================================

#[derive(Clone)]
pub struct SupervisorChannels {
    pub exit_tx: Sender<LoopExit>,
    pub exit_rx: Receiver<LoopExit>,
}

impl SupervisorChannels {
    pub fn new() -> Self {
        let (exit_tx, exit_rx) = unbounded();
        Self { exit_tx, exit_rx }
    }
}

impl Default for SupervisorChannels {
    fn default() -> Self {
        Self::new()
    }
}
