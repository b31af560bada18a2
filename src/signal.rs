//! Turns OS termination signals into shutdown requests.

use std::io;
use std::thread::{self, JoinHandle};
use tracing::{error, info};

use crate::error::TrackerError;
use crate::ipc::{ShutdownHandle, ShutdownReason};

/// Register for SIGINT (and SIGTERM on unix) and spawn a thread that forwards
/// the first one it sees to `shutdown`.
///
/// Handlers are installed before this returns, so a signal raised afterwards
/// is always delivered as a request rather than killing the process.
pub fn install_signal_listener(shutdown: ShutdownHandle) -> Result<JoinHandle<()>, TrackerError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(TrackerError::Signal)?;

    let mut signals = {
        let _guard = runtime.enter();
        TerminationSignals::register().map_err(TrackerError::Signal)?
    };

    thread::Builder::new()
        .name("signal-listener".into())
        .spawn(move || match runtime.block_on(signals.recv()) {
            Ok(reason) => {
                info!(%reason, "termination requested");
                shutdown.request(reason);
            }
            Err(e) => error!(error = %e, "signal listener failed"),
        })
        .map_err(|source| TrackerError::Spawn {
            name: "signal-listener",
            source,
        })
}

#[cfg(unix)]
struct TerminationSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl TerminationSignals {
    fn register() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> io::Result<ShutdownReason> {
        tokio::select! {
            _ = self.interrupt.recv() => Ok(ShutdownReason::Signal("SIGINT")),
            _ = self.terminate.recv() => Ok(ShutdownReason::Signal("SIGTERM")),
        }
    }
}

#[cfg(not(unix))]
struct TerminationSignals {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(not(unix))]
impl TerminationSignals {
    fn register() -> io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    async fn recv(&mut self) -> io::Result<ShutdownReason> {
        match self.ctrl_c.recv().await {
            Some(()) => Ok(ShutdownReason::Signal("ctrl-c")),
            None => Err(io::Error::new(io::ErrorKind::Other, "ctrl-c stream closed")),
        }
    }
}
