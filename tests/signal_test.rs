//! OS signal delivery into the shutdown channel
#![cfg(unix)]

use pantilt_tracker::signal::install_signal_listener;
use pantilt_tracker::{shutdown_channel, ShutdownReason};
use std::time::Duration;

// Only one test in this binary: the listener consumes the first signal and
// exits, and the process-wide handler stays installed afterwards.
#[test]
fn test_sigterm_becomes_shutdown_request() {
    let (shutdown, requests) = shutdown_channel();
    let listener = install_signal_listener(shutdown).unwrap();

    let rc = unsafe { libc::raise(libc::SIGTERM) };
    assert_eq!(rc, 0, "raise(SIGTERM) failed");

    let reason = requests
        .recv_timeout(Duration::from_secs(5))
        .expect("SIGTERM should arrive as a shutdown request");
    assert_eq!(reason, ShutdownReason::Signal("SIGTERM"));
    listener.join().unwrap();
}
