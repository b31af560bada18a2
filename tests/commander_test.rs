//! Timed behaviour of the actuation loop: settle once, rate limit, and
//! re-checking the target after every delay

mod common;

use common::{fast_config, wait_until};
use pantilt_tracker::error::TrackerError;
use pantilt_tracker::ipc::PerceptionPublisher;
use pantilt_tracker::{
    ActuatorCall, ActuatorCommander, ActuatorHandle, CommanderSettings, LoopMetrics, Point,
    SharedControlState, SimulatedPanTilt, StopSignal,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const CENTER: Point = Point::new(160, 120);

struct Harness {
    sim: SimulatedPanTilt,
    perception: PerceptionPublisher,
    stop: StopSignal,
    commander: JoinHandle<Result<(), TrackerError>>,
}

impl Harness {
    /// Start the commander loop on its own thread with the given delays and a
    /// standing pan command well outside the deadband.
    fn start(settle: Duration, rate_limit: Duration) -> Self {
        let mut cfg = fast_config();
        cfg.actuator.settle_secs = settle.as_secs_f64();
        cfg.actuator.rate_limit_secs = rate_limit.as_secs_f64();

        let SharedControlState {
            perception,
            mut pan,
            tilt: _,
            reader,
        } = SharedControlState::new();
        pan.publish(10.0);

        let sim = SimulatedPanTilt::new();
        let handle = ActuatorHandle::new(sim.clone());
        handle.enable_all().unwrap();
        let commander = ActuatorCommander::new(
            handle,
            reader,
            CommanderSettings::from_config(&cfg),
            LoopMetrics::new().unwrap(),
        )
        .unwrap();
        sim.clear_calls();

        let stop = StopSignal::new();
        let loop_stop = stop.clone();
        let commander = thread::spawn(move || commander.run(&loop_stop));

        Self {
            sim,
            perception,
            stop,
            commander,
        }
    }

    fn acquire(&mut self) {
        self.perception.publish(CENTER, Some(Point::new(60, 120)));
    }

    fn lose(&mut self) {
        self.perception.publish(CENTER, None);
    }

    fn set_count(&self) -> usize {
        self.sim
            .calls()
            .iter()
            .filter(|c| matches!(c, ActuatorCall::SetPan(_) | ActuatorCall::SetTilt(_)))
            .count()
    }

    fn finish(self) {
        self.stop.trigger();
        self.commander.join().unwrap().unwrap();
    }
}

// ============================================================================
// SETTLE TESTS
// ============================================================================

#[test]
fn test_first_detection_waits_for_settle() {
    let settle = Duration::from_millis(300);
    let mut h = Harness::start(settle, Duration::from_millis(5));

    let acquired = Instant::now();
    h.acquire();

    thread::sleep(Duration::from_millis(100));
    assert_eq!(h.set_count(), 0, "No actuation before the settle interval has passed");

    assert!(wait_until(Duration::from_secs(5), || h.set_count() > 0));
    assert!(
        acquired.elapsed() >= settle,
        "First actuation came after {:?}, before the settle interval",
        acquired.elapsed()
    );
    h.finish();
}

#[test]
fn test_settle_happens_only_once() {
    let settle = Duration::from_millis(300);
    let mut h = Harness::start(settle, Duration::from_millis(5));

    h.acquire();
    assert!(wait_until(Duration::from_secs(5), || h.set_count() > 0));

    h.lose();
    thread::sleep(Duration::from_millis(50));
    let before = h.set_count();

    let reacquired = Instant::now();
    h.acquire();
    assert!(wait_until(Duration::from_secs(5), || h.set_count() > before));
    assert!(
        reacquired.elapsed() < Duration::from_millis(200),
        "Re-acquisition should not settle again, took {:?}",
        reacquired.elapsed()
    );
    h.finish();
}

// ============================================================================
// RATE LIMIT TESTS
// ============================================================================

#[test]
fn test_loss_during_rate_limit_skips_actuation() {
    let mut h = Harness::start(Duration::ZERO, Duration::from_millis(200));

    h.acquire();
    // Inside the rate-limit sleep that follows the acquisition.
    thread::sleep(Duration::from_millis(50));
    h.lose();

    thread::sleep(Duration::from_millis(400));
    assert_eq!(h.set_count(), 0, "A target lost during the delay must not be acted on");
    h.finish();
}

#[test]
fn test_rate_limit_spaces_actuations() {
    let rate_limit = Duration::from_millis(50);
    let mut h = Harness::start(Duration::ZERO, rate_limit);

    let acquired = Instant::now();
    h.acquire();
    assert!(wait_until(Duration::from_secs(5), || h.set_count() >= 4));
    let elapsed = acquired.elapsed();

    assert!(
        elapsed >= rate_limit * 4,
        "Four actuations in {elapsed:?} is faster than the rate limit allows"
    );
    h.finish();
}
