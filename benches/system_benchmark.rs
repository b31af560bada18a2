use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pantilt_tracker::perception::BrightSpotModel;
use pantilt_tracker::{
    ActuatorCommander, ActuatorHandle, AxisCommand, BrightSpotDetector, CommanderSettings,
    Detector, FeedbackController, Frame, LoopMetrics, PidGains, Point, SharedControlState,
    SimulatedPanTilt, TrackerConfig,
};

fn benchmark_pid_update(c: &mut Criterion) {
    let mut pid = FeedbackController::new(PidGains { kp: 0.08, ki: 0.0033, kd: 0.0011 });
    pid.initialize();
    c.bench_function("pid_update", |b| b.iter(|| pid.update(black_box(48.0))));
}

fn benchmark_commander_step(c: &mut Criterion) {
    let cfg = TrackerConfig::default();
    let state = SharedControlState::new();
    let sim = SimulatedPanTilt::new();
    let handle = ActuatorHandle::new(sim.clone());
    let mut commander = ActuatorCommander::new(
        handle,
        state.reader,
        CommanderSettings::from_config(&cfg),
        LoopMetrics::new().unwrap(),
    )
    .unwrap();

    // Alternating signs keep the pose away from the clamp.
    let mut sign = 1.0;
    c.bench_function("commander_step", |b| {
        b.iter(|| {
            sign = -sign;
            sim.clear_calls();
            commander
                .step(black_box(AxisCommand { pan: 3.0 * sign, tilt: 3.0 * sign }))
                .unwrap()
        })
    });
}

fn benchmark_bright_spot(c: &mut Criterion) {
    let mut frame = Frame::blank(320, 240, 1);
    for y in 100..112 {
        for x in 60..72 {
            frame.pixels[y * 320 + x] = 255;
        }
    }
    let mut detector = BrightSpotDetector::new(BrightSpotModel::default());
    let center = Point::new(160, 120);
    c.bench_function("bright_spot_locate", |b| {
        b.iter(|| detector.locate(black_box(&frame), center).unwrap())
    });
}

criterion_group!(benches, benchmark_pid_update, benchmark_commander_step, benchmark_bright_spot);
criterion_main!(benches);
