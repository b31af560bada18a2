use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use pantilt_tracker::perception::{Flipped, SyntheticCamera};
use pantilt_tracker::signal::install_signal_listener;
use pantilt_tracker::{
    load_config, shutdown_channel, BrightSpotDetector, SimulatedPanTilt, Supervisor,
};

const CONFIG_PATH: &str = "config/tracker.toml";

#[derive(Parser, Debug)]
#[command(author, version, about = "Keep a detected target centered with a pan/tilt unit")]
struct Cli {
    /// Path to the detector model file
    #[arg(short, long, alias = "cascade")]
    model: PathBuf,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_thread_names(true).init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = load_config(CONFIG_PATH).context("loading tracker configuration")?;
    let detector = BrightSpotDetector::from_file(&cli.model)
        .with_context(|| format!("loading detector model {}", cli.model.display()))?;

    let device = SimulatedPanTilt::new();
    let camera = Flipped::new(
        SyntheticCamera::new(config.simulation.clone(), device.pose_reader()),
        config.perception.flip_vertical,
    );

    let (shutdown, requests) = shutdown_channel();
    install_signal_listener(shutdown)?;

    info!("starting pan/tilt tracker, press ctrl-c to stop");
    let report = Supervisor::new(config, device, camera, detector, requests).run()?;
    info!(
        reason = %report.reason,
        frames = report.metrics.frames,
        actuations = report.metrics.actuations,
        "tracker stopped"
    );
    Ok(())
}
