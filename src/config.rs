//! Runtime configuration loaded from TOML.
//!
//! Every section carries `#[serde(default)]`, so a partial file only needs the
//! keys it overrides.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ============================================================================
// AXIS GAINS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Minimum |command| that results in actuation.
    pub deadband: f64,
    /// Symmetric clamp on the accumulated integral. `None` leaves it unbounded.
    pub integral_limit: Option<f64>,
}

impl AxisConfig {
    pub fn pan_defaults() -> Self {
        Self {
            kp: 0.08,
            ki: 0.0033,
            kd: 0.0011,
            deadband: 1.0,
            integral_limit: None,
        }
    }

    pub fn tilt_defaults() -> Self {
        Self {
            kp: 0.08,
            ki: 0.003,
            kd: 0.001,
            deadband: 2.0,
            integral_limit: None,
        }
    }
}

/// Keys present in an `[pan]`/`[tilt]` table; absent keys keep the axis default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct AxisOverrides {
    kp: Option<f64>,
    ki: Option<f64>,
    kd: Option<f64>,
    deadband: Option<f64>,
    integral_limit: Option<f64>,
}

impl AxisOverrides {
    fn apply(self, base: AxisConfig) -> AxisConfig {
        AxisConfig {
            kp: self.kp.unwrap_or(base.kp),
            ki: self.ki.unwrap_or(base.ki),
            kd: self.kd.unwrap_or(base.kd),
            deadband: self.deadband.unwrap_or(base.deadband),
            integral_limit: self.integral_limit.or(base.integral_limit),
        }
    }
}

// ============================================================================
// ACTUATOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Offset mapping the signed hardware range onto `[0, 2 * offset]`.
    pub working_offset: i32,
    pub min_angle: i32,
    pub max_angle: i32,
    pub settle_secs: f64,
    pub rate_limit_secs: f64,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            working_offset: 90,
            min_angle: -90,
            max_angle: 90,
            settle_secs: 3.0,
            rate_limit_secs: 0.2,
        }
    }
}

impl ActuatorConfig {
    pub fn settle_interval(&self) -> Duration {
        secs_to_duration(self.settle_secs)
    }

    pub fn rate_limit_interval(&self) -> Duration {
        secs_to_duration(self.rate_limit_secs)
    }
}

// ============================================================================
// SELF TEST
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SelfTestConfig {
    pub step_degrees: i32,
    pub step_delay_ms: u64,
    pub pre_sweep_pause_ms: u64,
    pub post_sweep_pause_ms: u64,
    pub rest_settle_ms: u64,
    pub rest_pan: i32,
    pub rest_tilt: i32,
}

impl Default for SelfTestConfig {
    fn default() -> Self {
        Self {
            step_degrees: 1,
            step_delay_ms: 5,
            pre_sweep_pause_ms: 1000,
            post_sweep_pause_ms: 500,
            rest_settle_ms: 1000,
            rest_pan: 0,
            rest_tilt: 60,
        }
    }
}

// ============================================================================
// PERCEPTION / SIMULATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    pub warmup_secs: f64,
    pub flip_vertical: bool,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            warmup_secs: 2.0,
            flip_vertical: false,
        }
    }
}

impl PerceptionConfig {
    pub fn warmup(&self) -> Duration {
        secs_to_duration(self.warmup_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub width: u32,
    pub height: u32,
    pub frame_interval_ms: u64,
    pub pixels_per_degree: f64,
    pub target_size: u32,
    pub amplitude_pan_deg: f64,
    pub amplitude_tilt_deg: f64,
    pub period_secs: f64,
    pub dropout_probability: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            frame_interval_ms: 33,
            pixels_per_degree: 1.5,
            target_size: 12,
            amplitude_pan_deg: 30.0,
            amplitude_tilt_deg: 15.0,
            period_secs: 20.0,
            dropout_probability: 0.05,
            seed: 42,
        }
    }
}

// ============================================================================
// TOP LEVEL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawTrackerConfig")]
pub struct TrackerConfig {
    pub pan: AxisConfig,
    pub tilt: AxisConfig,
    pub actuator: ActuatorConfig,
    pub self_test: SelfTestConfig,
    pub perception: PerceptionConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTrackerConfig {
    pan: AxisOverrides,
    tilt: AxisOverrides,
    actuator: ActuatorConfig,
    self_test: SelfTestConfig,
    perception: PerceptionConfig,
    simulation: SimulationConfig,
}

impl From<RawTrackerConfig> for TrackerConfig {
    fn from(raw: RawTrackerConfig) -> Self {
        Self {
            pan: raw.pan.apply(AxisConfig::pan_defaults()),
            tilt: raw.tilt.apply(AxisConfig::tilt_defaults()),
            actuator: raw.actuator,
            self_test: raw.self_test,
            perception: raw.perception,
            simulation: raw.simulation,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            pan: AxisConfig::pan_defaults(),
            tilt: AxisConfig::tilt_defaults(),
            actuator: ActuatorConfig::default(),
            self_test: SelfTestConfig::default(),
            perception: PerceptionConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn from_toml_str(s: &str, origin: &str) -> Result<Self, ConfigError> {
        let cfg: TrackerConfig = toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, axis) in [("pan", &self.pan), ("tilt", &self.tilt)] {
            let gains = [axis.kp, axis.ki, axis.kd, axis.deadband];
            if gains.iter().any(|g| !g.is_finite() || *g < 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name}: gains and deadband must be finite and non-negative"
                )));
            }
            if let Some(limit) = axis.integral_limit {
                if !limit.is_finite() || limit <= 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "{name}: integral_limit must be positive"
                    )));
                }
            }
        }

        let act = &self.actuator;
        if act.working_offset <= 0 {
            return Err(ConfigError::Invalid("working_offset must be positive".into()));
        }
        if act.min_angle >= act.max_angle
            || act.min_angle < -act.working_offset
            || act.max_angle > act.working_offset
        {
            return Err(ConfigError::Invalid(format!(
                "mechanical limit [{}, {}] must be a non-empty range inside [-{off}, {off}]",
                act.min_angle,
                act.max_angle,
                off = act.working_offset
            )));
        }
        check_interval("actuator.settle_secs", act.settle_secs)?;
        check_interval("actuator.rate_limit_secs", act.rate_limit_secs)?;

        let st = &self.self_test;
        if st.step_degrees <= 0 {
            return Err(ConfigError::Invalid("self_test.step_degrees must be positive".into()));
        }
        let limit = act.min_angle..=act.max_angle;
        if !limit.contains(&st.rest_pan) || !limit.contains(&st.rest_tilt) {
            return Err(ConfigError::Invalid(format!(
                "rest pose ({}, {}) lies outside the mechanical limit",
                st.rest_pan, st.rest_tilt
            )));
        }

        check_interval("perception.warmup_secs", self.perception.warmup_secs)?;

        let sim = &self.simulation;
        if sim.width == 0 || sim.height == 0 || sim.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid("simulation frame geometry must be non-zero".into()));
        }
        if !(0.0..=1.0).contains(&sim.dropout_probability) {
            return Err(ConfigError::Invalid("dropout_probability must be within [0, 1]".into()));
        }
        Ok(())
    }
}

/// Saturating conversion for configs that skipped [`TrackerConfig::validate`]:
/// negative or NaN becomes zero, anything too large becomes `Duration::MAX`.
fn secs_to_duration(secs: f64) -> Duration {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) => d,
        Err(_) if secs > 0.0 => Duration::MAX,
        Err(_) => Duration::ZERO,
    }
}

/// Intervals must be finite, non-negative and fit in a `Duration`.
fn check_interval(name: &str, secs: f64) -> Result<(), ConfigError> {
    if secs.is_finite() && Duration::try_from_secs_f64(secs).is_ok() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be a finite, non-negative number of seconds, got {secs}"
        )))
    }
}

/// Load the tracker configuration. A missing file yields defaults; a file that
/// exists but does not parse or validate is an error.
pub fn load_config(path: impl AsRef<Path>) -> Result<TrackerConfig, ConfigError> {
    let path = path.as_ref();
    let origin = path.display().to_string();
    match std::fs::read_to_string(path) {
        Ok(s) => TrackerConfig::from_toml_str(&s, &origin),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %origin, "no config file found, using defaults");
            Ok(TrackerConfig::default())
        }
        Err(source) => Err(ConfigError::Read { path: origin, source }),
    }
}
