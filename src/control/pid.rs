use std::time::Instant;

use crate::config::AxisConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl From<&AxisConfig> for PidGains {
    fn from(cfg: &AxisConfig) -> Self {
        Self {
            kp: cfg.kp,
            ki: cfg.ki,
            kd: cfg.kd,
        }
    }
}

/// Textbook PID driven by wall-clock time between updates.
///
/// The output is not clamped; the actuation side owns range limits. Callers
/// must not feed NaN or infinite errors, they propagate into the state.
pub struct FeedbackController {
    // Gains
    gains: PidGains,

    // State
    integral: f64,
    prev_error: f64,
    prev_time: Instant,

    // Anti-windup, off unless configured
    integral_limit: Option<f64>,
}

impl FeedbackController {
    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral: 0.0,
            prev_error: 0.0,
            prev_time: Instant::now(),
            integral_limit: None,
        }
    }

    pub fn with_integral_limit(mut self, limit: Option<f64>) -> Self {
        self.integral_limit = limit.map(f64::abs);
        self
    }

    pub fn from_config(cfg: &AxisConfig) -> Self {
        Self::new(PidGains::from(cfg)).with_integral_limit(cfg.integral_limit)
    }

    /// Zero the integral and previous error and restart the clock.
    pub fn initialize(&mut self) {
        self.initialize_at(Instant::now());
    }

    pub fn initialize_at(&mut self, now: Instant) {
        self.integral = 0.0;
        self.prev_error = 0.0;
        self.prev_time = now;
    }

    pub fn update(&mut self, error: f64) -> f64 {
        self.update_at(error, Instant::now())
    }

    /// Same as [`update`](Self::update) with an explicit timestamp.
    ///
    /// A zero (or backwards) elapsed time returns the proportional term only
    /// and leaves the integral and previous error untouched.
    pub fn update_at(&mut self, error: f64, now: Instant) -> f64 {
        let dt = now.saturating_duration_since(self.prev_time).as_secs_f64();
        let p = self.gains.kp * error;
        if dt <= 0.0 {
            return p;
        }
        self.prev_time = now;

        self.integral += error * dt;
        if let Some(limit) = self.integral_limit {
            self.integral = self.integral.clamp(-limit, limit);
        }
        let i = self.gains.ki * self.integral;

        let d = self.gains.kd * (error - self.prev_error) / dt;
        self.prev_error = error;

        p + i + d
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn previous_error(&self) -> f64 {
        self.prev_error
    }
}
