//! Angle bookkeeping.
//!
//! The commander works in an unsigned working range `[0, 2 * offset]`. Pan maps
//! as `working = hw + offset`; tilt is mirrored, `working = offset - hw`.

use crate::config::ActuatorConfig;

/// Last commanded physical angles, signed degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorPose {
    pub pan_angle: i32,
    pub tilt_angle: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MechanicalLimits {
    pub min: i32,
    pub max: i32,
}

impl MechanicalLimits {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, angle: i32) -> bool {
        (self.min..=self.max).contains(&angle)
    }
}

impl Default for MechanicalLimits {
    fn default() -> Self {
        Self::new(-90, 90)
    }
}

impl From<&ActuatorConfig> for MechanicalLimits {
    fn from(cfg: &ActuatorConfig) -> Self {
        Self::new(cfg.min_angle, cfg.max_angle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseMapping {
    offset: f64,
}

impl PoseMapping {
    pub fn new(offset: i32) -> Self {
        Self {
            offset: f64::from(offset),
        }
    }

    pub fn working_max(&self) -> f64 {
        2.0 * self.offset
    }

    pub fn clamp(&self, working: f64) -> f64 {
        clamp_working(working, self.working_max())
    }

    pub fn pan_to_working(&self, hw: i32) -> f64 {
        f64::from(hw) + self.offset
    }

    pub fn tilt_to_working(&self, hw: i32) -> f64 {
        self.offset - f64::from(hw)
    }

    /// Truncates toward zero.
    pub fn pan_to_hardware(&self, working: f64) -> i32 {
        (working - self.offset) as i32
    }

    /// Truncates toward zero.
    pub fn tilt_to_hardware(&self, working: f64) -> i32 {
        (self.offset - working) as i32
    }
}

impl Default for PoseMapping {
    fn default() -> Self {
        Self::new(90)
    }
}

/// Clamp a working-range value into `[0, max]`.
pub fn clamp_working(value: f64, max: f64) -> f64 {
    value.clamp(0.0, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_extremes_line_up_with_hardware_range() {
        let m = PoseMapping::default();
        assert_eq!(m.pan_to_working(-90), 0.0);
        assert_eq!(m.pan_to_working(90), 180.0);
        assert_eq!(m.tilt_to_working(90), 0.0);
        assert_eq!(m.tilt_to_working(-90), 180.0);
        assert_eq!(m.pan_to_hardware(m.pan_to_working(37)), 37);
        assert_eq!(m.tilt_to_hardware(m.tilt_to_working(-12)), -12);
    }

    #[test]
    fn hardware_conversion_truncates_toward_zero() {
        let m = PoseMapping::default();
        assert_eq!(m.pan_to_hardware(82.5), -7);
        assert_eq!(m.pan_to_hardware(97.9), 7);
        assert_eq!(m.tilt_to_hardware(97.9), -7);
    }
}
