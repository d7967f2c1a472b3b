// Normalized speed -> PWM duty mapping for continuous-rotation servos
// Only forward rotation is used: duty runs from `stop` up to `full_forward`.

use serde::Deserialize;

use crate::config::{DEAD_ZONE, DEFAULT_FULL_FORWARD_DUTY, DEFAULT_STOP_DUTY};

/// Which motor a channel drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Per-motor duty calibration (raw duty at 50 Hz)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub stop: u16,
    pub full_forward: u16,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            stop: DEFAULT_STOP_DUTY,
            full_forward: DEFAULT_FULL_FORWARD_DUTY,
        }
    }
}

/// A motor and its calibration, fixed after configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorChannel {
    pub side: Side,
    pub calibration: Calibration,
}

impl MotorChannel {
    pub fn new(side: Side, calibration: Calibration) -> Self {
        Self { side, calibration }
    }

    pub fn duty(&self, speed: f32) -> u16 {
        duty(speed, &self.calibration)
    }
}

/// Convert a speed in [0.0, 1.0] to a duty value
///
/// Speeds inside the dead zone return the stop duty. Above it the duty is
/// interpolated linearly between stop and full forward and truncated.
pub fn duty(speed: f32, calibration: &Calibration) -> u16 {
    if speed <= DEAD_ZONE {
        return calibration.stop;
    }
    let stop = calibration.stop as f32;
    let span = calibration.full_forward as f32 - stop;
    (stop + span * speed) as u16
}
