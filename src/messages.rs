// Message and value types shared by the listener, the control core and the motor side

use serde::{Deserialize, Serialize};

// Control message from the network -> runtime
// Every field is optional; unknown fields are ignored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_arm_angle: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_arm_angle: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_switch: Option<String>,
}

impl ControlMessage {
    /// Both angles, if the message carries both
    pub fn angles(&self) -> Option<RemoteAngles> {
        match (self.left_arm_angle, self.right_arm_angle) {
            (Some(left), Some(right)) => Some(RemoteAngles { left, right }),
            _ => None,
        }
    }

    pub fn requests_manual(&self) -> bool {
        self.mode_switch.as_deref() == Some("manual")
    }
}

/// Last steering angles received, in degrees (nominally 0..=180)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoteAngles {
    pub left: f32,
    pub right: f32,
}

/// Active control mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    #[default]
    Manual,
    Automatic,
}

/// Normalized speeds, one per motor
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpeedPair {
    pub left: f32,
    pub right: f32,
}

impl SpeedPair {
    pub const STOP: SpeedPair = SpeedPair {
        left: 0.0,
        right: 0.0,
    };

    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Both components clamped to [0.0, 1.0]; NaN becomes 0.0
    pub fn clamped(self) -> Self {
        Self {
            left: clamp_unit(self.left),
            right: clamp_unit(self.right),
        }
    }
}

/// Hardware duty values, one per motor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DutyPair {
    pub left: u16,
    pub right: u16,
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
