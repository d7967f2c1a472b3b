// Automatic mode: steering angles map straight to speeds, no smoothing

use crate::messages::{RemoteAngles, SpeedPair};

const MAX_ANGLE: f32 = 180.0;

/// 0° -> 0.0, 180° -> 1.0, clamped
pub fn angle_to_speed(angle: f32) -> f32 {
    if angle.is_nan() {
        return 0.0;
    }
    (angle / MAX_ANGLE).clamp(0.0, 1.0)
}

/// Speeds for automatic mode; stops both motors until angles have arrived
pub fn speeds(remote: Option<RemoteAngles>) -> SpeedPair {
    match remote {
        Some(angles) => SpeedPair::new(angle_to_speed(angles.left), angle_to_speed(angles.right)),
        None => SpeedPair::STOP,
    }
}
