// Potentiometer steering
//
// Center position (within tolerance) stops both motors. Turning right speeds
// the right motor from 0.5 to 1.0 while the left one comes up from 0 to meet
// it; turning left mirrors that.

use crate::config::{ADC_MAX, PotConfig};
use crate::messages::SpeedPair;

pub fn pot_to_speeds(raw: u16, pot: &PotConfig) -> SpeedPair {
    let raw = raw.min(ADC_MAX) as i32;
    let center = pot.center as i32;
    let tolerance = pot.tolerance as i32;
    let offset = raw - center;

    if offset.abs() <= tolerance {
        return SpeedPair::STOP;
    }

    if offset > 0 {
        let max_right = ADC_MAX as i32 - center - tolerance;
        let norm = normalize(offset - tolerance, max_right);
        SpeedPair::new(norm, 0.5 + 0.5 * norm)
    } else {
        let max_left = center - tolerance;
        let norm = normalize(offset.abs() - tolerance, max_left);
        SpeedPair::new(0.5 + 0.5 * norm, norm)
    }
}

fn normalize(travel: i32, range: i32) -> f32 {
    if range <= 0 {
        return 1.0;
    }
    (travel.min(range) as f32 / range as f32).clamp(0.0, 1.0)
}
