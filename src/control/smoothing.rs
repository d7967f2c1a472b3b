// Linear speed transitions

use std::time::Duration;

/// Linear interpolation from `start` to `target`
///
/// `progress` is clamped to [0, 1]; the endpoints are returned exactly.
pub fn interpolate(start: f32, target: f32, progress: f32) -> f32 {
    if progress <= 0.0 || progress.is_nan() {
        start
    } else if progress >= 1.0 {
        target
    } else {
        start + (target - start) * progress
    }
}

/// Speed `elapsed` into a transition lasting `window`
pub fn smooth(start: f32, target: f32, elapsed: Duration, window: Duration) -> f32 {
    if window.is_zero() {
        return target;
    }
    interpolate(start, target, elapsed.as_secs_f32() / window.as_secs_f32())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_exact() {
        let values = [0.0, 0.05, 0.1, 0.3, 0.7, 0.93, 1.0];
        for &a in &values {
            for &b in &values {
                assert_eq!(interpolate(a, b, 0.0), a);
                assert_eq!(interpolate(a, b, 1.0), b);
            }
        }
    }

    #[test]
    fn test_midpoint() {
        assert!((interpolate(0.2, 0.8, 0.5) - 0.5).abs() < 1e-6);
        assert!((interpolate(1.0, 0.0, 0.25) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_progress_out_of_range() {
        assert_eq!(interpolate(0.2, 0.8, -3.0), 0.2);
        assert_eq!(interpolate(0.2, 0.8, 7.5), 0.8);
    }

    #[test]
    fn test_smooth_past_window_is_target() {
        let window = Duration::from_millis(3000);
        assert_eq!(smooth(0.1, 0.9, Duration::from_millis(3000), window), 0.9);
        assert_eq!(smooth(0.1, 0.9, Duration::from_millis(4500), window), 0.9);
        assert!((smooth(0.0, 0.9, Duration::from_millis(1000), window) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_smooth_zero_window() {
        assert_eq!(smooth(0.1, 0.9, Duration::ZERO, Duration::ZERO), 0.9);
    }
}
