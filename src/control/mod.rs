// Control core: mode state machine, manual animation and automatic mapping
//
// Pure with respect to time and randomness: callers pass `now` in and the
// random source is injected, so everything here runs without sleeping.

pub mod automatic;
pub mod mode;
pub mod scheduler;
pub mod smoothing;
pub mod steering;

use std::time::{Duration, Instant};

use crate::config::RuntimeConfig;
use crate::messages::{ControlMessage, ControlMode, SpeedPair};

pub use mode::{ModeState, ModeSwitch};
pub use scheduler::{PhaseScheduler, RngSource, ScriptedSource, SpeedSource, TransitionState};

/// Everything the control loop owns between ticks
pub struct Controller<S: SpeedSource> {
    mode: ModeState,
    scheduler: PhaseScheduler,
    source: S,
    tick_interval: Duration,
}

impl<S: SpeedSource> Controller<S> {
    pub fn new(config: &RuntimeConfig, now: Instant, mut source: S) -> Self {
        let scheduler = PhaseScheduler::new(
            now,
            config.phase_duration(),
            config.transition_time(),
            &mut source,
        );
        Self {
            mode: ModeState::new(),
            scheduler,
            source,
            tick_interval: config.tick_interval(),
        }
    }

    /// Apply a parsed control message
    pub fn handle(&mut self, msg: &ControlMessage) -> Option<ModeSwitch> {
        self.mode.apply(msg)
    }

    /// Speeds for this tick from the active mode only, clamped to [0, 1]
    pub fn step(&mut self, now: Instant) -> SpeedPair {
        let speeds = match self.mode.mode() {
            ControlMode::Manual => self.scheduler.tick(now, &mut self.source),
            ControlMode::Automatic => automatic::speeds(self.mode.remote_angles()),
        };
        speeds.clamped()
    }

    pub fn mode(&self) -> ControlMode {
        self.mode.mode()
    }

    pub fn mode_state(&self) -> &ModeState {
        &self.mode
    }

    pub fn transition(&self) -> &TransitionState {
        self.scheduler.state()
    }

    /// How long the driver should wait before the next tick
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn controller(t0: Instant) -> Controller<ScriptedSource> {
        Controller::new(
            &RuntimeConfig::default(),
            t0,
            ScriptedSource::new(&[0.6, 0.9, 0.2, 0.4], &[]),
        )
    }

    #[test]
    fn test_manual_runs_scheduler() {
        let t0 = Instant::now();
        let mut c = controller(t0);
        assert_eq!(c.mode(), ControlMode::Manual);
        let s = c.step(t0 + ms(1500));
        assert!((s.left - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_automatic_does_not_touch_scheduler() {
        let t0 = Instant::now();
        let mut c = controller(t0);
        c.handle(&ControlMessage {
            left_arm_angle: Some(180.0),
            right_arm_angle: Some(90.0),
            mode_switch: None,
        });

        let before = *c.transition();
        // well past several phase boundaries
        assert_eq!(c.step(t0 + ms(10_000)), SpeedPair::new(1.0, 0.5));
        assert_eq!(*c.transition(), before);
    }

    #[test]
    fn test_back_to_manual_resumes_animation() {
        let t0 = Instant::now();
        let mut c = controller(t0);
        c.handle(&ControlMessage {
            left_arm_angle: Some(0.0),
            right_arm_angle: Some(0.0),
            mode_switch: None,
        });
        c.step(t0 + ms(500));
        c.handle(&ControlMessage {
            mode_switch: Some("manual".into()),
            ..Default::default()
        });

        let s = c.step(t0 + ms(10_000));
        // overdue phase rolls over at the resume tick: start = old target
        assert_eq!(s, SpeedPair::new(0.6, 0.9));
        assert_eq!(c.transition().phase_start, t0 + ms(10_000));
    }
}
