// Manual mode animation: random target speeds, one phase at a time
//
// Every phase the previous targets become the new start speeds and two new
// targets are drawn. During the transition window the speed is interpolated
// from start to target; after it the target is held until the next phase.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::smoothing::smooth;
use crate::config::{IDLE_THRESHOLD, KICK_MIN};
use crate::messages::SpeedPair;

/// Source of random target speeds
pub trait SpeedSource {
    /// Uniform value in [0.0, 1.0]
    fn unit(&mut self) -> f32;
    /// Fair coin flip
    fn coin(&mut self) -> bool;
}

/// `SpeedSource` backed by a `rand` generator
pub struct RngSource<R: Rng>(pub R);

impl RngSource<StdRng> {
    pub fn from_os_rng() -> Self {
        Self(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SpeedSource for RngSource<R> {
    fn unit(&mut self) -> f32 {
        self.0.random_range(0.0..=1.0)
    }

    fn coin(&mut self) -> bool {
        self.0.random_bool(0.5)
    }
}

/// Deterministic source replaying fixed sequences (cycling when exhausted)
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    units: VecDeque<f32>,
    coins: VecDeque<bool>,
}

impl ScriptedSource {
    pub fn new(units: &[f32], coins: &[bool]) -> Self {
        Self {
            units: units.iter().copied().collect(),
            coins: coins.iter().copied().collect(),
        }
    }
}

impl SpeedSource for ScriptedSource {
    fn unit(&mut self) -> f32 {
        match self.units.pop_front() {
            Some(value) => {
                self.units.push_back(value);
                value
            }
            None => 0.0,
        }
    }

    fn coin(&mut self) -> bool {
        match self.coins.pop_front() {
            Some(value) => {
                self.coins.push_back(value);
                value
            }
            None => false,
        }
    }
}

/// Draw two targets, never both idle
///
/// If both land at or below the idle threshold, one of them (picked by coin
/// flip) is moved into [KICK_MIN, 1.0].
pub fn draw_targets<S: SpeedSource + ?Sized>(source: &mut S) -> SpeedPair {
    let mut left = source.unit().clamp(0.0, 1.0);
    let mut right = source.unit().clamp(0.0, 1.0);

    if left <= IDLE_THRESHOLD && right <= IDLE_THRESHOLD {
        let kick_left = source.coin();
        let kick = KICK_MIN + source.unit().clamp(0.0, 1.0) * (1.0 - KICK_MIN);
        if kick_left {
            left = kick;
        } else {
            right = kick;
        }
    }

    SpeedPair::new(left, right)
}

/// Start/target speeds of the current phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionState {
    pub start: SpeedPair,
    pub target: SpeedPair,
    pub phase_start: Instant,
}

pub struct PhaseScheduler {
    state: TransitionState,
    phase_duration: Duration,
    transition_time: Duration,
}

impl PhaseScheduler {
    /// Start the first phase at `now`, ramping up from standstill
    pub fn new<S: SpeedSource + ?Sized>(
        now: Instant,
        phase_duration: Duration,
        transition_time: Duration,
        source: &mut S,
    ) -> Self {
        let target = draw_targets(source);
        info!(
            "First targets: left={:.2}, right={:.2}",
            target.left, target.right
        );
        Self {
            state: TransitionState {
                start: SpeedPair::STOP,
                target,
                phase_start: now,
            },
            phase_duration,
            transition_time: transition_time.min(phase_duration),
        }
    }

    /// Speeds for `now`, starting a new phase if the current one is over
    pub fn tick<S: SpeedSource + ?Sized>(&mut self, now: Instant, source: &mut S) -> SpeedPair {
        if now.saturating_duration_since(self.state.phase_start) >= self.phase_duration {
            self.state.start = self.state.target;
            self.state.target = draw_targets(source);
            self.state.phase_start = now;
            info!(
                "New targets: left={:.2}, right={:.2}",
                self.state.target.left, self.state.target.right
            );
        }

        let elapsed = now.saturating_duration_since(self.state.phase_start);
        let TransitionState { start, target, .. } = self.state;

        if elapsed <= self.transition_time {
            SpeedPair::new(
                smooth(start.left, target.left, elapsed, self.transition_time),
                smooth(start.right, target.right, elapsed, self.transition_time),
            )
        } else {
            target
        }
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHASE: Duration = Duration::from_millis(3000);

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_never_both_idle_random() {
        let mut source = RngSource::seeded(7);
        for _ in 0..20_000 {
            let t = draw_targets(&mut source);
            assert!(
                t.left > IDLE_THRESHOLD || t.right > IDLE_THRESHOLD,
                "both idle: {:?}",
                t
            );
            assert!((0.0..=1.0).contains(&t.left) && (0.0..=1.0).contains(&t.right));
        }
    }

    #[test]
    fn test_kick_picks_side_by_coin() {
        // both idle, coin -> left, kick unit 0.5 -> 0.3 + 0.35
        let mut source = ScriptedSource::new(&[0.05, 0.02, 0.5], &[true]);
        let t = draw_targets(&mut source);
        assert!((t.left - 0.65).abs() < 1e-6);
        assert_eq!(t.right, 0.02);

        let mut source = ScriptedSource::new(&[0.1, 0.0, 1.0], &[false]);
        let t = draw_targets(&mut source);
        assert_eq!(t.left, 0.1);
        assert!((t.right - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_kick_when_one_moving() {
        let mut source = ScriptedSource::new(&[0.0, 0.11], &[true]);
        let t = draw_targets(&mut source);
        assert_eq!(t, SpeedPair::new(0.0, 0.11));
    }

    #[test]
    fn test_first_phase_ramps_from_stop() {
        let t0 = Instant::now();
        let mut source = ScriptedSource::new(&[0.6, 0.9], &[]);
        let mut scheduler = PhaseScheduler::new(t0, PHASE, PHASE, &mut source);

        assert_eq!(scheduler.tick(t0, &mut source), SpeedPair::STOP);

        let half = scheduler.tick(t0 + ms(1500), &mut source);
        assert!((half.left - 0.3).abs() < 1e-5);
        assert!((half.right - 0.45).abs() < 1e-5);

        let late = scheduler.tick(t0 + ms(2950), &mut source);
        assert!(late.left < 0.6 && late.left > 0.58);
    }

    #[test]
    fn test_phase_boundary_continuity() {
        let t0 = Instant::now();
        let mut source = ScriptedSource::new(&[0.6, 0.9, 0.2, 0.4], &[]);
        let mut scheduler = PhaseScheduler::new(t0, PHASE, PHASE, &mut source);
        let previous_target = scheduler.state().target;

        let at_boundary = scheduler.tick(t0 + PHASE, &mut source);
        let state = *scheduler.state();

        assert_eq!(state.start, previous_target);
        assert_eq!(state.target, SpeedPair::new(0.2, 0.4));
        assert_eq!(state.phase_start, t0 + PHASE);
        // no jump: the first tick of a phase outputs the old target
        assert_eq!(at_boundary, previous_target);
    }

    #[test]
    fn test_late_tick_starts_phase_at_tick_time() {
        let t0 = Instant::now();
        let mut source = ScriptedSource::new(&[0.6, 0.9, 0.2, 0.4], &[]);
        let mut scheduler = PhaseScheduler::new(t0, PHASE, PHASE, &mut source);

        scheduler.tick(t0 + ms(3120), &mut source);
        assert_eq!(scheduler.state().phase_start, t0 + ms(3120));

        // a tick from before the phase start does not move the clock back
        scheduler.tick(t0 + ms(100), &mut source);
        assert_eq!(scheduler.state().phase_start, t0 + ms(3120));
    }

    #[test]
    fn test_hold_after_short_transition() {
        let t0 = Instant::now();
        let mut source = ScriptedSource::new(&[0.6, 0.9], &[]);
        let mut scheduler = PhaseScheduler::new(t0, ms(7000), ms(3000), &mut source);

        let mid = scheduler.tick(t0 + ms(1500), &mut source);
        assert!((mid.left - 0.3).abs() < 1e-5);

        assert_eq!(scheduler.tick(t0 + ms(3000), &mut source), SpeedPair::new(0.6, 0.9));
        assert_eq!(scheduler.tick(t0 + ms(5000), &mut source), SpeedPair::new(0.6, 0.9));
        assert_eq!(scheduler.tick(t0 + ms(6999), &mut source), SpeedPair::new(0.6, 0.9));
    }

    #[test]
    fn test_speeds_stay_in_range_over_many_phases() {
        let t0 = Instant::now();
        let mut source = RngSource::seeded(42);
        let mut scheduler = PhaseScheduler::new(t0, PHASE, PHASE, &mut source);
        let mut previous = SpeedPair::STOP;

        for tick in 1..2_000u64 {
            let speeds = scheduler.tick(t0 + ms(tick * 50), &mut source);
            assert!((0.0..=1.0).contains(&speeds.left));
            assert!((0.0..=1.0).contains(&speeds.right));
            // 50 ms out of 3000 ms can move a speed at most 1/60
            assert!((speeds.left - previous.left).abs() <= 1.0 / 60.0 + 1e-4);
            assert!((speeds.right - previous.right).abs() <= 1.0 / 60.0 + 1e-4);
            previous = speeds;
        }
    }
}
