#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pursuit system that steers the chaser toward the player.
//!
//! The system listens for [`Event::TimeAdvanced`], waits for the current
//! pursuit delay to elapse and then emits a single [`Command::StepChaser`]
//! toward the player's cell. The delay shrinks linearly as the session clock
//! runs, so the chaser speeds up the longer the player survives.

use std::time::Duration;

use escape_block_core::{CellLookup, Command, Event, GameState, GridVec, PursuitTunables};
use escape_block_system_pathfinding::PathFinder;
use tracing::{trace, warn};

/// Linear schedule mapping session time to the delay between pursuit ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PursuitCadence {
    min_delay: Duration,
    max_delay: Duration,
    ramp_up: Duration,
}

impl PursuitCadence {
    /// Creates a cadence that starts at `max_delay` and reaches `min_delay`
    /// once `ramp_up` has elapsed.
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, ramp_up: Duration) -> Self {
        Self {
            min_delay: min_delay.min(max_delay),
            max_delay,
            ramp_up,
        }
    }

    /// Cadence described by the pursuit tunables.
    #[must_use]
    pub fn from_tunables(tunables: &PursuitTunables) -> Self {
        Self::new(tunables.min_delay(), tunables.max_delay(), tunables.ramp_up())
    }

    /// Delay between pursuit ticks after `elapsed` of session time.
    #[must_use]
    pub fn delay_at(&self, elapsed: Duration) -> Duration {
        if self.ramp_up.is_zero() || elapsed >= self.ramp_up {
            return self.min_delay;
        }

        let progress = elapsed.as_secs_f64() / self.ramp_up.as_secs_f64();
        let span = self.max_delay - self.min_delay;
        self.max_delay
            .saturating_sub(span.mul_f64(progress))
            .clamp(self.min_delay, self.max_delay)
    }

    /// Shortest delay, reached at the end of the ramp.
    #[must_use]
    pub const fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Delay at the start of a session.
    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Session time after which the delay stays at its minimum.
    #[must_use]
    pub const fn ramp_up(&self) -> Duration {
        self.ramp_up
    }
}

impl Default for PursuitCadence {
    fn default() -> Self {
        Self::from_tunables(&PursuitTunables::default())
    }
}

/// Pure system that emits chaser steps on the pursuit cadence.
#[derive(Debug)]
pub struct Pursuit {
    cadence: PursuitCadence,
    path_finder: PathFinder,
    accumulator: Duration,
    elapsed: Duration,
}

impl Pursuit {
    /// Creates a pursuit system using the provided cadence and search.
    #[must_use]
    pub fn new(cadence: PursuitCadence, path_finder: PathFinder) -> Self {
        Self {
            cadence,
            path_finder,
            accumulator: Duration::ZERO,
            elapsed: Duration::ZERO,
        }
    }

    /// Consumes world events and emits at most one chaser step.
    ///
    /// `chaser` and `player` are the cells the world currently reports; the
    /// grid is only read.
    pub fn handle<G>(
        &mut self,
        events: &[Event],
        game_state: GameState,
        grid: &G,
        chaser: GridVec,
        player: GridVec,
        out: &mut Vec<Command>,
    ) where
        G: CellLookup + ?Sized,
    {
        for event in events {
            match event {
                Event::GameStarted { .. } => {
                    self.accumulator = Duration::ZERO;
                    self.elapsed = Duration::ZERO;
                }
                Event::TimeAdvanced { dt, elapsed } => {
                    self.accumulator = self.accumulator.saturating_add(*dt);
                    self.elapsed = *elapsed;
                }
                _ => {}
            }
        }

        if game_state != GameState::Active {
            self.accumulator = Duration::ZERO;
            return;
        }

        let delay = self.cadence.delay_at(self.elapsed);
        if self.accumulator < delay {
            return;
        }
        self.accumulator -= delay;

        let to = match self.path_finder.next_step(grid, chaser, player) {
            Some(step) => step,
            None => {
                warn!(?chaser, ?player, "pursuit_target_unreachable");
                chaser
            }
        };
        trace!(?chaser, ?to, delay_ms = delay.as_millis(), "pursuit_tick");
        out.push(Command::StepChaser { to });
    }
}

impl Default for Pursuit {
    fn default() -> Self {
        Self::new(PursuitCadence::default(), PathFinder::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cadence() -> PursuitCadence {
        PursuitCadence::new(
            Duration::from_millis(300),
            Duration::from_millis(1500),
            Duration::from_secs(30),
        )
    }

    fn assert_close(actual: Duration, expected: Duration) {
        let diff = actual.max(expected) - actual.min(expected);
        assert!(diff < Duration::from_micros(1), "{actual:?} != {expected:?}");
    }

    #[test]
    fn delay_starts_at_maximum() {
        assert_eq!(cadence().delay_at(Duration::ZERO), Duration::from_millis(1500));
    }

    #[test]
    fn delay_is_linear_during_ramp() {
        assert_close(
            cadence().delay_at(Duration::from_secs(15)),
            Duration::from_millis(900),
        );
        assert_close(
            cadence().delay_at(Duration::from_secs(10)),
            Duration::from_millis(1100),
        );
    }

    #[test]
    fn delay_settles_at_minimum_after_ramp() {
        assert_eq!(
            cadence().delay_at(Duration::from_secs(30)),
            Duration::from_millis(300)
        );
        assert_eq!(
            cadence().delay_at(Duration::from_secs(600)),
            Duration::from_millis(300)
        );
    }

    #[test]
    fn zero_ramp_uses_minimum_delay() {
        let cadence = PursuitCadence::new(
            Duration::from_millis(200),
            Duration::from_millis(800),
            Duration::ZERO,
        );
        assert_eq!(cadence.delay_at(Duration::ZERO), Duration::from_millis(200));
    }

    #[test]
    fn inverted_bounds_collapse_to_maximum() {
        let cadence = PursuitCadence::new(
            Duration::from_millis(900),
            Duration::from_millis(400),
            Duration::from_secs(1),
        );
        assert_eq!(cadence.min_delay(), Duration::from_millis(400));
    }
}
