//! Animation driver: advances the time cursor once per display refresh.
//!
//! Besides the steady advance, the cursor occasionally skips ahead ("time
//! jumps") and is now and then thrown to a random spot so the display never
//! settles into a visible loop. Per-side connection jumps are rolled here as
//! well, before the generator runs, so one frame sees one consistent decision.

use crate::error::Skip;
use crate::random::{between, chance};
use rand::Rng;
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct DriverTuning {
    /// Cursor units per millisecond of frame delta.
    pub(crate) time_rate: f64,
    pub(crate) time_jump_chance: f64,
    /// Share of time jumps that are large.
    pub(crate) large_jump_share: f64,
    pub(crate) large_jump_max: f64,
    pub(crate) small_jump_max: f64,
    pub(crate) reset_interval_min_ms: f64,
    pub(crate) reset_interval_max_ms: f64,
    pub(crate) reset_chance: f64,
    /// Resets land uniformly in `[0, reset_range)`.
    pub(crate) reset_range: f64,
    pub(crate) cycle_interval_ms: f64,
    /// Per-side chance that an interior connection point jumps this frame.
    pub(crate) connection_jump_chance: f64,
}

impl Default for DriverTuning {
    fn default() -> Self {
        Self {
            time_rate: 0.004,
            time_jump_chance: 0.08,
            large_jump_share: 0.2,
            large_jump_max: 10.0,
            small_jump_max: 2.0,
            reset_interval_min_ms: 5_000.0,
            reset_interval_max_ms: 15_000.0,
            reset_chance: 0.3,
            reset_range: 1_000.0,
            cycle_interval_ms: 5_000.0,
            connection_jump_chance: 0.15,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct AnimationState {
    pub(crate) time_cursor: f64,
    /// Host time (ms) at which the reset interval was last checked.
    pub(crate) last_reset_time: f64,
    pub(crate) next_reset_interval: f64,
    pub(crate) pending_jump_left: bool,
    pub(crate) pending_jump_right: bool,
    /// Host time accumulated from frame deltas.
    pub(crate) elapsed_ms: f64,
    /// Unconditional 5 s bookkeeping mark, independent from the reset roll.
    pub(crate) last_cycle_mark: f64,
    pub(crate) frames: u64,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            time_cursor: 0.0,
            last_reset_time: 0.0,
            next_reset_interval: 10_000.0,
            pending_jump_left: false,
            pending_jump_right: false,
            elapsed_ms: 0.0,
            last_cycle_mark: 0.0,
            frames: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Step {
    Advanced(f64),
    Jumped(f64),
}

/// What happened to the cursor during one `advance`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Tick {
    pub(crate) step: Step,
    pub(crate) reset_to: Option<f64>,
    pub(crate) cycle: bool,
}

impl AnimationState {
    pub(crate) fn new<R: Rng + ?Sized>(rng: &mut R, tuning: &DriverTuning) -> Self {
        Self {
            next_reset_interval: roll_interval(rng, tuning),
            ..Self::default()
        }
    }

    fn is_malformed(&self) -> Option<&'static str> {
        if !self.time_cursor.is_finite() || self.time_cursor < 0.0 {
            Some("time cursor")
        } else if !self.elapsed_ms.is_finite()
            || !self.last_reset_time.is_finite()
            || !self.last_cycle_mark.is_finite()
        {
            Some("reset bookkeeping")
        } else if !self.next_reset_interval.is_finite() || self.next_reset_interval <= 0.0 {
            Some("reset interval")
        } else {
            None
        }
    }

    /// Regenerates the state from defaults if it cannot be reused.
    pub(crate) fn sanitize(&mut self) -> Result<(), Skip> {
        match self.is_malformed() {
            Some(what) => {
                let frames = self.frames;
                *self = Self {
                    frames,
                    ..Self::default()
                };
                Err(Skip::MalformedState(what))
            }
            None => Ok(()),
        }
    }

    /// Advances the cursor by one frame of `delta_ms` host time.
    pub(crate) fn advance<R: Rng + ?Sized>(
        &mut self,
        delta_ms: f64,
        rng: &mut R,
        tuning: &DriverTuning,
    ) -> Tick {
        if let Err(skip) = self.sanitize() {
            tracing::debug!(%skip, "animation state regenerated");
        }
        let delta = if delta_ms.is_finite() { delta_ms.max(0.0) } else { 0.0 };
        self.elapsed_ms += delta;
        self.frames += 1;

        let step = if chance(rng, tuning.time_jump_chance) {
            let max = if chance(rng, tuning.large_jump_share) {
                tuning.large_jump_max
            } else {
                tuning.small_jump_max
            };
            let jump = between(rng, 0.0, max.max(0.0));
            self.time_cursor += jump;
            Step::Jumped(jump)
        } else {
            let d = delta * tuning.time_rate.max(0.0);
            self.time_cursor += d;
            Step::Advanced(d)
        };

        let mut reset_to = None;
        if self.elapsed_ms - self.last_reset_time > self.next_reset_interval {
            if chance(rng, tuning.reset_chance) {
                let t = between(rng, 0.0, tuning.reset_range.max(0.0));
                self.time_cursor = t;
                reset_to = Some(t);
            }
            self.last_reset_time = self.elapsed_ms;
            self.next_reset_interval = roll_interval(rng, tuning);
        }

        let cycle = self.elapsed_ms - self.last_cycle_mark > tuning.cycle_interval_ms;
        if cycle {
            self.last_cycle_mark = self.elapsed_ms;
        }

        self.pending_jump_left = chance(rng, tuning.connection_jump_chance);
        self.pending_jump_right = chance(rng, tuning.connection_jump_chance);

        Tick {
            step,
            reset_to,
            cycle,
        }
    }

    /// Throws the cursor to a random spot right away.
    pub(crate) fn force_reset<R: Rng + ?Sized>(&mut self, rng: &mut R, tuning: &DriverTuning) -> f64 {
        self.time_cursor = between(rng, 0.0, tuning.reset_range.max(0.0));
        self.last_reset_time = self.elapsed_ms;
        self.next_reset_interval = roll_interval(rng, tuning);
        self.time_cursor
    }
}

fn roll_interval<R: Rng + ?Sized>(rng: &mut R, tuning: &DriverTuning) -> f64 {
    let lo = tuning.reset_interval_min_ms.max(1.0);
    let hi = tuning.reset_interval_max_ms.max(lo);
    between(rng, lo, hi)
}
