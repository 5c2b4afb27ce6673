//! Simulation time model.
//!
//! # Design
//!
//! Two clocks run side by side:
//!
//! - [`Timestep`]: the integer index of a ledger slice.  It advances by
//!   exactly one per committed step and is the key of the parcel time series.
//! - `elapsed_secs`: the physical time of that slice.  It advances by the
//!   step's duration `dt`, which may vary between steps and may be zero.
//!
//! Keeping the index separate from physical time lets a zero-duration step
//! still append a slice without breaking the strictly increasing time axis.

use std::fmt;

const SECS_PER_DAY: f64 = 86_400.0;
const SECS_PER_YEAR: f64 = 365.25 * SECS_PER_DAY;

// ── Timestep ──────────────────────────────────────────────────────────────────

/// Index of a ledger time slice.  Slice 0 is the seeded initial state.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestep(pub u64);

impl Timestep {
    pub const ZERO: Timestep = Timestep(0);

    /// The step immediately after `self`.
    #[inline]
    pub fn next(self) -> Timestep {
        Timestep(self.0 + 1)
    }

    /// The step before `self`, or `None` at step 0.
    #[inline]
    pub fn prev(self) -> Option<Timestep> {
        self.0.checked_sub(1).map(Timestep)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::ops::Add<u64> for Timestep {
    type Output = Timestep;
    #[inline]
    fn add(self, rhs: u64) -> Timestep {
        Timestep(self.0 + rhs)
    }
}

impl fmt::Display for Timestep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Tracks the current step index and the physical time it corresponds to.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Index of the most recently committed slice.
    pub current_step: Timestep,
    /// Physical time of `current_step`, in seconds since the seeded state.
    pub elapsed_secs: f64,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from an existing ledger position.
    pub fn at(step: Timestep, elapsed_secs: f64) -> Self {
        Self { current_step: step, elapsed_secs }
    }

    /// Advance by one step of `dt_secs` seconds.
    #[inline]
    pub fn advance(&mut self, dt_secs: f64) {
        self.current_step = self.current_step.next();
        self.elapsed_secs += dt_secs;
    }

    #[inline]
    pub fn elapsed_days(&self) -> f64 {
        self.elapsed_secs / SECS_PER_DAY
    }

    #[inline]
    pub fn elapsed_years(&self) -> f64 {
        self.elapsed_secs / SECS_PER_YEAR
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (day {:.2})", self.current_step, self.elapsed_days())
    }
}

// ── RunConfig ─────────────────────────────────────────────────────────────────

/// Stepping parameters for one simulation run.
///
/// Typically loaded from JSON by the application alongside the transporter
/// parameters and passed to the simulation builder.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RunConfig {
    /// Duration of every step, in seconds.  Default: one day.
    pub dt_secs: f64,

    /// Number of steps to run after the seeded slice.
    pub total_steps: u64,

    /// Master seed for the parcel seeder.  Same seed, same parcels.
    pub seed: u64,

    /// Emit a snapshot every N steps.  0 disables snapshots.
    pub output_interval_steps: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dt_secs:               SECS_PER_DAY,
            total_steps:           365,
            seed:                  0,
            output_interval_steps: 1,
        }
    }
}

impl RunConfig {
    /// The step at which the run ends (inclusive: the last slice appended).
    #[inline]
    pub fn end_step(&self) -> Timestep {
        Timestep(self.total_steps)
    }

    /// Physical duration of the whole run in seconds.
    #[inline]
    pub fn total_secs(&self) -> f64 {
        self.dt_secs * self.total_steps as f64
    }

    /// `true` when `step` falls on a snapshot boundary.
    #[inline]
    pub fn is_output_step(&self, step: Timestep) -> bool {
        self.output_interval_steps > 0 && step.0.is_multiple_of(self.output_interval_steps)
    }
}
