//! Deterministic per-link RNG used when seeding parcels.
//!
//! Each link gets its own `SmallRng` seeded by
//!
//!   seed = global_seed XOR (link_id * MIXING_CONSTANT)
//!
//! with the 64-bit fractional part of the golden ratio as the mixer.  Adding
//! links to the end of a network therefore never changes the parcels seeded
//! on existing links.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::LinkId;

const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-link deterministic RNG.
pub struct LinkRng(SmallRng);

impl LinkRng {
    pub fn new(global_seed: u64, link: LinkId) -> Self {
        let seed = global_seed ^ (link.0 as u64).wrapping_mul(MIXING_CONSTANT);
        LinkRng(SmallRng::seed_from_u64(seed))
    }

    /// Expose the inner `SmallRng` for `rand` distribution types.
    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.0
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }
}
