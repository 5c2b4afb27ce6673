//! Initial sediment seeding.
//!
//! A [`ParcelSeeder`] splits a volume of bed sediment on each link into
//! parcels of a fixed nominal volume.  Grain diameters come from a discrete
//! [`GrainSizeDistribution`]; positions and arrival times are uniform random.
//! Every link draws from its own [`LinkRng`], so the parcels seeded on a link
//! depend only on `(seed, link)`.

use rand::distributions::{Distribution, WeightedIndex};

use nst_core::{DomainError, DomainResult, LinkId, LinkRng};
use nst_network::RiverNetwork;

use crate::ledger::{DEFAULT_DENSITY, InitialParcel};

// ── GrainSizeDistribution ─────────────────────────────────────────────────────

/// Discrete grain-size classes with relative volume fractions.
#[derive(Debug, Clone)]
pub struct GrainSizeDistribution {
    diameters_m: Vec<f64>,
    index:       WeightedIndex<f64>,
}

impl GrainSizeDistribution {
    /// `fractions` need not sum to one; they are normalized.
    pub fn new(diameters_m: Vec<f64>, fractions: &[f64]) -> DomainResult<Self> {
        if diameters_m.len() != fractions.len() {
            return Err(DomainError::InvalidParameter {
                name:   "fractions",
                value:  fractions.len() as f64,
                reason: "one fraction per diameter class is required",
            });
        }
        if let Some(&d) = diameters_m.iter().find(|d| !(d.is_finite() && **d > 0.0)) {
            return Err(DomainError::InvalidParameter {
                name:   "diameter_m",
                value:  d,
                reason: "grain diameters must be finite and positive",
            });
        }
        let index = WeightedIndex::new(fractions).map_err(|_| DomainError::InvalidParameter {
            name:   "fractions",
            value:  fractions.iter().sum(),
            reason: "fractions must be non-negative with a positive sum",
        })?;
        Ok(Self { diameters_m, index })
    }

    /// Single grain size.
    pub fn uniform(diameter_m: f64) -> DomainResult<Self> {
        Self::new(vec![diameter_m], &[1.0])
    }

    pub fn sample(&self, rng: &mut LinkRng) -> f64 {
        self.diameters_m[self.index.sample(rng.inner())]
    }

    pub fn diameters_m(&self) -> &[f64] {
        &self.diameters_m
    }
}

// ── ParcelSeeder ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ParcelSeeder {
    gsd:                 GrainSizeDistribution,
    parcel_volume_m3:    f64,
    density:             f64,
    abrasion_rate:       f64,
    arrival_spread_secs: f64,
    seed:                u64,
}

impl ParcelSeeder {
    pub fn new(gsd: GrainSizeDistribution, parcel_volume_m3: f64, seed: u64) -> DomainResult<Self> {
        if !(parcel_volume_m3.is_finite() && parcel_volume_m3 > 0.0) {
            return Err(DomainError::InvalidParameter {
                name:   "parcel_volume_m3",
                value:  parcel_volume_m3,
                reason: "must be finite and positive",
            });
        }
        Ok(Self {
            gsd,
            parcel_volume_m3,
            density: DEFAULT_DENSITY,
            abrasion_rate: 0.0,
            arrival_spread_secs: 0.0,
            seed,
        })
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn with_abrasion_rate(mut self, rate: f64) -> Self {
        self.abrasion_rate = rate;
        self
    }

    /// Draw arrival times uniformly from `[-spread, 0)` so seeded parcels
    /// have a random burial order.
    pub fn with_arrival_spread(mut self, secs: f64) -> Self {
        self.arrival_spread_secs = secs.max(0.0);
        self
    }

    /// Split `volume_m3` on `link` into parcels.  The last parcel takes the
    /// remainder, so the seeded volumes sum to `volume_m3` exactly.
    pub fn seed_link(&self, link: LinkId, volume_m3: f64) -> DomainResult<Vec<InitialParcel>> {
        if !(volume_m3.is_finite() && volume_m3 >= 0.0) {
            return Err(DomainError::InvalidParameter {
                name:   "volume_m3",
                value:  volume_m3,
                reason: "seeded volume must be finite and non-negative",
            });
        }
        let mut rng = LinkRng::new(self.seed, link);
        let n = (volume_m3 / self.parcel_volume_m3).ceil() as usize;
        let mut out = Vec::with_capacity(n);
        let mut remaining = volume_m3;
        for i in 0..n {
            let volume = if i + 1 == n { remaining.max(0.0) } else { self.parcel_volume_m3 };
            remaining -= volume;
            let diameter = self.gsd.sample(&mut rng);
            let position: f64 = rng.random();
            let arrival = -self.arrival_spread_secs * rng.random::<f64>();
            out.push(
                InitialParcel::new(link, position, volume, diameter)
                    .with_density(self.density)
                    .with_abrasion_rate(self.abrasion_rate)
                    .arrived_at(arrival),
            );
        }
        Ok(out)
    }

    /// Seed every link with a bed of `thickness_m` spread over its plan area
    /// (`thickness × width × length`).
    pub fn seed_network(&self, network: &RiverNetwork, thickness_m: f64) -> DomainResult<Vec<InitialParcel>> {
        let mut out = Vec::new();
        for link in network.link_ids() {
            let volume = thickness_m * network.width_m(link) * network.length_m(link);
            out.extend(self.seed_link(link, volume)?);
        }
        Ok(out)
    }
}
