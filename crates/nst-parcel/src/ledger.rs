//! The append-only parcel time series.
//!
//! # Usage
//!
//! ```rust,ignore
//! use nst_parcel::{InitialParcel, ParcelLedgerBuilder};
//!
//! #[derive(Default)]
//! struct TracerTag(u16);
//!
//! let mut ledger = ParcelLedgerBuilder::new(vec![
//!         InitialParcel::new(LinkId(0), 0.25, 1.0, 0.02),
//!         InitialParcel::new(LinkId(1), 0.75, 1.0, 0.04).with_abrasion_rate(1e-5),
//!     ])
//!     .register_component::<TracerTag>()
//!     .build(&network)?;
//!
//! ledger.component_mut::<TracerTag>().unwrap()[1] = TracerTag(7);
//! ```

use std::collections::BTreeMap;

use nst_core::{DomainError, LinkId, ParcelId, Timestep};
use nst_network::RiverNetwork;

use crate::component::ComponentMap;
use crate::query::Query;
use crate::state::{ParcelSlice, ParcelState};
use crate::{LedgerError, LedgerResult, OrderingError};

pub const DEFAULT_DENSITY: f64 = 2650.0;

// ── InitialParcel ─────────────────────────────────────────────────────────────

/// One parcel's seeded state plus its static attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialParcel {
    pub link:              LinkId,
    pub position:          f64,
    pub volume_m3:         f64,
    pub diameter_m:        f64,
    /// Sediment density, kg/m³.
    pub density:           f64,
    /// Fractional volume loss per metre travelled.
    pub abrasion_rate:     f64,
    pub active:            bool,
    pub arrival_time_secs: f64,
}

impl InitialParcel {
    /// Quartz density, no abrasion, active, arrived at time zero.
    pub fn new(link: LinkId, position: f64, volume_m3: f64, diameter_m: f64) -> Self {
        Self {
            link,
            position,
            volume_m3,
            diameter_m,
            density: DEFAULT_DENSITY,
            abrasion_rate: 0.0,
            active: true,
            arrival_time_secs: 0.0,
        }
    }

    pub fn with_density(mut self, density: f64) -> Self {
        self.density = density;
        self
    }

    pub fn with_abrasion_rate(mut self, rate: f64) -> Self {
        self.abrasion_rate = rate;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn arrived_at(mut self, secs: f64) -> Self {
        self.arrival_time_secs = secs;
        self
    }

    fn validate(&self, parcel: ParcelId, network: &RiverNetwork) -> LedgerResult<()> {
        if !network.contains_link(self.link) {
            return Err(LedgerError::UnknownLink { parcel, link: self.link });
        }
        if !(self.volume_m3.is_finite() && self.volume_m3 >= 0.0) {
            return Err(DomainError::InvalidVolume { parcel, volume: self.volume_m3 }.into());
        }
        if !(self.diameter_m.is_finite() && self.diameter_m > 0.0) {
            return Err(DomainError::InvalidDiameter { parcel, diameter: self.diameter_m }.into());
        }
        if !(self.density.is_finite() && self.density > 0.0) {
            return Err(DomainError::InvalidDensity { parcel, density: self.density }.into());
        }
        if !(self.abrasion_rate.is_finite() && self.abrasion_rate >= 0.0) {
            return Err(DomainError::InvalidAbrasionRate { parcel, rate: self.abrasion_rate }.into());
        }
        if !(0.0..=1.0).contains(&self.position) {
            return Err(DomainError::PositionOutOfRange { parcel, position: self.position }.into());
        }
        Ok(())
    }

    fn state(&self) -> ParcelState {
        ParcelState {
            link:                self.link,
            position:            Some(self.position),
            volume_m3:           self.volume_m3,
            diameter_m:          self.diameter_m,
            active:              self.active,
            arrival_time_secs:   self.arrival_time_secs,
            distance_traveled_m: 0.0,
        }
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Fluent builder for a [`ParcelLedger`] with typed components.
pub struct ParcelLedgerBuilder {
    parcels:    Vec<InitialParcel>,
    components: ComponentMap,
}

impl ParcelLedgerBuilder {
    pub fn new(parcels: Vec<InitialParcel>) -> Self {
        Self { parcels, components: ComponentMap::new() }
    }

    /// Register an application attribute type.  Every parcel starts with
    /// `T::default()`.
    pub fn register_component<T: Default + Send + Sync + 'static>(mut self) -> Self {
        self.components.register::<T>(0);
        self
    }

    /// Validate every parcel against `network` and seed slice 0.
    pub fn build(mut self, network: &RiverNetwork) -> LedgerResult<ParcelLedger> {
        let n = self.parcels.len();
        let mut slice = ParcelSlice::with_capacity(0.0, n);
        let mut starting_link = Vec::with_capacity(n);
        let mut density = Vec::with_capacity(n);
        let mut abrasion_rate = Vec::with_capacity(n);

        for (i, p) in self.parcels.iter().enumerate() {
            p.validate(ParcelId(i as u32), network)?;
            slice.push(p.state());
            starting_link.push(p.link);
            density.push(p.density);
            abrasion_rate.push(p.abrasion_rate);
        }

        self.components.resize_all(n);

        Ok(ParcelLedger {
            starting_link,
            density,
            abrasion_rate,
            slices: vec![slice],
            components: self.components,
            link_count: network.link_count(),
        })
    }
}

// ── ParcelLedger ──────────────────────────────────────────────────────────────

/// Time series of parcel states, indexed by `(ParcelId, Timestep)`.
///
/// Slice `t` is stored at `slices[t]`; there is always at least slice 0.
pub struct ParcelLedger {
    starting_link: Vec<LinkId>,
    density:       Vec<f64>,
    abrasion_rate: Vec<f64>,
    slices:        Vec<ParcelSlice>,
    components:    ComponentMap,
    link_count:    usize,
}

impl ParcelLedger {
    /// Seed a ledger with no application components.
    pub fn create(network: &RiverNetwork, parcels: Vec<InitialParcel>) -> LedgerResult<Self> {
        ParcelLedgerBuilder::new(parcels).build(network)
    }

    // ── Shape ─────────────────────────────────────────────────────────────────

    pub fn parcel_count(&self) -> usize {
        self.starting_link.len()
    }

    /// Number of links in the network the ledger was seeded against.
    pub fn link_count(&self) -> usize {
        self.link_count
    }

    pub fn parcel_ids(&self) -> impl Iterator<Item = ParcelId> + '_ {
        (0..self.parcel_count() as u32).map(ParcelId)
    }

    pub fn last_step(&self) -> Timestep {
        Timestep(self.slices.len() as u64 - 1)
    }

    pub fn step_count(&self) -> usize {
        self.slices.len()
    }

    // ── Static attributes ─────────────────────────────────────────────────────

    #[inline]
    pub fn starting_link(&self, parcel: ParcelId) -> LinkId {
        self.starting_link[parcel.index()]
    }

    #[inline]
    pub fn density(&self, parcel: ParcelId) -> f64 {
        self.density[parcel.index()]
    }

    #[inline]
    pub fn abrasion_rate(&self, parcel: ParcelId) -> f64 {
        self.abrasion_rate[parcel.index()]
    }

    pub fn densities(&self) -> &[f64] {
        &self.density
    }

    pub fn abrasion_rates(&self) -> &[f64] {
        &self.abrasion_rate
    }

    pub fn component<T: Default + Send + Sync + 'static>(&self) -> Option<&[T]> {
        self.components.get::<T>()
    }

    pub fn component_mut<T: Default + Send + Sync + 'static>(&mut self) -> Option<&mut [T]> {
        self.components.get_mut::<T>()
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    pub fn current_slice(&self) -> &ParcelSlice {
        &self.slices[self.slices.len() - 1]
    }

    pub fn slice(&self, step: Timestep) -> LedgerResult<&ParcelSlice> {
        self.slices.get(step.index()).ok_or(LedgerError::StepNotFound(step))
    }

    /// Elapsed time of `step` in seconds.
    pub fn time_at(&self, step: Timestep) -> LedgerResult<f64> {
        Ok(self.slice(step)?.time_secs)
    }

    pub fn current_state(&self, parcel: ParcelId) -> LedgerResult<ParcelState> {
        self.check_parcel(parcel)?;
        Ok(self.current_slice().state(parcel))
    }

    pub fn state_at(&self, parcel: ParcelId, step: Timestep) -> LedgerResult<ParcelState> {
        self.check_parcel(parcel)?;
        Ok(self.slice(step)?.state(parcel))
    }

    /// Run `query` against this ledger, grouped by link.
    pub fn aggregate(&self, query: &Query<'_>) -> LedgerResult<BTreeMap<LinkId, f64>> {
        query.run(self)
    }

    // ── Append ────────────────────────────────────────────────────────────────

    /// Commit `slice` as timestep `step`.
    ///
    /// `step` must be exactly one past [`last_step`](Self::last_step) and
    /// `slice.time_secs` must not precede the current slice's time.  Every
    /// check runs before the push: on error the ledger is unchanged.
    pub fn append_timestep(&mut self, step: Timestep, slice: ParcelSlice) -> LedgerResult<()> {
        let last = self.last_step();
        if step <= last {
            return Err(OrderingError::StepNotIncreasing { last, got: step }.into());
        }
        if step != last.next() {
            return Err(OrderingError::StepGap { last, got: step }.into());
        }
        let last_secs = self.current_slice().time_secs;
        if !(slice.time_secs >= last_secs) {
            return Err(OrderingError::TimeWentBackwards {
                last_secs,
                got_secs: slice.time_secs,
            }
            .into());
        }
        self.validate_slice(&slice)?;
        self.slices.push(slice);
        Ok(())
    }

    fn check_parcel(&self, parcel: ParcelId) -> LedgerResult<()> {
        if parcel.index() < self.parcel_count() {
            Ok(())
        } else {
            Err(LedgerError::ParcelNotFound(parcel))
        }
    }

    fn validate_slice(&self, slice: &ParcelSlice) -> LedgerResult<()> {
        let expected = self.parcel_count();
        let lens = [
            slice.link.len(),
            slice.position.len(),
            slice.volume_m3.len(),
            slice.diameter_m.len(),
            slice.active.len(),
            slice.arrival_time_secs.len(),
            slice.distance_traveled_m.len(),
        ];
        if let Some(&got) = lens.iter().find(|&&len| len != expected) {
            return Err(LedgerError::CountMismatch { expected, got });
        }

        for (i, &link) in slice.link.iter().enumerate() {
            let parcel = ParcelId(i as u32);
            if !link.is_out_of_network() {
                if link.index() >= self.link_count {
                    return Err(LedgerError::UnknownLink { parcel, link });
                }
                let position = slice.position[i];
                if !(0.0..=1.0).contains(&position) {
                    return Err(DomainError::PositionOutOfRange { parcel, position }.into());
                }
            }
            let volume = slice.volume_m3[i];
            if !(volume.is_finite() && volume >= 0.0) {
                return Err(DomainError::InvalidVolume { parcel, volume }.into());
            }
            // Fully abraded parcels reach zero diameter.
            let diameter = slice.diameter_m[i];
            if !(diameter.is_finite() && diameter >= 0.0) {
                return Err(DomainError::InvalidDiameter { parcel, diameter }.into());
            }
        }
        Ok(())
    }
}
