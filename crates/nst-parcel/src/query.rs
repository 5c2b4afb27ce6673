//! Read-side aggregation over ledger slices.
//!
//! Queries never mutate the ledger.  A query picks a slice, an attribute, a
//! grouping key and a reducer, optionally filters parcels, and returns a
//! `BTreeMap` from group key to reduced value.
//!
//! ```rust,ignore
//! use nst_parcel::{Attribute, Query, Reducer};
//!
//! // Total volume per link at the latest step.
//! let volume = Query::new(Attribute::Volume).run(&ledger)?;
//!
//! // Volume-weighted mean diameter of fine parcels at step 10.
//! let d50 = Query::new(Attribute::Diameter)
//!     .reducer(Reducer::VolumeWeightedMean)
//!     .at_step(Timestep(10))
//!     .filter(|p| p.state().diameter_m < 0.01)
//!     .run(&ledger)?;
//! ```
//!
//! Out-of-network parcels are skipped unless
//! [`include_out_of_network`](Query::include_out_of_network) is set.  They
//! then group under [`LinkId::OUT_OF_NETWORK`] when grouping by link.

use std::collections::BTreeMap;
use std::hash::Hash;

use nst_core::{LinkId, ParcelId, Timestep};

use crate::ledger::ParcelLedger;
use crate::state::{ParcelSlice, ParcelState};
use crate::LedgerResult;

#[cfg(feature = "fx-hash")]
type GroupMap<K, V> = rustc_hash::FxHashMap<K, V>;
#[cfg(not(feature = "fx-hash"))]
type GroupMap<K, V> = std::collections::HashMap<K, V>;

// ── Query vocabulary ──────────────────────────────────────────────────────────

/// Per-parcel quantity to reduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Volume,
    Diameter,
    /// Skipped for out-of-network parcels, which have no position.
    Position,
    DistanceTraveled,
    ArrivalTime,
    Density,
    AbrasionRate,
    /// `1.0` per parcel.
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reducer {
    #[default]
    Sum,
    Mean,
    Count,
    Min,
    Max,
    /// Mean weighted by each parcel's volume at the queried step.
    /// Groups with zero total volume reduce to `0.0`.
    VolumeWeightedMean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupBy {
    /// Link the parcel occupies at the queried step.
    #[default]
    Link,
    StartingLink,
}

// ── ParcelView ────────────────────────────────────────────────────────────────

/// One parcel at the queried step, as seen by filter and key closures.
#[derive(Clone, Copy)]
pub struct ParcelView<'a> {
    ledger: &'a ParcelLedger,
    slice:  &'a ParcelSlice,
    parcel: ParcelId,
}

impl<'a> ParcelView<'a> {
    pub fn id(&self) -> ParcelId {
        self.parcel
    }

    pub fn state(&self) -> ParcelState {
        self.slice.state(self.parcel)
    }

    pub fn link(&self) -> LinkId {
        self.slice.link[self.parcel.index()]
    }

    pub fn starting_link(&self) -> LinkId {
        self.ledger.starting_link(self.parcel)
    }

    pub fn density(&self) -> f64 {
        self.ledger.density(self.parcel)
    }

    pub fn abrasion_rate(&self) -> f64 {
        self.ledger.abrasion_rate(self.parcel)
    }

    /// This parcel's value of application component `T`.
    pub fn component<T: Default + Send + Sync + 'static>(&self) -> Option<&'a T> {
        self.ledger.component::<T>().map(|c| &c[self.parcel.index()])
    }

    fn value(&self, attribute: Attribute) -> Option<f64> {
        let i = self.parcel.index();
        match attribute {
            Attribute::Volume           => Some(self.slice.volume_m3[i]),
            Attribute::Diameter         => Some(self.slice.diameter_m[i]),
            Attribute::Position         => self.slice.position(self.parcel),
            Attribute::DistanceTraveled => Some(self.slice.distance_traveled_m[i]),
            Attribute::ArrivalTime      => Some(self.slice.arrival_time_secs[i]),
            Attribute::Density          => Some(self.density()),
            Attribute::AbrasionRate     => Some(self.abrasion_rate()),
            Attribute::Count            => Some(1.0),
        }
    }
}

// ── Accumulator ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct Acc {
    sum:      f64,
    weighted: f64,
    weight:   f64,
    count:    usize,
    min:      f64,
    max:      f64,
}

impl Acc {
    fn add(&mut self, value: f64, volume: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.sum += value;
        self.weighted += value * volume;
        self.weight += volume;
        self.count += 1;
    }

    fn reduce(&self, reducer: Reducer) -> f64 {
        match reducer {
            Reducer::Sum   => self.sum,
            Reducer::Mean  => self.sum / self.count as f64,
            Reducer::Count => self.count as f64,
            Reducer::Min   => self.min,
            Reducer::Max   => self.max,
            Reducer::VolumeWeightedMean => {
                if self.weight > 0.0 { self.weighted / self.weight } else { 0.0 }
            }
        }
    }
}

// ── Query ─────────────────────────────────────────────────────────────────────

type Filter<'f> = Box<dyn Fn(&ParcelView<'_>) -> bool + 'f>;

/// A reduction over one ledger slice.  Defaults: latest step, group by link,
/// sum, in-network parcels only, no filter.
pub struct Query<'f> {
    attribute:              Attribute,
    group_by:               GroupBy,
    reducer:                Reducer,
    step:                   Option<Timestep>,
    include_out_of_network: bool,
    filter:                 Option<Filter<'f>>,
}

impl<'f> Query<'f> {
    pub fn new(attribute: Attribute) -> Self {
        Self {
            attribute,
            group_by: GroupBy::default(),
            reducer: Reducer::default(),
            step: None,
            include_out_of_network: false,
            filter: None,
        }
    }

    pub fn group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = group_by;
        self
    }

    pub fn reducer(mut self, reducer: Reducer) -> Self {
        self.reducer = reducer;
        self
    }

    pub fn at_step(mut self, step: Timestep) -> Self {
        self.step = Some(step);
        self
    }

    pub fn include_out_of_network(mut self, include: bool) -> Self {
        self.include_out_of_network = include;
        self
    }

    /// Keep only parcels for which `f` returns `true`.
    pub fn filter(mut self, f: impl Fn(&ParcelView<'_>) -> bool + 'f) -> Self {
        self.filter = Some(Box::new(f));
        self
    }

    /// Run grouped by the configured [`GroupBy`].
    pub fn run(&self, ledger: &ParcelLedger) -> LedgerResult<BTreeMap<LinkId, f64>> {
        match self.group_by {
            GroupBy::Link         => self.run_by(ledger, |p| p.link()),
            GroupBy::StartingLink => self.run_by(ledger, |p| p.starting_link()),
        }
    }

    /// Run grouped by an arbitrary key, e.g. a component value.
    pub fn run_by<K, F>(&self, ledger: &ParcelLedger, key: F) -> LedgerResult<BTreeMap<K, f64>>
    where
        K: Ord + Hash + Eq,
        F: Fn(&ParcelView<'_>) -> K,
    {
        let step = self.step.unwrap_or_else(|| ledger.last_step());
        let slice = ledger.slice(step)?;

        let mut groups: GroupMap<K, Acc> = GroupMap::default();
        for parcel in slice.parcel_ids() {
            if !self.include_out_of_network && !slice.in_network(parcel) {
                continue;
            }
            let view = ParcelView { ledger, slice, parcel };
            if let Some(filter) = &self.filter {
                if !filter(&view) {
                    continue;
                }
            }
            let Some(value) = view.value(self.attribute) else { continue };
            groups
                .entry(key(&view))
                .or_default()
                .add(value, slice.volume_m3[parcel.index()]);
        }

        Ok(groups.into_iter().map(|(k, acc)| (k, acc.reduce(self.reducer))).collect())
    }
}

// ── Link summaries ────────────────────────────────────────────────────────────

/// Per-link state of the bed at one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinkSummary {
    pub link:             LinkId,
    pub parcel_count:     usize,
    pub active_count:     usize,
    pub total_volume_m3:  f64,
    pub active_volume_m3: f64,
    /// Volume-weighted; `0.0` on links with no sediment.
    pub mean_diameter_m:  f64,
}

/// One summary per network link (including empty links), in `LinkId` order.
pub fn link_summaries(ledger: &ParcelLedger, step: Timestep) -> LedgerResult<Vec<LinkSummary>> {
    let slice = ledger.slice(step)?;
    let mut out: Vec<LinkSummary> = (0..ledger.link_count() as u32)
        .map(|l| LinkSummary { link: LinkId(l), ..LinkSummary::default() })
        .collect();
    let mut d_weighted = vec![0.0; out.len()];

    for parcel in slice.parcel_ids() {
        let i = parcel.index();
        let link = slice.link[i];
        if link.is_out_of_network() {
            continue;
        }
        let s = &mut out[link.index()];
        let v = slice.volume_m3[i];
        s.parcel_count += 1;
        s.total_volume_m3 += v;
        if slice.active[i] {
            s.active_count += 1;
            s.active_volume_m3 += v;
        }
        d_weighted[link.index()] += slice.diameter_m[i] * v;
    }
    for (s, dw) in out.iter_mut().zip(d_weighted) {
        if s.total_volume_m3 > 0.0 {
            s.mean_diameter_m = dw / s.total_volume_m3;
        }
    }
    Ok(out)
}

pub fn in_network_volume(ledger: &ParcelLedger, step: Timestep) -> LedgerResult<f64> {
    Ok(ledger.slice(step)?.in_network_volume_m3())
}

pub fn exported_volume(ledger: &ParcelLedger, step: Timestep) -> LedgerResult<f64> {
    Ok(ledger.slice(step)?.exported_volume_m3())
}
