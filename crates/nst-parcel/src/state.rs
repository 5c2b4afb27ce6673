//! Per-parcel state and the per-step Structure-of-Arrays slice.

use nst_core::{LinkId, ParcelId};

// ── ParcelState ───────────────────────────────────────────────────────────────

/// The mutable state of one parcel at one timestep.
///
/// A parcel is either **in network** (`link` is a real link, `position` is
/// `Some(p)` with `p` in `[0, 1]`) or **out of network** (`link` is
/// [`LinkId::OUT_OF_NETWORK`], `position` is `None`, never active).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParcelState {
    pub link:                LinkId,
    /// Normalized distance from the upstream end of `link`.
    pub position:            Option<f64>,
    pub volume_m3:           f64,
    pub diameter_m:          f64,
    /// `true` while the parcel is in its link's active (mobile) layer.
    pub active:              bool,
    /// Time the parcel entered `link`, in seconds since the seeded state.
    pub arrival_time_secs:   f64,
    /// Distance moved since the seeded state, in metres.
    pub distance_traveled_m: f64,
}

impl ParcelState {
    #[inline]
    pub fn is_out_of_network(&self) -> bool {
        self.link.is_out_of_network()
    }
}

// ── ParcelSlice ───────────────────────────────────────────────────────────────

/// The state of every parcel at one timestep, stored column-wise.
///
/// Every `Vec` has one element per parcel and is indexed by `ParcelId`.
/// `position` holds `0.0` for out-of-network parcels; read positions through
/// [`ParcelSlice::position`] or [`ParcelSlice::state`], which return `None`
/// for them.
#[derive(Debug, Clone, PartialEq)]
pub struct ParcelSlice {
    /// Physical time of this slice in seconds since the seeded state.
    pub time_secs:           f64,
    pub link:                Vec<LinkId>,
    pub position:            Vec<f64>,
    pub volume_m3:           Vec<f64>,
    pub diameter_m:          Vec<f64>,
    pub active:              Vec<bool>,
    pub arrival_time_secs:   Vec<f64>,
    pub distance_traveled_m: Vec<f64>,
}

impl ParcelSlice {
    /// An empty slice with room for `n` parcels.
    pub fn with_capacity(time_secs: f64, n: usize) -> Self {
        Self {
            time_secs,
            link:                Vec::with_capacity(n),
            position:            Vec::with_capacity(n),
            volume_m3:           Vec::with_capacity(n),
            diameter_m:          Vec::with_capacity(n),
            active:              Vec::with_capacity(n),
            arrival_time_secs:   Vec::with_capacity(n),
            distance_traveled_m: Vec::with_capacity(n),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.link.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.link.is_empty()
    }

    /// Iterator over all `ParcelId`s in ascending order.
    pub fn parcel_ids(&self) -> impl Iterator<Item = ParcelId> + '_ {
        (0..self.len() as u32).map(ParcelId)
    }

    #[inline]
    pub fn in_network(&self, parcel: ParcelId) -> bool {
        !self.link[parcel.index()].is_out_of_network()
    }

    #[inline]
    pub fn position(&self, parcel: ParcelId) -> Option<f64> {
        let i = parcel.index();
        (!self.link[i].is_out_of_network()).then_some(self.position[i])
    }

    /// Copy out one parcel's state.
    pub fn state(&self, parcel: ParcelId) -> ParcelState {
        let i = parcel.index();
        ParcelState {
            link:                self.link[i],
            position:            self.position(parcel),
            volume_m3:           self.volume_m3[i],
            diameter_m:          self.diameter_m[i],
            active:              self.active[i],
            arrival_time_secs:   self.arrival_time_secs[i],
            distance_traveled_m: self.distance_traveled_m[i],
        }
    }

    /// Append one parcel's state (used when building slice 0).
    pub fn push(&mut self, state: ParcelState) {
        self.link.push(state.link);
        self.position.push(0.0);
        self.volume_m3.push(0.0);
        self.diameter_m.push(0.0);
        self.active.push(false);
        self.arrival_time_secs.push(0.0);
        self.distance_traveled_m.push(0.0);
        let last = ParcelId(self.len() as u32 - 1);
        self.set(last, state);
    }

    /// Overwrite one parcel's state.  Out-of-network states are normalized:
    /// position `0.0` and inactive.
    pub fn set(&mut self, parcel: ParcelId, state: ParcelState) {
        let i = parcel.index();
        let out = state.link.is_out_of_network();
        self.link[i]                = state.link;
        self.position[i]            = if out { 0.0 } else { state.position.unwrap_or(0.0) };
        self.volume_m3[i]           = state.volume_m3;
        self.diameter_m[i]          = state.diameter_m;
        self.active[i]              = state.active && !out;
        self.arrival_time_secs[i]   = state.arrival_time_secs;
        self.distance_traveled_m[i] = state.distance_traveled_m;
    }

    /// A copy of this slice re-stamped at `time_secs`: every parcel carried
    /// forward unchanged.
    pub fn carried_forward(&self, time_secs: f64) -> Self {
        Self { time_secs, ..self.clone() }
    }

    /// Total volume of parcels still in the network.
    pub fn in_network_volume_m3(&self) -> f64 {
        self.link
            .iter()
            .zip(&self.volume_m3)
            .filter(|(l, _)| !l.is_out_of_network())
            .map(|(_, v)| v)
            .sum()
    }

    /// Total volume of parcels that have left through the outlet.
    pub fn exported_volume_m3(&self) -> f64 {
        self.link
            .iter()
            .zip(&self.volume_m3)
            .filter(|(l, _)| l.is_out_of_network())
            .map(|(_, v)| v)
            .sum()
    }
}
