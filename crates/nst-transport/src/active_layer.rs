//! Active-layer thickness and the active/inactive partition.
//!
//! On each link, parcels are ordered newest arrival first and stacked from
//! the bed surface down.  A parcel is active while the cumulative volume
//! stacked so far (itself included) fits in the active-layer capacity
//!
//! ```text
//! capacity = thickness × width × length × (1 − porosity)
//! ```
//!
//! and buried (inactive) below it.  A zero-length link has unlimited
//! capacity, so nothing is ever buried on it.  Running the partition before and after
//! movement gives burial of old parcels under new arrivals and exhumation
//! when overlying parcels leave.

use serde::{Deserialize, Serialize};

use nst_core::ParcelId;
use nst_parcel::ParcelSlice;

use crate::formula::{BedSurface, FlowConditions, SAND_UPPER_DIAMETER_M};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActiveLayerModel {
    /// Fixed thickness on every link.
    Constant { thickness_m: f64 },
    /// `multiplier × mean bed diameter`.
    GrainSizeDependent { multiplier: f64 },
    /// Wong et al. (2007): `0.515 D × 3.09 (τ* − 0.0549)^0.56`, never
    /// thinner than one mean grain diameter.
    WongParker,
}

impl Default for ActiveLayerModel {
    fn default() -> Self {
        ActiveLayerModel::Constant { thickness_m: 0.5 }
    }
}

impl ActiveLayerModel {
    pub fn thickness_m(&self, flow: &FlowConditions, bed: &BedSurface) -> f64 {
        match *self {
            ActiveLayerModel::Constant { thickness_m } => thickness_m,
            ActiveLayerModel::GrainSizeDependent { multiplier } => multiplier * bed.mean_diameter_m,
            ActiveLayerModel::WongParker => {
                let d = bed.mean_diameter_m;
                let excess = flow.shields(d, bed.mean_density) - 0.0549;
                if excess <= 0.0 {
                    d
                } else {
                    (0.515 * d * 3.09 * excess.powf(0.56)).max(d)
                }
            }
        }
    }
}

/// Volume-weighted composition of `parcels`.  `None` when they hold no
/// volume (empty link or fully abraded parcels).
pub fn bed_surface<'a>(
    parcels:   impl IntoIterator<Item = &'a ParcelId>,
    slice:     &ParcelSlice,
    densities: &[f64],
) -> Option<BedSurface> {
    let (mut vol, mut d, mut sand, mut rho) = (0.0, 0.0, 0.0, 0.0);
    for p in parcels {
        let i = p.index();
        let v = slice.volume_m3[i];
        vol += v;
        d += v * slice.diameter_m[i];
        rho += v * densities[i];
        if slice.diameter_m[i] < SAND_UPPER_DIAMETER_M {
            sand += v;
        }
    }
    (vol > 0.0).then(|| BedSurface {
        mean_diameter_m: d / vol,
        sand_fraction:   sand / vol,
        mean_density:    rho / vol,
    })
}

/// Sort `parcels` newest arrival first (ties by ascending id) and set their
/// `active` flags in `slice` against `capacity_m3`.
pub fn partition(parcels: &mut [ParcelId], slice: &mut ParcelSlice, capacity_m3: f64) {
    parcels.sort_by(|a, b| {
        let ta = slice.arrival_time_secs[a.index()];
        let tb = slice.arrival_time_secs[b.index()];
        tb.total_cmp(&ta).then(a.cmp(b))
    });
    let mut cumulative = 0.0;
    for p in parcels.iter() {
        let i = p.index();
        cumulative += slice.volume_m3[i];
        slice.active[i] = cumulative <= capacity_m3;
    }
}
