//! Plain data row types written by output backends.

use nst_core::{LinkId, ParcelId, Timestep};
use nst_parcel::{LinkSummary, ParcelSlice};
use nst_transport::StepReport;

/// One parcel's state in a snapshot slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParcelSnapshotRow {
    pub parcel_id:           u32,
    pub step:                u64,
    pub time_secs:           f64,
    /// `u32::MAX` once the parcel has left through the outlet.
    pub link_id:             u32,
    /// `None` for out-of-network parcels.
    pub position:            Option<f64>,
    pub volume_m3:           f64,
    pub diameter_m:          f64,
    pub active:              bool,
    pub arrival_time_secs:   f64,
    pub distance_traveled_m: f64,
}

impl ParcelSnapshotRow {
    /// One row per parcel of `slice`, in `ParcelId` order.
    pub fn from_slice(step: Timestep, slice: &ParcelSlice) -> Vec<Self> {
        slice
            .parcel_ids()
            .map(|p| {
                let s = slice.state(p);
                Self {
                    parcel_id:           p.0,
                    step:                step.0,
                    time_secs:           slice.time_secs,
                    link_id:             s.link.0,
                    position:            s.position,
                    volume_m3:           s.volume_m3,
                    diameter_m:          s.diameter_m,
                    active:              s.active,
                    arrival_time_secs:   s.arrival_time_secs,
                    distance_traveled_m: s.distance_traveled_m,
                }
            })
            .collect()
    }

    pub fn parcel(&self) -> ParcelId {
        ParcelId(self.parcel_id)
    }

    pub fn link(&self) -> LinkId {
        LinkId(self.link_id)
    }
}

/// Per-link totals at a snapshot step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkSummaryRow {
    pub step:             u64,
    pub link_id:          u32,
    pub parcel_count:     u64,
    pub active_count:     u64,
    pub total_volume_m3:  f64,
    pub active_volume_m3: f64,
    pub mean_diameter_m:  f64,
}

impl LinkSummaryRow {
    pub fn new(step: Timestep, summary: &LinkSummary) -> Self {
        Self {
            step:             step.0,
            link_id:          summary.link.0,
            parcel_count:     summary.parcel_count as u64,
            active_count:     summary.active_count as u64,
            total_volume_m3:  summary.total_volume_m3,
            active_volume_m3: summary.active_volume_m3,
            mean_diameter_m:  summary.mean_diameter_m,
        }
    }
}

/// What one committed step did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSummaryRow {
    pub step:                 u64,
    pub time_secs:            f64,
    pub moved_parcels:        u64,
    pub link_transitions:     u64,
    pub exported_parcels:     u64,
    pub exported_volume_m3:   f64,
    pub abrasion_volume_m3:   f64,
    pub in_network_volume_m3: f64,
    /// `0.0` unless the step's mass balance was out of tolerance.
    pub mass_balance_residual_m3: f64,
}

impl From<&StepReport> for StepSummaryRow {
    fn from(r: &StepReport) -> Self {
        Self {
            step:                 r.step.0,
            time_secs:            r.time_secs,
            moved_parcels:        r.moved_parcels as u64,
            link_transitions:     r.link_transitions as u64,
            exported_parcels:     r.exported_parcels as u64,
            exported_volume_m3:   r.exported_volume_m3,
            abrasion_volume_m3:   r.abrasion_volume_m3,
            in_network_volume_m3: r.in_network_volume_m3,
            mass_balance_residual_m3: r.mass_balance.map_or(0.0, |mb| mb.residual_m3),
        }
    }
}
